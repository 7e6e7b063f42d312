pub mod snapshot;

pub use snapshot::{FetchResult, PageTask, SnapshotFetcher};
