pub mod archive;
pub mod copier;
pub mod orchestrator;

pub use copier::{ChangeAwareCopier, CopyAction};
pub use orchestrator::{ExportOrchestrator, ExportReport, ExportRequest, IndexEntry};
