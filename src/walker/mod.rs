pub mod resources;

pub use resources::{ResourceFile, ResourceWalker};
