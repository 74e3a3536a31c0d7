pub mod directory;

pub use directory::{load_frame, DirectoryFrameSource};
