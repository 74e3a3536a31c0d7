pub mod capture;

pub use capture::{CaptureConfig, V4l2FrameSource};
