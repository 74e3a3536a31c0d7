pub mod audio;
pub mod frames;
pub mod http;
pub mod overlay;
pub mod pipeline;
pub mod remote;
#[cfg(feature = "camera-v4l2")]
pub mod v4l2;
