pub mod audio_queue;
pub mod detection;
pub mod errors;
pub mod gate;
pub mod sampler;
pub mod stream;
