pub mod dto;
pub mod narration;
pub mod ports;
pub mod services;
pub mod stats;
