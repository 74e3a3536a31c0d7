use crate::domain::errors::{DomainError, DomainResult};

pub const DEFAULT_SAMPLE_INTERVAL: u32 = 3;

/// Diezmado determinista del flujo de frames: se queda con uno de cada `interval`.
#[derive(Debug, Clone)]
pub struct FrameSampler {
    frame_count: u64,
    sample_interval: u32,
}

impl FrameSampler {
    pub fn new(sample_interval: u32) -> DomainResult<Self> {
        if sample_interval == 0 {
            return Err(DomainError::InvalidInput("sample_interval must be > 0".into()));
        }
        Ok(Self { frame_count: 0, sample_interval })
    }

    /// Cuenta el frame entrante y decide si se envía a inferencia.
    /// Solo importa `frame_count % interval`, así que el desbordamiento es inocuo.
    pub fn should_sample(&mut self) -> bool {
        self.frame_count = self.frame_count.wrapping_add(1);
        self.frame_count % u64::from(self.sample_interval) == 0
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn sample_interval(&self) -> u32 {
        self.sample_interval
    }
}

impl Default for FrameSampler {
    fn default() -> Self {
        Self { frame_count: 0, sample_interval: DEFAULT_SAMPLE_INTERVAL }
    }
}
