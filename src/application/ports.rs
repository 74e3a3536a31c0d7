use async_trait::async_trait;
use crate::domain::{
    detection::{DetectedObject, DetectionResult},
    errors::DomainResult,
};

/// Un frame ya codificado como JPEG, listo para subir.
#[derive(Debug, Clone)]
pub struct Frame {
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Texto reconocido por el servidor junto con su lectura en voz alta.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrResult {
    pub text: String,
    pub audio_url: String,
}

#[async_trait]
pub trait InferencePort: Send + Sync {
    async fn detect(&self, jpeg: Vec<u8>) -> DomainResult<DetectionResult>;
}

#[async_trait]
pub trait OcrPort: Send + Sync {
    async fn recognize(&self, jpeg: Vec<u8>) -> DomainResult<OcrResult>;
}

/// Descripción hablada de una imagen: el servidor responde directamente con el audio.
#[async_trait]
pub trait DescribePort: Send + Sync {
    async fn describe(&self, jpeg: Vec<u8>) -> DomainResult<Vec<u8>>;
}

#[async_trait]
pub trait AudioPlayerPort: Send + Sync {
    /// Reproduce la referencia hasta el final. Cancelar el futuro
    /// libera el recurso de reproducción.
    async fn play(&self, audio_ref: &str) -> DomainResult<()>;
}

pub trait OverlayPort: Send + Sync {
    fn render(&self, frame: &Frame, objects: &[DetectedObject], audio_url: Option<&str>, infer_ms: f32);
}

/// Fuente de frames bloqueante; vive en el hilo de captura.
pub trait FrameSource: Send {
    /// `Ok(None)` indica que la fuente se agotó.
    fn next_frame(&mut self) -> anyhow::Result<Option<Frame>>;
}
