use serde::{Deserialize, Serialize};

/// Rectángulo en píxeles de la imagen de origen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoundingBox {
    pub fn width(&self) -> f32 {
        (self.right - self.left).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.bottom - self.top).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub label: String,
    pub confidence: f32, // 0..1
    pub bounding_box: BoundingBox,
}

impl DetectedObject {
    /// Texto que el overlay dibuja sobre la esquina superior izquierda de la caja.
    pub fn caption(&self) -> String {
        format!("{} ({:.2})", self.label, self.confidence)
    }
}

/// Resultado de una llamada de inferencia: objetos en orden del servidor
/// y, opcionalmente, el clip de narración que los describe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub objects: Vec<DetectedObject>,
    pub audio_url: Option<String>,
}

impl DetectionResult {
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
