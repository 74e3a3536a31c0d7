use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use super::detection::DetectedObject;

/// Lo que el overlay necesita para dibujar un resultado.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayFrame {
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    pub infer_ms: f32,
    pub objects: Vec<DetectedObject>,
    pub audio_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsOverlayMessage {
    pub r#type: String,
    pub frame: OverlayFrame,
}

/// Resumen legible ("2 person, 1 dog"), ordenado por etiqueta.
pub fn summarize_detections(objects: &[DetectedObject]) -> String {
    let mut counts = BTreeMap::new();
    for obj in objects {
        *counts.entry(obj.label.as_str()).or_insert(0usize) += 1;
    }
    counts.iter()
        .map(|(label, count)| format!("{} {}", count, label))
        .collect::<Vec<_>>()
        .join(", ")
}
