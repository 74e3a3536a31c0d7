use serde::{Deserialize, Serialize};

use crate::domain::{
    detection::{BoundingBox, DetectedObject, DetectionResult},
    errors::{DomainError, DomainResult},
};

/// Formato de caja en el cable: `{left, top, right, bottom}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxDto {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectDto {
    pub label: String,
    pub confidence: f32,
    #[serde(rename = "box")]
    pub bbox: BoxDto,
}

/// Respuesta de `POST /detect`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectResponse {
    pub objects: Vec<ObjectDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

/// Respuesta de `POST /api/ocr-tts`.
#[derive(Debug, Clone, Deserialize)]
pub struct OcrResponse {
    #[serde(default)]
    pub cleaned_text: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    pub audio_url: String,
}

impl OcrResponse {
    /// Se prefiere el texto limpio cuando el servidor lo envía.
    pub fn best_text(&self) -> Option<&str> {
        self.cleaned_text.as_deref().or(self.text.as_deref())
    }
}

impl TryFrom<ObjectDto> for DetectedObject {
    type Error = DomainError;

    fn try_from(dto: ObjectDto) -> DomainResult<Self> {
        if !dto.confidence.is_finite() {
            return Err(DomainError::Parse(format!("confidence of '{}' is not a number", dto.label)));
        }
        Ok(DetectedObject {
            label: dto.label,
            confidence: dto.confidence.clamp(0.0, 1.0),
            bounding_box: BoundingBox {
                left: dto.bbox.left,
                top: dto.bbox.top,
                right: dto.bbox.right,
                bottom: dto.bbox.bottom,
            },
        })
    }
}

impl From<&DetectedObject> for ObjectDto {
    fn from(obj: &DetectedObject) -> Self {
        let b = obj.bounding_box;
        ObjectDto {
            label: obj.label.clone(),
            confidence: obj.confidence,
            bbox: BoxDto { left: b.left, top: b.top, right: b.right, bottom: b.bottom },
        }
    }
}

impl TryFrom<DetectResponse> for DetectionResult {
    type Error = DomainError;

    fn try_from(r: DetectResponse) -> DomainResult<Self> {
        let objects = r.objects
            .into_iter()
            .map(DetectedObject::try_from)
            .collect::<DomainResult<Vec<_>>>()?;
        let audio_url = r.audio_url.filter(|u| !u.trim().is_empty());
        Ok(DetectionResult { objects, audio_url })
    }
}

/// Decodifica el cuerpo de `/detect`; cualquier fallo es `Parse`.
pub fn parse_detect_body(body: &[u8]) -> DomainResult<DetectionResult> {
    let resp: DetectResponse = serde_json::from_slice(body)
        .map_err(|e| DomainError::Parse(e.to_string()))?;
    resp.try_into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn detect_payload_round_trips_objects_in_order() {
        let payload = json!({
            "objects": [
                { "label": "person", "confidence": 0.9, "box": { "left": 10.0, "top": 20.0, "right": 110.0, "bottom": 220.0 } },
                { "label": "chair", "confidence": 0.25, "box": { "left": 0.0, "top": 5.5, "right": 40.0, "bottom": 60.0 } },
                { "label": "person", "confidence": 0.5, "box": { "left": 300.0, "top": 30.0, "right": 320.0, "bottom": 90.0 } }
            ],
            "audio_url": "/static/audio/abc.mp3"
        });

        let result = parse_detect_body(payload.to_string().as_bytes()).unwrap();
        assert_eq!(result.audio_url.as_deref(), Some("/static/audio/abc.mp3"));
        let labels: Vec<_> = result.objects.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, ["person", "chair", "person"]);

        let back: Vec<ObjectDto> = result.objects.iter().map(ObjectDto::from).collect();
        let back = serde_json::to_value(back).unwrap();
        let original = payload["objects"].clone();
        let (Value::Array(a), Value::Array(b)) = (original, back) else { panic!("arrays") };
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x["label"], y["label"]);
            for key in ["left", "top", "right", "bottom"] {
                let (p, q) = (x["box"][key].as_f64().unwrap(), y["box"][key].as_f64().unwrap());
                assert!((p - q).abs() < 1e-4, "{key}: {p} vs {q}");
            }
            let (p, q) = (x["confidence"].as_f64().unwrap(), y["confidence"].as_f64().unwrap());
            assert!((p - q).abs() < 1e-6);
        }
    }

    #[test]
    fn audio_url_is_optional() {
        let result = parse_detect_body(br#"{"objects": []}"#).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.audio_url, None);

        let blank = parse_detect_body(br#"{"objects": [], "audio_url": "  "}"#).unwrap();
        assert_eq!(blank.audio_url, None);
    }

    #[test]
    fn malformed_bodies_are_parse_errors() {
        let bodies: [&[u8]; 3] = [
            b"not json",
            br#"{"audio_url": "x"}"#,
            br#"{"objects": [{"label": "a"}]}"#,
        ];
        for body in bodies {
            assert!(matches!(parse_detect_body(body), Err(DomainError::Parse(_))));
        }
    }

    #[test]
    fn confidence_is_clamped_to_unit_range() {
        let body = br#"{"objects": [{"label": "a", "confidence": 1.2, "box": {"left": 0, "top": 0, "right": 1, "bottom": 1}}]}"#;
        let result = parse_detect_body(body).unwrap();
        assert_eq!(result.objects[0].confidence, 1.0);
    }

    #[test]
    fn ocr_prefers_cleaned_text() {
        let r: OcrResponse = serde_json::from_str(
            r#"{"text": "raw", "cleaned_text": "clean", "audio_url": "/a.mp3"}"#,
        ).unwrap();
        assert_eq!(r.best_text(), Some("clean"));

        let r: OcrResponse = serde_json::from_str(r#"{"text": "raw", "audio_url": "/a.mp3"}"#).unwrap();
        assert_eq!(r.best_text(), Some("raw"));
    }
}
