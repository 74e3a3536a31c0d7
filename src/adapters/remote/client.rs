use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use std::time::Duration;
use tracing::debug;

use crate::application::dto::{parse_detect_body, OcrResponse};
use crate::application::ports::{DescribePort, InferencePort, OcrPort, OcrResult};
use crate::domain::{
    detection::DetectionResult,
    errors::{DomainError, DomainResult},
};

const DETECT_PATH: &str = "detect";
const OCR_PATH: &str = "api/ocr-tts";
// La descripción hablada se sirve en la raíz y tarda más que la detección.
const DESCRIBE_PATH: &str = "";
const DESCRIBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Cliente HTTP del servidor de inferencia (detección y OCR+TTS).
/// No reintenta: un fallo se devuelve tal cual y el siguiente frame vuelve a probar.
#[derive(Clone)]
pub struct RemoteInferenceClient {
    client: reqwest::Client,
    base: Url,
    timeout: Duration,
}

impl RemoteInferenceClient {
    pub fn new(server_url: &str, timeout: Duration) -> DomainResult<Self> {
        let mut base = Url::parse(server_url.trim())
            .map_err(|e| DomainError::InvalidInput(format!("server url '{server_url}': {e}")))?;
        // Sin barra final, `join` sustituiría el último segmento de la ruta.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::OperationFailed(format!("http client: {e}")))?;

        Ok(Self { client, base, timeout })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Las URLs relativas de audio se resuelven contra el servidor; las
    /// absolutas (o lo que no se pueda resolver) se dejan tal cual.
    pub fn resolve_audio_url(&self, audio_url: &str) -> String {
        if Url::parse(audio_url).is_ok() {
            return audio_url.to_string();
        }
        self.base
            .join(audio_url)
            .map(String::from)
            .unwrap_or_else(|_| audio_url.to_string())
    }

    async fn post_image(
        &self,
        path: &str,
        field: &str,
        file_name: &str,
        jpeg: Vec<u8>,
        timeout: Option<Duration>,
    ) -> DomainResult<Vec<u8>> {
        let url = self.base
            .join(path)
            .map_err(|e| DomainError::InvalidInput(e.to_string()))?;

        let part = Part::bytes(jpeg)
            .file_name(file_name.to_string())
            .mime_str("image/jpeg")
            .map_err(|e| DomainError::OperationFailed(e.to_string()))?;
        let form = Form::new().part(field.to_string(), part);

        debug!(%url, "uploading image");
        let mut req = self.client.post(url).multipart(form);
        if let Some(timeout) = timeout {
            req = req.timeout(timeout);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| DomainError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DomainError::Server { status: status.as_u16() });
        }

        let body = resp.bytes().await.map_err(|e| DomainError::Transport(e.to_string()))?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl InferencePort for RemoteInferenceClient {
    async fn detect(&self, jpeg: Vec<u8>) -> DomainResult<DetectionResult> {
        let body = self.post_image(DETECT_PATH, "file", "frame.jpg", jpeg, None).await?;
        let mut result = parse_detect_body(&body)?;
        result.audio_url = result.audio_url.map(|u| self.resolve_audio_url(&u));
        Ok(result)
    }
}

#[async_trait]
impl OcrPort for RemoteInferenceClient {
    async fn recognize(&self, jpeg: Vec<u8>) -> DomainResult<OcrResult> {
        let body = self.post_image(OCR_PATH, "image", "image.jpg", jpeg, None).await?;
        let resp: OcrResponse = serde_json::from_slice(&body)
            .map_err(|e| DomainError::Parse(e.to_string()))?;
        let text = resp
            .best_text()
            .ok_or_else(|| DomainError::Parse("response has no text".into()))?
            .to_string();
        Ok(OcrResult { text, audio_url: self.resolve_audio_url(&resp.audio_url) })
    }
}

#[async_trait]
impl DescribePort for RemoteInferenceClient {
    async fn describe(&self, jpeg: Vec<u8>) -> DomainResult<Vec<u8>> {
        let timeout = DESCRIBE_TIMEOUT.max(self.timeout);
        let audio = self.post_image(DESCRIBE_PATH, "file", "image.jpg", jpeg, Some(timeout)).await?;
        if audio.is_empty() {
            return Err(DomainError::Parse("empty audio response".into()));
        }
        Ok(audio)
    }
}
