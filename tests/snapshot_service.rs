use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};

use vision_assistant::application::{
    ports::{AudioPlayerPort, DescribePort, InferencePort, OcrPort, OcrResult},
    services::SnapshotService,
};
use vision_assistant::domain::{
    detection::{BoundingBox, DetectedObject, DetectionResult},
    errors::{DomainError, DomainResult},
};

/// Servidor falso: respuestas fijas para los tres flujos.
struct FixedServer {
    audio: Vec<u8>,
}

#[async_trait]
impl InferencePort for FixedServer {
    async fn detect(&self, _jpeg: Vec<u8>) -> DomainResult<DetectionResult> {
        Ok(DetectionResult {
            objects: vec![DetectedObject {
                label: "chair".into(),
                confidence: 0.66,
                bounding_box: BoundingBox { left: 0.0, top: 0.0, right: 10.0, bottom: 10.0 },
            }],
            audio_url: Some("http://server/audio/chair.mp3".into()),
        })
    }
}

#[async_trait]
impl DescribePort for FixedServer {
    async fn describe(&self, _jpeg: Vec<u8>) -> DomainResult<Vec<u8>> {
        Ok(self.audio.clone())
    }
}

#[async_trait]
impl OcrPort for FixedServer {
    async fn recognize(&self, _jpeg: Vec<u8>) -> DomainResult<OcrResult> {
        Ok(OcrResult { text: "EXIT".into(), audio_url: "http://server/audio/exit.mp3".into() })
    }
}

/// Guarda lo que se le pide reproducir; para ficheros locales, también su contenido.
#[derive(Default)]
struct RecordingPlayer {
    played: Mutex<Vec<String>>,
    contents: Mutex<Vec<Vec<u8>>>,
    fail: bool,
}

#[async_trait]
impl AudioPlayerPort for RecordingPlayer {
    async fn play(&self, audio_ref: &str) -> DomainResult<()> {
        self.played.lock().unwrap().push(audio_ref.to_string());
        if let Ok(bytes) = std::fs::read(audio_ref) {
            self.contents.lock().unwrap().push(bytes);
        }
        if self.fail {
            return Err(DomainError::Playback("no audio device".into()));
        }
        Ok(())
    }
}

fn service(player: Arc<RecordingPlayer>) -> SnapshotService {
    let server = Arc::new(FixedServer { audio: b"ID3 fake mp3".to_vec() });
    SnapshotService::new(server.clone(), server.clone(), server, player)
}

#[tokio::test]
async fn detect_once_plays_narration_and_returns_objects() {
    let player = Arc::new(RecordingPlayer::default());
    let result = service(player.clone()).detect_once(vec![1]).await.unwrap();

    assert_eq!(result.objects[0].label, "chair");
    assert_eq!(*player.played.lock().unwrap(), vec!["http://server/audio/chair.mp3"]);
}

#[tokio::test]
async fn playback_failure_does_not_fail_detection_or_ocr() {
    let player = Arc::new(RecordingPlayer { fail: true, ..Default::default() });
    let svc = service(player.clone());

    let detection = svc.detect_once(vec![1]).await.unwrap();
    assert_eq!(detection.objects.len(), 1);

    let ocr = svc.read_text(vec![1]).await.unwrap();
    assert_eq!(ocr.text, "EXIT");
    assert_eq!(
        *player.played.lock().unwrap(),
        vec!["http://server/audio/chair.mp3", "http://server/audio/exit.mp3"]
    );
}

#[tokio::test]
async fn describe_plays_audio_from_a_temp_file_then_removes_it() {
    let player = Arc::new(RecordingPlayer::default());
    let bytes = service(player.clone()).describe(vec![1]).await.unwrap();

    assert_eq!(bytes, 12);
    let played = player.played.lock().unwrap().clone();
    assert_eq!(played.len(), 1);
    assert!(played[0].ends_with(".mp3"), "{}", played[0]);
    assert_eq!(*player.contents.lock().unwrap(), vec![b"ID3 fake mp3".to_vec()]);
    assert!(!Path::new(&played[0]).exists());
}

#[tokio::test]
async fn describe_reports_playback_failure_and_still_removes_file() {
    let player = Arc::new(RecordingPlayer { fail: true, ..Default::default() });
    let err = service(player.clone()).describe(vec![1]).await.unwrap_err();

    assert!(matches!(err, DomainError::Playback(_)), "{err:?}");
    let played = player.played.lock().unwrap().clone();
    assert!(!Path::new(&played[0]).exists());
}
