use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

use vision_assistant::application::{
    narration::NarrationService,
    ports::{AudioPlayerPort, Frame, InferencePort, OverlayPort},
    services::{DetectionSession, FrameDisposition},
    stats::SessionStats,
};
use vision_assistant::domain::{
    detection::{BoundingBox, DetectedObject, DetectionResult},
    errors::{DomainError, DomainResult},
    gate::GateState,
    sampler::FrameSampler,
};

/// Inferencia que no responde hasta que el test lo permite.
struct HeldInference {
    proceed: Semaphore,
    responses: Mutex<VecDeque<DomainResult<DetectionResult>>>,
    calls: Mutex<usize>,
}

impl HeldInference {
    fn new() -> Self {
        Self {
            proceed: Semaphore::new(0),
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl InferencePort for HeldInference {
    async fn detect(&self, _jpeg: Vec<u8>) -> DomainResult<DetectionResult> {
        *self.calls.lock().unwrap() += 1;
        self.proceed
            .acquire()
            .await
            .map_err(|e| DomainError::OperationFailed(e.to_string()))?
            .forget();
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(DetectionResult::default()))
    }
}

#[derive(Default)]
struct RecordingOverlay {
    rendered: Mutex<Vec<Vec<DetectedObject>>>,
}

impl OverlayPort for RecordingOverlay {
    fn render(&self, _frame: &Frame, objects: &[DetectedObject], _audio: Option<&str>, _ms: f32) {
        self.rendered.lock().unwrap().push(objects.to_vec());
    }
}

#[derive(Default)]
struct RecordingPlayer {
    played: Mutex<Vec<String>>,
}

#[async_trait]
impl AudioPlayerPort for RecordingPlayer {
    async fn play(&self, audio_ref: &str) -> DomainResult<()> {
        self.played.lock().unwrap().push(audio_ref.to_string());
        Ok(())
    }
}

struct Harness {
    session: DetectionSession,
    inference: Arc<HeldInference>,
    overlay: Arc<RecordingOverlay>,
    player: Arc<RecordingPlayer>,
    stats: Arc<SessionStats>,
}

fn harness(interval: u32) -> Harness {
    let inference = Arc::new(HeldInference::new());
    let overlay = Arc::new(RecordingOverlay::default());
    let player = Arc::new(RecordingPlayer::default());
    let stats = Arc::new(SessionStats::default());
    let runtime = tokio::runtime::Handle::current();
    let narration = NarrationService::spawn(player.clone(), Duration::ZERO, stats.clone(), &runtime);
    let session = DetectionSession::new(
        FrameSampler::new(interval).unwrap(),
        inference.clone(),
        overlay.clone(),
        narration,
        stats.clone(),
        runtime,
    );
    Harness { session, inference, overlay, player, stats }
}

fn frame() -> Frame {
    Frame { jpeg: vec![0xFF, 0xD8, 0xFF, 0xD9], width: 640, height: 480 }
}

fn person() -> DetectedObject {
    DetectedObject {
        label: "person".into(),
        confidence: 0.91,
        bounding_box: BoundingBox { left: 10.0, top: 20.0, right: 200.0, bottom: 400.0 },
    }
}

async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..400 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn sampled_frames_are_dropped_while_a_request_is_in_flight() {
    let mut h = harness(3);
    let dispositions: Vec<_> = (0..9).map(|_| h.session.on_frame(frame())).collect();

    use FrameDisposition::*;
    assert_eq!(
        dispositions,
        vec![Skipped, Skipped, Submitted, Skipped, Skipped, Busy, Skipped, Skipped, Busy]
    );
    assert_eq!(h.session.gate_state(), GateState::InFlight);

    h.inference.responses.lock().unwrap().push_back(Ok(DetectionResult {
        objects: vec![person()],
        audio_url: Some("http://server/audio/1.mp3".into()),
    }));
    h.inference.proceed.add_permits(1);
    let stats = h.stats.clone();
    wait_until(|| stats.snapshot().results_rendered == 1).await;
    assert_eq!(h.session.gate_state(), GateState::Idle);

    // Tras liberar, el siguiente frame muestreado entra.
    assert_eq!(h.session.on_frame(frame()), Skipped);
    assert_eq!(h.session.on_frame(frame()), Skipped);
    assert_eq!(h.session.on_frame(frame()), Submitted);

    let snap = h.stats.snapshot();
    assert_eq!(snap.frames_seen, 12);
    assert_eq!(snap.frames_sampled, 4);
    assert_eq!(snap.frames_submitted, 2);
    assert_eq!(snap.frames_dropped_busy, 2);
    assert_eq!(*h.overlay.rendered.lock().unwrap(), vec![vec![person()]]);

    // La segunda petición corre cuando el test cede el hilo.
    let inference = h.inference.clone();
    wait_until(|| *inference.calls.lock().unwrap() == 2).await;
    assert_eq!(h.session.gate_state(), GateState::InFlight);

    let player = h.player.clone();
    wait_until(|| player.played.lock().unwrap().len() == 1).await;
    assert_eq!(*h.player.played.lock().unwrap(), vec!["http://server/audio/1.mp3"]);

    h.inference.proceed.add_permits(1);
    h.session.handle().stop().await;
}

#[tokio::test]
async fn failed_inference_releases_the_gate_and_is_counted() {
    let mut h = harness(1);
    h.inference
        .responses
        .lock()
        .unwrap()
        .push_back(Err(DomainError::Server { status: 503 }));

    assert_eq!(h.session.on_frame(frame()), FrameDisposition::Submitted);
    h.inference.proceed.add_permits(1);
    let stats = h.stats.clone();
    wait_until(|| stats.snapshot().inference_errors == 1).await;

    assert_eq!(h.session.gate_state(), GateState::Idle);
    assert!(h.overlay.rendered.lock().unwrap().is_empty());
    assert_eq!(h.session.on_frame(frame()), FrameDisposition::Submitted);

    h.inference.proceed.add_permits(1);
    h.session.handle().stop().await;
}

#[tokio::test]
async fn result_arriving_after_stop_is_discarded() {
    let mut h = harness(1);
    h.inference.responses.lock().unwrap().push_back(Ok(DetectionResult {
        objects: vec![person()],
        audio_url: Some("late.mp3".into()),
    }));

    assert_eq!(h.session.on_frame(frame()), FrameDisposition::Submitted);
    let handle = h.session.handle();
    handle.stop().await;
    assert!(!handle.is_active());
    assert_eq!(h.session.on_frame(frame()), FrameDisposition::Inactive);

    h.inference.proceed.add_permits(1);
    let stats = h.stats.clone();
    wait_until(|| stats.snapshot().results_discarded == 1).await;

    assert!(h.overlay.rendered.lock().unwrap().is_empty());
    assert!(h.player.played.lock().unwrap().is_empty());
    assert_eq!(h.session.gate_state(), GateState::Idle);
}

#[tokio::test]
async fn empty_results_still_reach_the_overlay() {
    let mut h = harness(1);
    assert_eq!(h.session.on_frame(frame()), FrameDisposition::Submitted);
    h.inference.proceed.add_permits(1);
    let stats = h.stats.clone();
    wait_until(|| stats.snapshot().results_rendered == 1).await;

    assert_eq!(*h.overlay.rendered.lock().unwrap(), vec![Vec::<DetectedObject>::new()]);
    assert_eq!(h.stats.snapshot().narration_started, 0);
    h.session.handle().stop().await;
}
