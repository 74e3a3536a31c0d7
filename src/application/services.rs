use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::{
    application::{
        narration::NarrationService,
        ports::{AudioPlayerPort, DescribePort, Frame, InferencePort, OcrPort, OcrResult, OverlayPort},
        stats::{SessionStats, StatsSnapshot},
    },
    domain::{
        detection::DetectionResult,
        errors::{DomainError, DomainResult},
        gate::{GateState, SingleFlightGate},
        sampler::FrameSampler,
        stream::summarize_detections,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDisposition {
    /// La sesión ya se paró.
    Inactive,
    /// El muestreador no se quedó con el frame.
    Skipped,
    /// Había una petición en vuelo; el frame se descarta.
    Busy,
    Submitted,
}

/// Vista compartible de una sesión: saber si sigue viva y pararla.
#[derive(Clone)]
pub struct SessionHandle {
    active: Arc<AtomicBool>,
    narration: NarrationService,
    stats: Arc<SessionStats>,
}

impl SessionHandle {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Deja de admitir frames y desmonta la narración. Una petición en
    /// vuelo termina, pero su resultado se descarta.
    pub async fn stop(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            info!("Sesión de detección detenida");
        }
        self.narration.shutdown().await;
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

/// Bucle de detección en vivo: muestreo, puerta de un solo vuelo y
/// reparto del resultado al overlay y a la narración.
///
/// `on_frame` se llama siempre desde el mismo hilo de captura; la inferencia
/// corre como tarea de tokio para no bloquear la cámara.
pub struct DetectionSession {
    sampler: FrameSampler,
    gate: SingleFlightGate,
    inference: Arc<dyn InferencePort>,
    overlay: Arc<dyn OverlayPort>,
    handle: SessionHandle,
    runtime: tokio::runtime::Handle,
}

impl DetectionSession {
    pub fn new(
        sampler: FrameSampler,
        inference: Arc<dyn InferencePort>,
        overlay: Arc<dyn OverlayPort>,
        narration: NarrationService,
        stats: Arc<SessionStats>,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        info!("Sesión de detección: 1 de cada {} frames", sampler.sample_interval());
        Self {
            sampler,
            gate: SingleFlightGate::new(),
            inference,
            overlay,
            handle: SessionHandle {
                active: Arc::new(AtomicBool::new(true)),
                narration,
                stats,
            },
            runtime,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn gate_state(&self) -> GateState {
        self.gate.state()
    }

    pub fn on_frame(&mut self, frame: Frame) -> FrameDisposition {
        if !self.handle.is_active() {
            return FrameDisposition::Inactive;
        }
        let stats = self.handle.stats.clone();
        SessionStats::incr(&stats.frames_seen);

        if !self.sampler.should_sample() {
            return FrameDisposition::Skipped;
        }
        SessionStats::incr(&stats.frames_sampled);

        let Some(permit) = self.gate.try_admit() else {
            SessionStats::incr(&stats.frames_dropped_busy);
            return FrameDisposition::Busy;
        };
        SessionStats::incr(&stats.frames_submitted);

        let inference = self.inference.clone();
        let overlay = self.overlay.clone();
        let session = self.handle.clone();
        self.runtime.spawn(async move {
            let started = Instant::now();
            let outcome = inference.detect(frame.jpeg.clone()).await;
            // El permiso se suelta en todos los caminos: aquí o al cancelar la tarea.
            permit.release();
            let infer_ms = started.elapsed().as_secs_f32() * 1000.0;

            match outcome {
                Ok(result) => deliver(&session, overlay.as_ref(), &frame, result, infer_ms),
                Err(e) => {
                    SessionStats::incr(&session.stats.inference_errors);
                    warn!("Inferencia fallida: {}", e);
                }
            }
        });
        FrameDisposition::Submitted
    }
}

fn deliver(
    session: &SessionHandle,
    overlay: &dyn OverlayPort,
    frame: &Frame,
    result: DetectionResult,
    infer_ms: f32,
) {
    if !session.is_active() {
        SessionStats::incr(&session.stats.results_discarded);
        debug!("session stopped, discarding late result");
        return;
    }

    overlay.render(frame, &result.objects, result.audio_url.as_deref(), infer_ms);
    SessionStats::incr(&session.stats.results_rendered);
    if !result.is_empty() {
        info!("🔍 {} ({:.0} ms)", summarize_detections(&result.objects), infer_ms);
    }

    if let Some(audio_url) = result.audio_url {
        session.narration.enqueue(audio_url);
    }
}

/// Flujos de una sola imagen: detección puntual, descripción hablada y
/// lectura de texto (OCR).
#[derive(Clone)]
pub struct SnapshotService {
    inference: Arc<dyn InferencePort>,
    describer: Arc<dyn DescribePort>,
    ocr: Arc<dyn OcrPort>,
    player: Arc<dyn AudioPlayerPort>,
}

impl SnapshotService {
    pub fn new(
        inference: Arc<dyn InferencePort>,
        describer: Arc<dyn DescribePort>,
        ocr: Arc<dyn OcrPort>,
        player: Arc<dyn AudioPlayerPort>,
    ) -> Self {
        Self { inference, describer, ocr, player }
    }

    /// Detecta una vez y reproduce la narración hasta el final.
    /// Un fallo de audio no invalida la detección.
    pub async fn detect_once(&self, jpeg: Vec<u8>) -> DomainResult<DetectionResult> {
        let result = self.inference.detect(jpeg).await?;
        if let Some(audio_url) = result.audio_url.as_deref() {
            self.play_quietly(audio_url).await;
        }
        Ok(result)
    }

    /// Pide la descripción hablada, la guarda en un fichero temporal y la
    /// reproduce. El fichero se borra al terminar, haya ido bien o no.
    /// Devuelve el tamaño del audio recibido.
    pub async fn describe(&self, jpeg: Vec<u8>) -> DomainResult<usize> {
        let audio = self.describer.describe(jpeg).await?;

        let mut file = tempfile::Builder::new()
            .prefix("audio")
            .suffix(".mp3")
            .tempfile()
            .map_err(|e| DomainError::Transport(format!("creating audio file: {e}")))?;
        file.write_all(&audio)
            .and_then(|_| file.flush())
            .map_err(|e| DomainError::Transport(format!("writing audio file: {e}")))?;

        let path = file.path().to_string_lossy().into_owned();
        debug!(%path, bytes = audio.len(), "playing scene description");
        self.player.play(&path).await?;
        Ok(audio.len())
    }

    pub async fn read_text(&self, jpeg: Vec<u8>) -> DomainResult<OcrResult> {
        let result = self.ocr.recognize(jpeg).await?;
        self.play_quietly(&result.audio_url).await;
        Ok(result)
    }

    async fn play_quietly(&self, audio_ref: &str) {
        if let Err(e) = self.player.play(audio_ref).await {
            warn!("⚠️ Error playing audio: {}", e);
        }
    }
}
