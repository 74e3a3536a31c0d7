use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::application::ports::AudioPlayerPort;
use crate::application::stats::SessionStats;
use crate::domain::{
    audio_queue::{AudioQueue, EnqueueOutcome},
    errors::{DomainError, DomainResult},
};

enum NarrationCommand {
    Enqueue(String),
    Shutdown(oneshot::Sender<()>),
}

/// Cola de narración servida por un único actor.
///
/// Los productores (tareas de inferencia) solo envían mensajes; el actor es
/// el único dueño de la [`AudioQueue`] y de la reproducción activa, así que
/// nunca hay más de un clip sonando.
#[derive(Clone)]
pub struct NarrationService {
    tx: mpsc::UnboundedSender<NarrationCommand>,
}

impl NarrationService {
    pub fn spawn(
        player: Arc<dyn AudioPlayerPort>,
        cooldown: Duration,
        stats: Arc<SessionStats>,
        handle: &tokio::runtime::Handle,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let queue = AudioQueue::new(cooldown);
        debug!(cooldown_ms = queue.cooldown().as_millis() as u64, "narration actor started");
        let actor = NarrationActor { queue, player, active: None, rx, stats };
        handle.spawn(actor.run());
        Self { tx }
    }

    /// No bloquea; se puede llamar desde cualquier hilo.
    pub fn enqueue(&self, audio_ref: impl Into<String>) {
        if self.tx.send(NarrationCommand::Enqueue(audio_ref.into())).is_err() {
            debug!("narration already stopped, dropping clip");
        }
    }

    /// Vacía la cola y libera la reproducción activa. Es idempotente.
    pub async fn shutdown(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(NarrationCommand::Shutdown(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }
}

struct NarrationActor {
    queue: AudioQueue,
    player: Arc<dyn AudioPlayerPort>,
    active: Option<JoinHandle<DomainResult<()>>>,
    rx: mpsc::UnboundedReceiver<NarrationCommand>,
    stats: Arc<SessionStats>,
}

impl NarrationActor {
    async fn run(mut self) {
        loop {
            tokio::select! {
                cmd = self.rx.recv() => match cmd {
                    Some(NarrationCommand::Enqueue(audio_ref)) => self.handle_enqueue(&audio_ref),
                    Some(NarrationCommand::Shutdown(ack)) => {
                        self.teardown().await;
                        let _ = ack.send(());
                        break;
                    }
                    // Todos los handles se soltaron: mismo desmontaje.
                    None => {
                        self.teardown().await;
                        break;
                    }
                },
                outcome = wait_active(&mut self.active) => {
                    self.active = None;
                    self.handle_finished(outcome);
                }
            }
        }
        debug!("narration actor stopped");
    }

    fn handle_enqueue(&mut self, audio_ref: &str) {
        match self.queue.enqueue(audio_ref, now()) {
            EnqueueOutcome::Started(next) => self.start(next),
            EnqueueOutcome::Queued { position } => {
                debug!(%audio_ref, position, "narration queued");
            }
            EnqueueOutcome::Rejected(reason) => {
                SessionStats::incr(&self.stats.narration_rejected);
                debug!(%audio_ref, ?reason, "narration dropped");
            }
        }
    }

    fn handle_finished(&mut self, outcome: DomainResult<()>) {
        if let Err(e) = outcome {
            // Un error cuenta como fin: no se reintenta y la cola sigue.
            SessionStats::incr(&self.stats.playback_errors);
            warn!("⚠️ Playback failed: {}", e);
        }
        if let Some(next) = self.queue.on_playback_end(now()) {
            self.start(next);
        }
    }

    fn start(&mut self, audio_ref: String) {
        SessionStats::incr(&self.stats.narration_started);
        info!("🎙️ Narrating: {}", audio_ref);
        let player = self.player.clone();
        self.active = Some(tokio::spawn(async move { player.play(&audio_ref).await }));
    }

    async fn teardown(&mut self) {
        let current = self.queue.teardown();
        if let Some(handle) = self.active.take() {
            handle.abort();
            // Esperar garantiza que el recurso ya se soltó al confirmar el apagado.
            let _ = handle.await;
            info!("Narration stopped, released {}", current.unwrap_or_default());
        }
    }
}

async fn wait_active(active: &mut Option<JoinHandle<DomainResult<()>>>) -> DomainResult<()> {
    match active {
        Some(handle) => match handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(DomainError::Playback(format!("playback task failed: {e}"))),
        },
        None => std::future::pending().await,
    }
}

// Reloj de tokio para que los tests con tiempo pausado controlen el cooldown.
fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}
