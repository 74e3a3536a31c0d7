use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing { current: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    EmptyReference,
    Cooldown { remaining: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Rejected(RejectReason),
    /// Aceptado detrás del clip activo; `position` es la posición en espera (1 = siguiente).
    Queued { position: usize },
    /// La cola estaba parada: el llamador debe empezar a reproducir esta referencia.
    Started(String),
}

/// Cola FIFO de narraciones. Máquina de estados pura: no reproduce nada,
/// solo indica qué referencia hay que empezar y cuándo.
///
/// Invariantes: `Playing` mientras hay una reproducción activa, y una entrada
/// sale de `pending` únicamente al empezar a sonar.
#[derive(Debug, Clone)]
pub struct AudioQueue {
    pending: VecDeque<String>,
    state: PlaybackState,
    last_played_at: Option<Instant>,
    cooldown: Duration,
}

impl AudioQueue {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            pending: VecDeque::new(),
            state: PlaybackState::Idle,
            last_played_at: None,
            cooldown,
        }
    }

    /// Durante el cooldown la narración se descarta, no se retrasa.
    pub fn enqueue(&mut self, audio_ref: &str, now: Instant) -> EnqueueOutcome {
        let audio_ref = audio_ref.trim();
        if audio_ref.is_empty() {
            return EnqueueOutcome::Rejected(RejectReason::EmptyReference);
        }
        if let Some(last) = self.last_played_at {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.cooldown {
                return EnqueueOutcome::Rejected(RejectReason::Cooldown {
                    remaining: self.cooldown - elapsed,
                });
            }
        }

        self.pending.push_back(audio_ref.to_string());
        match self.on_playback_start(now) {
            Some(started) => EnqueueOutcome::Started(started),
            None => EnqueueOutcome::Queued { position: self.pending.len() },
        }
    }

    /// Saca la cabeza y la marca como activa. No hace nada si ya hay algo sonando.
    pub fn on_playback_start(&mut self, now: Instant) -> Option<String> {
        if self.is_playing() {
            return None;
        }
        let next = self.pending.pop_front()?;
        self.last_played_at = Some(now);
        self.state = PlaybackState::Playing { current: next.clone() };
        Some(next)
    }

    /// Fin natural o error de reproducción: ambos avanzan la cola igual.
    /// Devuelve la siguiente referencia a reproducir, si la hay.
    pub fn on_playback_end(&mut self, now: Instant) -> Option<String> {
        if !self.is_playing() {
            return None;
        }
        self.state = PlaybackState::Idle;
        self.on_playback_start(now)
    }

    /// Vacía la cola y vuelve a `Idle`. Si había un clip activo se devuelve
    /// para que el llamador libere su recurso (una sola vez).
    pub fn teardown(&mut self) -> Option<String> {
        self.pending.clear();
        match std::mem::replace(&mut self.state, PlaybackState::Idle) {
            PlaybackState::Playing { current } => Some(current),
            PlaybackState::Idle => None,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing { .. })
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}

impl Default for AudioQueue {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}
