use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Contadores de la sesión, compartidos entre el hilo de captura,
/// las tareas de inferencia y el actor de narración.
#[derive(Debug, Default)]
pub struct SessionStats {
    pub frames_seen: AtomicU64,
    pub frames_sampled: AtomicU64,
    pub frames_submitted: AtomicU64,
    pub frames_dropped_busy: AtomicU64,
    pub inference_errors: AtomicU64,
    pub results_rendered: AtomicU64,
    pub results_discarded: AtomicU64,
    pub narration_started: AtomicU64,
    pub narration_rejected: AtomicU64,
    pub playback_errors: AtomicU64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub frames_seen: u64,
    pub frames_sampled: u64,
    pub frames_submitted: u64,
    pub frames_dropped_busy: u64,
    pub inference_errors: u64,
    pub results_rendered: u64,
    pub results_discarded: u64,
    pub narration_started: u64,
    pub narration_rejected: u64,
    pub playback_errors: u64,
}

impl SessionStats {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            frames_seen: get(&self.frames_seen),
            frames_sampled: get(&self.frames_sampled),
            frames_submitted: get(&self.frames_submitted),
            frames_dropped_busy: get(&self.frames_dropped_busy),
            inference_errors: get(&self.inference_errors),
            results_rendered: get(&self.results_rendered),
            results_discarded: get(&self.results_discarded),
            narration_started: get(&self.narration_started),
            narration_rejected: get(&self.narration_rejected),
            playback_errors: get(&self.playback_errors),
        }
    }
}
