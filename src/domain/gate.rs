use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    InFlight,
}

/// Garantiza como máximo una petición de inferencia en vuelo.
/// Los frames que llegan mientras hay una en curso se descartan, no se encolan.
#[derive(Debug, Clone, Default)]
pub struct SingleFlightGate {
    in_flight: Arc<AtomicBool>,
}

impl SingleFlightGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admite el frame solo si la puerta está libre. El permiso devuelto
    /// libera la puerta al soltarse, en cualquier camino de salida.
    pub fn try_admit(&self) -> Option<FlightPermit> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlightPermit { in_flight: self.in_flight.clone() })
    }

    pub fn state(&self) -> GateState {
        if self.in_flight.load(Ordering::Acquire) {
            GateState::InFlight
        } else {
            GateState::Idle
        }
    }
}

/// Prueba de admisión. Solo puede liberarse una vez: `release` lo consume
/// y `Drop` cubre error, pánico o cancelación de la tarea.
#[derive(Debug)]
#[must_use = "dropping the permit releases the gate immediately"]
pub struct FlightPermit {
    in_flight: Arc<AtomicBool>,
}

impl FlightPermit {
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for FlightPermit {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}
