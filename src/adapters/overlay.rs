use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::debug;

use crate::application::ports::{Frame, OverlayPort};
use crate::domain::{detection::DetectedObject, stream::OverlayFrame};

/// Overlay que publica cada resultado en un canal de difusión; el dashboard
/// web lo dibuja sobre el JPEG que acompaña al mensaje.
pub struct BroadcastOverlay {
    tx: broadcast::Sender<(OverlayFrame, Vec<u8>)>,
    sequence: AtomicU64,
}

impl BroadcastOverlay {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, sequence: AtomicU64::new(0) }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<(OverlayFrame, Vec<u8>)> {
        self.tx.subscribe()
    }

    /// Clientes del dashboard conectados ahora mismo.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl OverlayPort for BroadcastOverlay {
    fn render(&self, frame: &Frame, objects: &[DetectedObject], audio_url: Option<&str>, infer_ms: f32) {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        for obj in objects {
            let b = obj.bounding_box;
            debug!(
                sequence,
                "{} @ ({:.0}, {:.0}) {:.0}x{:.0}",
                obj.caption(), b.left, b.top, b.width(), b.height()
            );
        }

        // Sin suscriptores no hay nadie a quien dibujar.
        if self.subscriber_count() == 0 {
            return;
        }
        let meta = OverlayFrame {
            sequence,
            width: frame.width,
            height: frame.height,
            infer_ms,
            objects: objects.to_vec(),
            audio_url: audio_url.map(str::to_string),
        };
        let _ = self.tx.send((meta, frame.jpeg.clone()));
    }
}
