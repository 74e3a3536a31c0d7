use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{info, warn};

use crate::application::ports::FrameSource;
use crate::application::services::{DetectionSession, FrameDisposition};

/// Hilo de captura: lee frames de la fuente y los pasa a la sesión, uno
/// detrás de otro. Termina cuando la sesión se para o la fuente se agota.
pub struct FrameWorker;

impl FrameWorker {
    pub fn spawn(mut source: Box<dyn FrameSource>, mut session: DetectionSession) -> std::io::Result<JoinHandle<()>> {
        let handle = session.handle();

        std::thread::Builder::new()
            .name("frame-worker".into())
            .spawn(move || {
                info!("Pipeline Worker: hilo de captura iniciado.");

                while handle.is_active() {
                    match source.next_frame() {
                        Ok(Some(frame)) => {
                            if session.on_frame(frame) == FrameDisposition::Inactive {
                                break;
                            }
                        }
                        Ok(None) => {
                            info!("Fuente de frames agotada");
                            break;
                        }
                        Err(e) => {
                            warn!("Error capturando frame: {}", e);
                            std::thread::sleep(Duration::from_millis(10));
                        }
                    }
                }

                let stats = handle.stats();
                info!(
                    "Pipeline Worker: fin ({} frames, {} enviados, {} descartados por ocupado)",
                    stats.frames_seen, stats.frames_submitted, stats.frames_dropped_busy
                );
            })
    }
}
