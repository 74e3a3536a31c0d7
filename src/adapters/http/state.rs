use std::sync::Arc;
use crate::adapters::overlay::BroadcastOverlay;
use crate::application::services::SessionHandle;
use crate::config::AppConfig;

/// Estado compartido para los manejadores HTTP de Axum.
#[derive(Clone)]
pub struct HttpState {
    /// Resultados de detección que el dashboard dibuja.
    pub overlay: Arc<BroadcastOverlay>,
    /// Sesión en curso, para consultar contadores.
    pub session: SessionHandle,
    pub config: Arc<AppConfig>,
}
