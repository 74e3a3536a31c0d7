use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use crate::adapters::http::state::HttpState;

pub async fn get_config(State(st): State<HttpState>) -> impl IntoResponse {
    let cfg = &st.config;
    Json(json!({
        "server_url": cfg.server_url,
        "request_timeout_secs": cfg.request_timeout.as_secs(),
        "sample_interval": cfg.sample_interval,
        "cooldown_ms": cfg.cooldown.as_millis() as u64,
        "player": cfg.player_program,
        "frames_dir": cfg.source.frames_dir.to_string_lossy(),
        "fps": cfg.source.fps,
        "camera": cfg.source.camera,
    }))
}

pub async fn get_status(State(st): State<HttpState>) -> impl IntoResponse {
    Json(json!({
        "active": st.session.is_active(),
        "dashboard_clients": st.overlay.subscriber_count(),
        "stats": st.session.stats(),
    }))
}
