use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;
use crate::adapters::http::state::HttpState;
use crate::domain::stream::WsOverlayMessage;

pub async fn ws_handler(ws: WebSocketUpgrade, State(st): State<HttpState>) -> impl axum::response::IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, st))
}

/// Por cada resultado: mensaje de texto con el JSON y, a continuación, el JPEG.
async fn handle_socket(mut socket: WebSocket, st: HttpState) {
    let mut rx = st.overlay.subscribe();

    loop {
        let (frame, jpeg) = match rx.recv().await {
            Ok(item) => item,
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "dashboard client lagging");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let json = serde_json::to_string(&WsOverlayMessage { r#type: "detections".into(), frame }).unwrap_or_default();
        if socket.send(Message::Text(json)).await.is_err() { break; }
        if socket.send(Message::Binary(jpeg)).await.is_err() { break; }
    }
}
