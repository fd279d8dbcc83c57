use std::sync::Arc;

use axum::{
    extract::{Extension, Path, ws::{WebSocket, WebSocketUpgrade, Message}},
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;

use crate::errors::{parse_id, DraftError};
use crate::services::runtime::DraftRuntime;

/* Web Socket stuff */
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(league_id): Path<String>,
    Extension(runtime): Extension<Arc<DraftRuntime>>,
) -> Result<impl IntoResponse, DraftError> {
    let league_id = parse_id(&league_id)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, league_id, runtime)))
}

/// Spectator connection: receives room broadcasts until it disconnects.
/// Inbound frames are discarded.
async fn handle_socket(socket: WebSocket, league_id: i64, runtime: Arc<DraftRuntime>) {
    let mut rx = runtime.rooms.join(league_id).await;
    let (mut sender, mut receiver) = socket.split();

    // Task to push room events to this client.
    let send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(msg) => {
                    if sender.send(Message::Text(msg.into())).await.is_err() {
                        break;
                    }
                }
                // This client fell behind; skip what it missed.
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    // Drain and drop inbound messages until the client goes away.
    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Close(_) = msg {
            break;
        }
    }

    // The send task owns this client's room receiver; wait for the abort
    // to land so the receiver is gone before the prune check in leave.
    send_task.abort();
    let _ = send_task.await;
    runtime.rooms.leave(league_id).await;
}
