use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::obstacle::clamp_drag_target;
use crate::protocol::{ClientMsg, ServerMsg};
use crate::session_loop::{SessionBroadcast, SessionCommand};
use multicam_shared::vec3::Vec3;

/// Client messages larger than this close the connection.
pub const MAX_CLIENT_MSG_BYTES: usize = 1024;

/// Shared app state passed to each WebSocket handler
#[derive(Clone)]
pub struct AppState {
    pub session_tx: mpsc::Sender<SessionCommand>,
    pub broadcast_tx: broadcast::Sender<SessionBroadcast>,
    /// Drag targets are clamped to this on x and y
    pub container_half_size: f64,
}

/// HTTP handler for WebSocket upgrade
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: AppState) {
    let (mut sink, mut stream) = socket.split();

    // Subscribe before joining so the frame carrying our own join is not missed
    let mut broadcast_rx = app_state.broadcast_tx.subscribe();

    let (resp_tx, resp_rx) = oneshot::channel();
    if app_state
        .session_tx
        .send(SessionCommand::Join { response: resp_tx })
        .await
        .is_err()
    {
        tracing::error!("Failed to send Join command");
        return;
    }

    let (my_id, welcome) = match resp_rx.await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("Failed to receive welcome");
            return;
        }
    };

    tracing::info!(participant_id = my_id, "client connected");

    let sent = match serde_json::to_string(&ServerMsg::Welcome(welcome)) {
        Ok(json) => sink.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!(participant_id = my_id, %e, "failed to encode welcome");
            false
        }
    };

    if sent {
        loop {
            tokio::select! {
                // Client -> Server
                msg = stream.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if text.as_str().len() > MAX_CLIENT_MSG_BYTES {
                                tracing::warn!(
                                    participant_id = my_id,
                                    len = text.as_str().len(),
                                    "oversized client message, closing"
                                );
                                break;
                            }
                            match serde_json::from_str::<ClientMsg>(text.as_str()) {
                                Ok(client_msg) => {
                                    let msg = sanitize(client_msg, app_state.container_half_size);
                                    if app_state
                                        .session_tx
                                        .send(SessionCommand::Client { id: my_id, msg })
                                        .await
                                        .is_err()
                                    {
                                        break;
                                    }
                                }
                                Err(e) => {
                                    tracing::debug!(participant_id = my_id, %e, "ignoring malformed client message");
                                }
                            }
                        }
                        Some(Ok(Message::Binary(data))) if data.len() > MAX_CLIENT_MSG_BYTES => {
                            tracing::warn!(participant_id = my_id, len = data.len(), "oversized client message, closing");
                            break;
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(e)) => {
                            tracing::debug!(participant_id = my_id, %e, "websocket error");
                            break;
                        }
                        _ => {} // Ignore ping/pong/binary
                    }
                }

                // Server -> Client (broadcast)
                result = broadcast_rx.recv() => {
                    match result {
                        Ok(SessionBroadcast::Frame(frame)) => {
                            let json = match serde_json::to_string(&ServerMsg::Frame(frame)) {
                                Ok(json) => json,
                                Err(e) => {
                                    tracing::error!(%e, "failed to encode frame");
                                    continue;
                                }
                            };
                            if sink.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(participant_id = my_id, skipped = n, "client lagged behind frames");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        }
    }

    // Cleanup on disconnect
    let _ = app_state
        .session_tx
        .send(SessionCommand::Leave { id: my_id })
        .await;
    tracing::info!(participant_id = my_id, "client disconnected");
}

/// Edge validation before a message reaches the scene.
fn sanitize(msg: ClientMsg, half_size: f64) -> ClientMsg {
    match msg {
        ClientMsg::DragObstacle { pos } => ClientMsg::DragObstacle {
            pos: clamp_drag_target(Vec3::from_array(pos), half_size).to_array(),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_targets_are_clamped() {
        let msg = sanitize(
            ClientMsg::DragObstacle {
                pos: [10.0, -10.0, -7.0],
            },
            4.0,
        );
        match msg {
            ClientMsg::DragObstacle { pos } => assert_eq!(pos, [4.0, -4.0, -7.0]),
            other => panic!("Expected DragObstacle, got {:?}", other),
        }
    }

    #[test]
    fn other_messages_pass_through() {
        match sanitize(ClientMsg::Reset, 4.0) {
            ClientMsg::Reset => {}
            other => panic!("Expected Reset, got {:?}", other),
        }
    }
}
