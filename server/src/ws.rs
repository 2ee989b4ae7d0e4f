use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::spin_loop::{WheelBroadcast, WheelCommand};
use wheel_shared::protocol::{ClientMsg, ServerMsg};

/// Shared app state passed to each WebSocket handler
#[derive(Clone)]
pub struct AppState {
    pub wheel_tx: mpsc::Sender<WheelCommand>,
    pub broadcast_tx: broadcast::Sender<WheelBroadcast>,
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

    // Subscribe before joining so no broadcast between welcome and the loop is lost
    let mut broadcast_rx = app_state.broadcast_tx.subscribe();

    let (resp_tx, resp_rx) = oneshot::channel();
    if app_state
        .wheel_tx
        .send(WheelCommand::ClientJoin { response: resp_tx })
        .await
        .is_err()
    {
        tracing::error!("Failed to send ClientJoin command");
        return;
    }

    let (my_id, welcome) = match resp_rx.await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!("Failed to receive welcome");
            return;
        }
    };

    tracing::info!("Client {} connected", my_id);

    let welcome_json = match serde_json::to_string(&ServerMsg::Welcome(welcome)) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to encode welcome: {}", e);
            return;
        }
    };
    if sink.send(Message::Text(welcome_json.into())).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            // Client -> Server
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMsg>(&text) {
                            Ok(client_msg) => {
                                let cmd = WheelCommand::Client { id: my_id, msg: client_msg };
                                if app_state.wheel_tx.send(cmd).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::debug!("Client {} sent unparseable message: {}", my_id, e);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {} // Ignore ping/pong/binary
                }
            }

            // Server -> Client (broadcast)
            result = broadcast_rx.recv() => {
                match result {
                    Ok(broadcast) => {
                        let msg = match broadcast {
                            WheelBroadcast::All(msg) => msg,
                            WheelBroadcast::To { client_id, msg } => {
                                if client_id != my_id {
                                    continue; // Not for this client
                                }
                                msg
                            }
                        };

                        if let Ok(json) = serde_json::to_string(&msg) {
                            if sink.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Frames are superseded by the next one; the final
                        // frame and spin_result are sent last
                        tracing::warn!("Client {} lagged by {} messages", my_id, n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    // Cleanup on disconnect
    let _ = app_state
        .wheel_tx
        .send(WheelCommand::ClientLeave { id: my_id })
        .await;
    tracing::info!("Client {} disconnected", my_id);
}
