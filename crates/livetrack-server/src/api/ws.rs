//! WebSocket streaming of the pilot list.
use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{interval, MissedTickBehavior};

/// Handler for WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> axum::response::Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
        .into_response()
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let clients = &state.metrics().stream_clients;
    clients.inc();
    stream_pilots(&mut socket, &state).await;
    clients.dec();
    tracing::debug!("Stream client disconnected");
}

async fn stream_pilots(socket: &mut WebSocket, state: &AppState) {
    // Subscribe before taking the snapshot so no write falls in between.
    let mut rx = state.tx.subscribe();
    tracing::debug!("Stream client connected ({} total)", state.stream_client_count());

    if let Some(snapshot) = state.snapshot_message() {
        if send_snapshot(socket, state, &snapshot.payload).await.is_err() {
            return;
        }
    }

    let mut heartbeat = interval(Duration::from_secs(state.config().heartbeat_secs));
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    heartbeat.tick().await;

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                }
            }
            event = rx.recv() => {
                match event {
                    Ok(msg) => {
                        if send_snapshot(socket, state, &msg.payload).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        // Drop missed updates; a newer snapshot will arrive soon.
                        tracing::debug!("Stream client lagged, skipped {} snapshots", skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            _ = heartbeat.tick() => {
                if socket.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }
}

async fn send_snapshot(socket: &mut WebSocket, state: &AppState, payload: &str) -> Result<(), axum::Error> {
    socket.send(Message::Text(payload.to_owned())).await?;
    state.metrics().stream_frames_sent_total.inc();
    Ok(())
}
