//! WebSocket session handling

use super::http::AppState;
use crate::command::Dispatch;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use pixel_commander_shared::codec;
use std::net::SocketAddr;
use tracing::{debug, error, info, warn};

/// Upgrade an HTTP request on `/ws` into a client session
pub async fn upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| run_session(socket, addr, state))
}

/// Serve one client until it disconnects or stops reading its replies
async fn run_session(socket: WebSocket, addr: SocketAddr, state: AppState) {
    let (handle, mut outbound) = state.registry.open(addr);
    let id = handle.id;
    let connected_at = handle.connected_at;
    info!("WebSocket client {} connected from {}", id, handle.addr);

    let (mut sink, mut stream) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(reply) = outbound.recv().await {
            let text = match codec::encode(&reply) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to encode reply for client {}: {}", id, e);
                    continue;
                }
            };

            if let Err(e) = sink.send(Message::Text(text)).await {
                debug!("Write to client {} failed: {}", id, e);
                break;
            }
        }
    });

    loop {
        let frame = tokio::select! {
            _ = handle.evicted() => break,
            frame = stream.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => {
                if let Dispatch::Reply(reply) = state.dispatcher.dispatch(id, &text) {
                    if handle.send(reply).is_err() {
                        break;
                    }
                }
            }
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {
                // Binary and control frames carry no commands
            }
            Some(Err(e)) => {
                warn!("Read error from client {}: {}", id, e);
                break;
            }
        }
    }

    let lagging = handle.is_evicted();
    state.registry.unregister(id);
    drop(handle);

    if lagging {
        // The writer may be parked on a socket the client never drains
        warn!("Client {} stopped reading replies, closing", id);
        writer.abort();
    }

    // Otherwise dropping the last sender lets the writer flush and exit
    match writer.await {
        Err(e) if !e.is_cancelled() => error!("Writer task for client {} failed: {}", id, e),
        _ => {}
    }

    info!(
        "WebSocket client {} ({}) disconnected after {:?}",
        id,
        addr,
        connected_at.elapsed()
    );
}
