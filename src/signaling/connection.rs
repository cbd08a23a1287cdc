//! WebSocket connection handler
//!
//! Each socket is split into a reader loop, which feeds client events to the
//! hub, and a writer task, which drains the connection's outbound queue.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};

use super::hub::{MessageReceiver, SignalingHub};
use super::message::ClientMessage;
use super::peer::ConnectionId;

/// Serve one signaling socket until the client goes away
pub async fn serve_socket(socket: WebSocket, hub: Arc<SignalingHub>) {
    let (id, outbound) = hub.connect().await;
    let (sink, mut stream) = socket.split();

    let writer = tokio::spawn(write_loop(id.clone(), sink, outbound));

    while let Some(frame) = stream.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(peer = %id, error = %e, "Socket read error");
                break;
            }
        };

        match frame {
            Message::Text(text) => handle_text(&hub, &id, &text).await,
            Message::Close(_) => break,
            // Ping/pong is answered by the socket layer
            Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    // Removing the connection closes its queue, which ends the writer
    hub.disconnect(&id).await;
    if let Err(e) = writer.await {
        tracing::debug!(peer = %id, error = %e, "Writer task failed");
    }
}

async fn handle_text(hub: &SignalingHub, id: &ConnectionId, text: &str) {
    let message = match ClientMessage::parse(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::debug!(peer = %id, error = %e, "Ignoring client frame");
            return;
        }
    };

    let event = message.event();
    if let Err(e) = hub.handle(id, message).await {
        tracing::warn!(peer = %id, event = event, error = %e, "Signaling message rejected");
    }
}

async fn write_loop<S>(id: ConnectionId, mut sink: S, mut outbound: MessageReceiver)
where
    S: futures::Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    while let Some(message) = outbound.recv().await {
        if let Err(e) = sink.send(Message::Text(message.to_json())).await {
            tracing::debug!(peer = %id, error = %e, "Socket write failed");
            break;
        }
    }

    let _ = sink.close().await;
}
