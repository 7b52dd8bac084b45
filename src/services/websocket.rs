use axum::{
    extract::{Extension, ws::{Message, WebSocket, WebSocketUpgrade}},
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tracing::warn;

use crate::services::{
    coordinator::Coordinator,
    publisher::{self, EndpointSink},
};

/* Web Socket stuff */
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Extension(coordinator): Extension<Arc<Coordinator>>,
    Extension(endpoint): Extension<Arc<EndpointSink>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, coordinator, endpoint))
}

async fn handle_socket(socket: WebSocket, coordinator: Arc<Coordinator>, endpoint: Arc<EndpointSink>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = publisher::outbox();

    let connection = coordinator.next_connection_id();
    coordinator.connect(&endpoint, connection, tx).await;

    // Task to send messages to this client
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // One frame at a time; the coordinator serializes across connections.
    while let Some(frame) = receiver.next().await {
        match frame {
            Ok(Message::Text(text)) => coordinator.handle_frame(connection, text.as_str()).await,
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket error on connection {}: {}", connection, e);
                break;
            }
        }
    }

    // Clean up
    coordinator.disconnect(&endpoint, connection).await;
    send_task.abort();
}
