//! The per-session output websocket

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, info};

use super::response::ApiError;
use super::AppState;
use crate::request::ValidationError;
use crate::session::{ChannelError, ChannelSink, DeliveryChannel, SessionId};

/// Write half of an editor's websocket, owned by the channel's writer task.
pub struct WebSocketSink(SplitSink<WebSocket, Message>);

#[async_trait]
impl ChannelSink for WebSocketSink {
    async fn send_text(&mut self, text: String) -> Result<(), ChannelError> {
        self.0
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))
    }

    async fn close(&mut self) {
        self.0.close().await.ok();
    }
}

#[derive(Debug, Deserialize)]
pub struct OutputQuery {
    sid: Option<String>,
}

pub async fn output_socket(
    ws: WebSocketUpgrade,
    Query(query): Query<OutputQuery>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let session = query
        .sid
        .filter(|sid| !sid.trim().is_empty())
        .map(SessionId::new)
        .ok_or(ValidationError::Missing("sid"))?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, session, state)))
}

async fn handle_socket(socket: WebSocket, session: SessionId, state: AppState) {
    let (sender, mut receiver) = socket.split();
    let (channel, _writer) = DeliveryChannel::open(session.clone(), WebSocketSink(sender));
    let connection_id = channel.connection_id();

    info!("Output channel {} connected for session {}", connection_id, session);
    state.registry.attach(channel).await;

    // The editor never sends anything meaningful; read only to notice the close.
    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Output socket for session {} errored: {}", session, e);
                break;
            }
        }
    }

    state.registry.detach(&session, connection_id).await;
    let pruned = state.registry.prune().await;
    info!(
        "Output channel {} disconnected for session {} ({} stale channels pruned)",
        connection_id, session, pruned
    );
}
