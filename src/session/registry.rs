//! Process-wide lookup from session id to its live output channel

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::channel::DeliveryChannel;
use super::context::SessionContext;
use super::message::StreamMessage;
use super::SessionId;

#[derive(Clone, Default)]
pub struct SessionChannelRegistry {
    channels: Arc<RwLock<HashMap<SessionId, DeliveryChannel>>>,
}

impl SessionChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `channel` to its session, replacing any previous connection.
    pub async fn attach(&self, channel: DeliveryChannel) -> Option<DeliveryChannel> {
        let session_id = channel.session_id().clone();
        let previous = self
            .channels
            .write()
            .await
            .insert(session_id.clone(), channel);

        if let Some(ref old) = previous {
            info!(
                "Session {} reconnected; replacing channel {}",
                session_id,
                old.connection_id()
            );
        }
        previous
    }

    /// Remove the session's channel, but only if it is still `connection_id`.
    ///
    /// A reconnect may already have replaced the entry; that newer channel stays.
    pub async fn detach(&self, session_id: &SessionId, connection_id: Uuid) -> bool {
        let mut channels = self.channels.write().await;
        match channels.get(session_id) {
            Some(current) if current.connection_id() == connection_id => {
                channels.remove(session_id);
                debug!("Detached channel {} from session {}", connection_id, session_id);
                true
            }
            _ => false,
        }
    }

    /// The session's channel if one is attached and its writer is still running.
    pub async fn get(&self, session_id: &SessionId) -> Option<DeliveryChannel> {
        let channels = self.channels.read().await;
        channels
            .get(session_id)
            .filter(|channel| channel.is_live())
            .cloned()
    }

    pub async fn is_live(&self, session_id: &SessionId) -> bool {
        self.get(session_id).await.is_some()
    }

    /// Best-effort send; a missing channel drops the message.
    pub async fn send(&self, session_id: &SessionId, message: StreamMessage) -> bool {
        match self.get(session_id).await {
            Some(channel) => channel.send(message),
            None => {
                debug!("No output channel for session {}; frame dropped", session_id);
                false
            }
        }
    }

    /// Drop entries whose writer has already stopped.
    pub async fn prune(&self) -> usize {
        let mut channels = self.channels.write().await;
        let before = channels.len();
        channels.retain(|_, channel| channel.is_live());
        before - channels.len()
    }

    pub async fn len(&self) -> usize {
        self.channels.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.channels.read().await.is_empty()
    }

    /// Snapshot the session's channel into a context for one invocation.
    pub async fn context(&self, session_id: SessionId, user_id: impl Into<String>) -> SessionContext {
        let channel = self.get(&session_id).await;
        SessionContext::new(session_id, user_id, channel)
    }
}
