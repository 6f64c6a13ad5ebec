use super::channel::DeliveryChannel;
use super::message::StreamMessage;
use super::SessionId;

/// Everything an orchestrator needs to know about the session it works for.
///
/// The channel is looked up once when the invocation starts. If the client
/// disconnects later, sends start returning `false` and the invocation keeps
/// running.
#[derive(Clone, Debug)]
pub struct SessionContext {
    session_id: SessionId,
    user_id: String,
    channel: Option<DeliveryChannel>,
}

impl SessionContext {
    pub fn new(
        session_id: SessionId,
        user_id: impl Into<String>,
        channel: Option<DeliveryChannel>,
    ) -> Self {
        Self {
            session_id,
            user_id: user_id.into(),
            channel,
        }
    }

    /// A context with no client attached; every frame is dropped.
    pub fn detached(session_id: SessionId, user_id: impl Into<String>) -> Self {
        Self::new(session_id, user_id, None)
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Whether a channel was attached when the invocation started.
    pub fn has_channel(&self) -> bool {
        self.channel.is_some()
    }

    pub fn is_live(&self) -> bool {
        self.channel.as_ref().is_some_and(DeliveryChannel::is_live)
    }

    pub fn send(&self, message: StreamMessage) -> bool {
        match &self.channel {
            Some(channel) => channel.send(message),
            None => false,
        }
    }
}
