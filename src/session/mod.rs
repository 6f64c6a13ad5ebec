//! Editor sessions and their output channels
//!
//! A session is identified by the id the editor generated for its output
//! websocket. At most one live [`DeliveryChannel`] is bound to a session at a
//! time; orchestrators never talk to the registry directly but receive a
//! [`SessionContext`] snapshot for the duration of one invocation.

pub mod channel;
pub mod context;
pub mod message;
pub mod registry;

pub use channel::{ChannelError, ChannelSink, DeliveryChannel, MemorySink};
pub use context::SessionContext;
pub use message::{CommandTag, StreamMessage};
pub use registry::SessionChannelRegistry;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an editor session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
