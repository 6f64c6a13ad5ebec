//! Per-session delivery channel with a single writer
//!
//! Every channel owns exactly one writer task. Producers (the stdout task and
//! the stderr loop of a build, the background test task) only enqueue whole
//! [`StreamMessage`]s; the writer serializes and transmits them one at a time,
//! so frames can never interleave on the transport.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use super::message::StreamMessage;
use super::SessionId;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("channel closed by peer")]
    Closed,

    #[error("transport error: {0}")]
    Transport(String),
}

/// The transport end of a delivery channel, driven only by the writer task.
#[async_trait]
pub trait ChannelSink: Send + 'static {
    async fn send_text(&mut self, text: String) -> Result<(), ChannelError>;

    async fn close(&mut self) {}
}

#[derive(Clone, Debug)]
pub struct DeliveryChannel {
    session_id: SessionId,
    connection_id: Uuid,
    tx: mpsc::UnboundedSender<StreamMessage>,
}

impl DeliveryChannel {
    /// Start a writer task over `sink` and return the producer handle.
    ///
    /// The writer stops when the sink fails or every producer handle is dropped.
    pub fn open<S: ChannelSink>(session_id: SessionId, sink: S) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = Uuid::new_v4();
        let writer = tokio::spawn(run_writer(session_id.clone(), connection_id, sink, rx));

        (
            Self {
                session_id,
                connection_id,
                tx,
            },
            writer,
        )
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    pub fn is_live(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Queue a message for delivery. Returns `false` once the writer is gone.
    pub fn send(&self, message: StreamMessage) -> bool {
        match self.tx.send(message) {
            Ok(()) => true,
            Err(_) => {
                debug!(
                    "Dropping frame for session {}: channel {} is closed",
                    self.session_id, self.connection_id
                );
                false
            }
        }
    }
}

async fn run_writer<S: ChannelSink>(
    session_id: SessionId,
    connection_id: Uuid,
    mut sink: S,
    mut rx: mpsc::UnboundedReceiver<StreamMessage>,
) {
    debug!(
        "Output channel {} opened for session {}",
        connection_id, session_id
    );

    while let Some(message) = rx.recv().await {
        let text = match serde_json::to_string(&message) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to serialize frame for session {}: {}", session_id, e);
                continue;
            }
        };

        trace!("-> {} {}", session_id, text);

        if let Err(e) = sink.send_text(text).await {
            warn!(
                "Output channel {} for session {} failed: {}",
                connection_id, session_id, e
            );
            break;
        }
    }

    rx.close();
    sink.close().await;
    debug!(
        "Output channel {} closed for session {}",
        connection_id, session_id
    );
}

/// Sink that keeps every frame in memory, for tests and the local CLI.
#[derive(Clone, Default)]
pub struct MemorySink {
    frames: Arc<Mutex<Vec<String>>>,
    capacity: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `capacity` frames, then behave like a disconnected peer.
    pub fn disconnect_after(capacity: usize) -> Self {
        Self {
            frames: Arc::default(),
            capacity: Some(capacity),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn frames(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Frames decoded back into JSON values.
    pub fn values(&self) -> Vec<serde_json::Value> {
        self.lock()
            .iter()
            .filter_map(|frame| serde_json::from_str(frame).ok())
            .collect()
    }
}

#[async_trait]
impl ChannelSink for MemorySink {
    async fn send_text(&mut self, text: String) -> Result<(), ChannelError> {
        let mut frames = self.lock();
        if self.capacity.is_some_and(|cap| frames.len() >= cap) {
            return Err(ChannelError::Closed);
        }
        frames.push(text);
        Ok(())
    }
}
