//! Core types for streaming infrastructure

use std::fmt;

/// Stream source identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSource {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamSource::Stdout => f.write_str("stdout"),
            StreamSource::Stderr => f.write_str("stderr"),
        }
    }
}

/// What happened while forwarding one stream to a session.
#[derive(Debug, Default)]
pub struct ForwardSummary {
    /// Lines read from the pipe.
    pub lines_read: usize,
    /// Lines the channel accepted.
    pub forwarded: usize,
    /// Lines kept for the caller, when capturing was requested.
    pub captured: Vec<String>,
    /// Whether the channel went away before the stream ended.
    pub channel_lost: bool,
}
