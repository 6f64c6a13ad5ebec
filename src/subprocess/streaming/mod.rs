//! Real-time streaming of subprocess output
//!
//! Pipes are turned into lazy line streams and forwarded to an editor
//! session as they are produced, or drained whole when a caller only wants
//! the final text.

pub mod forward;
pub mod lines;
pub mod types;


pub use forward::forward_lines;
pub use lines::{drain_merged, line_stream, read_to_end_lossy, LineStream};
pub use types::{ForwardSummary, StreamSource};
