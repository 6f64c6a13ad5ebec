//! Forward a line stream to a session's output channel

use futures::StreamExt;
use tracing::debug;

use super::lines::LineStream;
use super::types::ForwardSummary;
use crate::session::{SessionContext, StreamMessage};

/// Drain `lines`, sending each one through `render` to the session.
///
/// Once the channel stops accepting frames nothing more is rendered, but the
/// stream is still read to the end so the child never blocks on a full pipe.
/// With `capture` set every line is also returned to the caller.
pub async fn forward_lines<F>(
    mut lines: LineStream,
    ctx: &SessionContext,
    capture: bool,
    render: F,
) -> ForwardSummary
where
    F: Fn(&str) -> StreamMessage,
{
    let mut summary = ForwardSummary::default();
    let mut delivering = ctx.is_live();

    while let Some(line) = lines.next().await {
        summary.lines_read += 1;

        if delivering {
            if ctx.send(render(&line)) {
                summary.forwarded += 1;
            } else {
                debug!(
                    "Session {} went away; draining remaining output",
                    ctx.session_id()
                );
                delivering = false;
                summary.channel_lost = true;
            }
        }

        if capture {
            summary.captured.push(line);
        }
    }

    summary
}
