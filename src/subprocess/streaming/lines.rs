//! Byte pipes to text lines

use futures::stream::{self, Stream};
use std::pin::Pin;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

use super::types::StreamSource;

pub type LineStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Remove the trailing line terminator (`\n` or `\r\n`)
fn normalize_line(mut line: Vec<u8>) -> String {
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
    String::from_utf8_lossy(&line).into_owned()
}

/// Lazily read `reader` line by line.
///
/// The stream ends at EOF. A read error also ends it; the error is logged and
/// never surfaces to the consumer.
pub fn line_stream<R>(reader: R, source: StreamSource) -> LineStream
where
    R: AsyncRead + Send + Unpin + 'static,
{
    Box::pin(stream::unfold(
        BufReader::new(reader),
        move |mut reader| async move {
            let mut line = Vec::new();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) => None,
                Ok(_) => Some((normalize_line(line), reader)),
                Err(e) => {
                    tracing::warn!("Stopped reading {}: {}", source, e);
                    None
                }
            }
        },
    ))
}

/// Read everything `reader` produces, keeping whatever arrived before an error.
pub async fn read_to_end_lossy<R>(mut reader: R, source: StreamSource) -> String
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Err(e) = reader.read_to_end(&mut buf).await {
        tracing::warn!(
            "Stopped reading {} after {} bytes: {}",
            source,
            buf.len(),
            e
        );
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Drain both pipes concurrently and return stdout followed by stderr.
///
/// Reading them side by side keeps a chatty stderr from filling its pipe and
/// stalling the child while stdout is still open.
pub async fn drain_merged<O, E>(stdout: O, stderr: E) -> String
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let (out, err) = tokio::join!(
        read_to_end_lossy(stdout, StreamSource::Stdout),
        read_to_end_lossy(stderr, StreamSource::Stderr)
    );

    let mut merged = out;
    merged.push_str(&err);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_line() {
        assert_eq!(normalize_line(b"test\n".to_vec()), "test");
        assert_eq!(normalize_line(b"test\r\n".to_vec()), "test");
        assert_eq!(normalize_line(b"test".to_vec()), "test");
        assert_eq!(normalize_line(Vec::new()), "");
        assert_eq!(normalize_line(b"\ttab\n".to_vec()), "\ttab");
    }

    #[test]
    fn test_normalize_line_replaces_invalid_utf8() {
        assert_eq!(normalize_line(vec![b'a', 0xff, b'\n']), "a\u{fffd}");
    }
}
