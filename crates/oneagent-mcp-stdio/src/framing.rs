//! Content-Length framed JSON-RPC over an arbitrary async byte stream.
//!
//! Async counterpart to the synchronous `read_framed`/`write_framed` pair
//! used by the decision-gate MCP server's stdio transport: a blank-line
//! terminated header block naming `Content-Length`, followed by exactly
//! that many payload bytes.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Framing-level failure. Distinct from a JSON parse failure: these occur
/// before any payload bytes are known to exist.
#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    /// The peer closed the stream mid-frame (after at least one header
    /// line was read). Distinct from a clean [`read_frame`] `Ok(None)`,
    /// which only happens between frames.
    #[error("stdin closed mid-frame")]
    UnexpectedEof,
    /// A header line was present but not a recognized `Content-Length`
    /// value; the header block was still drained to the blank line so the
    /// next call starts aligned on the following frame.
    #[error("malformed Content-Length header: {0}")]
    BadHeader(String),
    /// The header block ended (blank line) with no `Content-Length` seen.
    #[error("missing Content-Length header")]
    MissingContentLength,
    /// Declared length exceeded `max_body_bytes`; the payload was drained
    /// from the stream so framing stays aligned.
    #[error("payload of {0} bytes exceeds the {1}-byte limit")]
    PayloadTooLarge(usize, usize),
    /// Underlying I/O failure.
    #[error("stdio I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read one frame. Returns `Ok(None)` on a clean EOF between frames
/// (nothing read yet), `Ok(Some(bytes))` on a complete frame, or a
/// [`FramingError`] otherwise. All header-block errors leave the stream
/// resynced at the start of the next frame.
pub async fn read_frame<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    max_body_bytes: usize,
) -> Result<Option<Vec<u8>>, FramingError> {
    let mut content_length: Option<usize> = None;
    let mut bad_header: Option<String> = None;
    let mut any_line = false;
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            return if any_line { Err(FramingError::UnexpectedEof) } else { Ok(None) };
        }
        any_line = true;

        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }
        if let Some(value) = trimmed.strip_prefix("Content-Length:") {
            match value.trim().parse::<usize>() {
                Ok(n) => content_length = Some(n),
                Err(_) => bad_header = Some(value.trim().to_string()),
            }
        }
        // Unrecognized headers (there are none in this protocol beyond
        // Content-Length) are ignored rather than rejected, matching
        // HTTP/1.1 header-block tolerance.
    }

    if let Some(raw) = bad_header {
        return Err(FramingError::BadHeader(raw));
    }
    let len = content_length.ok_or(FramingError::MissingContentLength)?;
    if len > max_body_bytes {
        drain(reader, len).await?;
        return Err(FramingError::PayloadTooLarge(len, max_body_bytes));
    }

    let mut body = vec![0u8; len];
    tokio::io::AsyncReadExt::read_exact(reader, &mut body).await?;
    Ok(Some(body))
}

async fn drain<R: AsyncBufRead + Unpin>(reader: &mut R, len: usize) -> std::io::Result<()> {
    let mut remaining = len;
    let mut sink = vec![0u8; remaining.min(8192)];
    while remaining > 0 {
        let take = remaining.min(sink.len());
        tokio::io::AsyncReadExt::read_exact(reader, &mut sink[..take]).await?;
        remaining -= take;
    }
    Ok(())
}

/// Write one `Content-Length` framed payload and flush.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) -> std::io::Result<()> {
    let header = format!("Content-Length: {}\r\n\r\n", payload.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await
}
