// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Newline-delimited framing over the agent subprocess's stdio (spec §4.2,
//! §9 "subprocess stdio as an unbounded stream"). A line exceeding the
//! configured budget is fatal for the connection, but we never buffer the
//! whole oversized line — only a bounded preview is kept for diagnostics.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::WireError;
use crate::message::Message;

/// Bound on the diagnostic preview kept when a line is rejected
/// (spec §9's "drained with a bounded preview for diagnostics";
/// `SPEC_FULL.md` §2 pins this at 1024 bytes).
pub const DEFAULT_MAX_LINE_PREVIEW_BYTES: usize = 1024;

fn preview(bytes: &[u8]) -> String {
    let n = bytes.len().min(DEFAULT_MAX_LINE_PREVIEW_BYTES);
    String::from_utf8_lossy(&bytes[..n]).into_owned()
}

/// Read one `\n`-terminated message, enforcing `max_bytes` on the line
/// (excluding the delimiter). Returns `Ok(None)` on clean EOF with no
/// partial data buffered.
pub async fn read_message<R>(reader: &mut R, max_bytes: usize) -> Result<Option<Message>, WireError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf: Vec<u8> = Vec::new();
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return if buf.is_empty() {
                Ok(None)
            } else {
                Err(WireError::Decode(format!(
                    "connection closed mid-line (preview: {:?})",
                    preview(&buf)
                )))
            };
        }

        if let Some(pos) = available.iter().position(|&b| b == b'\n') {
            if buf.len() + pos > max_bytes {
                let over = preview(&buf);
                reader.consume(pos + 1);
                return Err(WireError::LineTooLong { max_bytes, preview: over });
            }
            buf.extend_from_slice(&available[..pos]);
            reader.consume(pos + 1);
            break;
        }

        if buf.len() + available.len() > max_bytes {
            let over_preview = preview(&buf);
            let consumed = available.len();
            reader.consume(consumed);
            drain_until_newline(reader).await?;
            return Err(WireError::LineTooLong { max_bytes, preview: over_preview });
        }
        buf.extend_from_slice(available);
        let consumed = available.len();
        reader.consume(consumed);
    }

    let text = String::from_utf8(buf).map_err(|e| WireError::Decode(e.to_string()))?;
    if text.trim().is_empty() {
        // Blank keepalive line; treat as "nothing to dispatch" by recursing.
        return Box::pin(read_message(reader, max_bytes)).await;
    }
    Message::parse(&text).map(Some)
}

/// Consume and discard bytes up to (and including) the next newline,
/// without ever holding more than one read-buffer's worth in memory.
async fn drain_until_newline<R>(reader: &mut R) -> Result<(), WireError>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(());
        }
        if let Some(pos) = available.iter().position(|&b| b == b'\n') {
            reader.consume(pos + 1);
            return Ok(());
        }
        let consumed = available.len();
        reader.consume(consumed);
    }
}

/// Serialize and write one message, newline-terminated, flushing so the
/// supervisor's writer mutex (spec §4.2) observes a complete send.
pub async fn write_message<W>(writer: &mut W, message: &Message) -> Result<(), WireError>
where
    W: AsyncWrite + Unpin,
{
    let line = message.to_line()?;
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
#[path = "framing_tests.rs"]
mod tests;
