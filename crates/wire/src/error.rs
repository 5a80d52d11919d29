// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

/// Errors raised while framing or decoding the wire protocol.
///
/// Never exposes a raw line — only a bounded preview, per spec §9's
/// "never buffer the entire oversized line" design note.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("message exceeds {max_bytes} byte budget (preview: {preview:?})")]
    LineTooLong { max_bytes: usize, preview: String },
}

impl From<serde_json::Error> for WireError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
