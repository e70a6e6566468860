use bytes::BytesMut;
use objnet_types::to_canonical_string;
use serde_json::Value;
use tracing::trace;

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::Message;

/// Codec for encoding/decoding single protocol lines.
pub struct MessageCodec;

impl MessageCodec {
    /// Encode a message as canonical JSON followed by `\n`.
    pub fn encode(msg: &Message) -> ProtocolResult<Vec<u8>> {
        let mut line = to_canonical_string(msg)?;
        line.push('\n');
        Ok(line.into_bytes())
    }

    /// Decode one framed line (without its terminator).
    ///
    /// Distinguishes text that is not JSON at all ([`ProtocolError::Parse`])
    /// from JSON that does not match the message schema
    /// ([`ProtocolError::InvalidMessage`], [`ProtocolError::TextTooLong`]).
    pub fn decode(line: &str) -> ProtocolResult<Message> {
        let value: Value =
            serde_json::from_str(line).map_err(|e| ProtocolError::Parse(e.to_string()))?;
        let msg: Message = serde_json::from_value(value)
            .map_err(|e| ProtocolError::InvalidMessage(e.to_string()))?;
        msg.validate()?;
        Ok(msg)
    }
}

/// Cuts a byte stream into trimmed, non-empty `\n`-terminated lines.
///
/// Bytes after the last newline stay buffered until the next
/// [`push`](Self::push). A line that grows past `max_line` bytes without a
/// terminator is reported once as [`ProtocolError::MessageTooLarge`] and the
/// rest of it, up to the next newline, is discarded.
#[derive(Debug)]
pub struct LineFramer {
    buf: BytesMut,
    max_line: usize,
    discarding: bool,
}

impl LineFramer {
    pub fn new(max_line: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max_line,
            discarding: false,
        }
    }

    /// Append `data` and return every line it completed, in order.
    pub fn push(&mut self, data: &[u8]) -> Vec<ProtocolResult<String>> {
        self.buf.extend_from_slice(data);
        let mut lines = Vec::new();

        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let raw = self.buf.split_to(pos + 1);
            if self.discarding {
                self.discarding = false;
                continue;
            }
            match std::str::from_utf8(&raw[..pos]) {
                Ok(text) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        lines.push(Ok(text.to_string()));
                    }
                }
                Err(e) => lines.push(Err(ProtocolError::Parse(e.to_string()))),
            }
        }

        if self.buf.len() > self.max_line {
            let size = self.buf.len();
            self.buf.clear();
            if !self.discarding {
                self.discarding = true;
                lines.push(Err(ProtocolError::MessageTooLarge {
                    size,
                    max: self.max_line,
                }));
            }
        }

        trace!(lines = lines.len(), buffered = self.buf.len(), "framed input");
        lines
    }

    /// Bytes held for an incomplete line.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }
}
