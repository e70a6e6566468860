//! Wire protocol for objnet.
//!
//! Messages are single-line canonical JSON values terminated by `\n`,
//! discriminated by their `type` field. This crate defines the message set,
//! the inbound schema checks, and the framer that cuts a byte stream into
//! lines.

pub mod codec;
pub mod error;
pub mod message;

pub use codec::{LineFramer, MessageCodec};
pub use error::{ProtocolError, ProtocolResult};
pub use message::{Message, MAX_MESSAGE_SIZE, MAX_TEXT_LEN};
