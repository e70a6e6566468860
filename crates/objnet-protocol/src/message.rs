use objnet_types::{NetworkObject, ObjectId};
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};

/// Longest accepted `text` payload, in UTF-16 code units.
pub const MAX_TEXT_LEN: usize = 20;

/// Default cap on a single unterminated line.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// All message types in the objnet protocol.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    /// Sent once by each side when the connection opens.
    Hello { agent: String },
    Text { text: String },
    GetObject { objectid: ObjectId },
    Object { object: NetworkObject },
    /// Diagnostic for a protocol violation. Accepted leniently on receipt.
    Error {
        #[serde(default)]
        description: String,
    },
}

impl Message {
    pub fn hello(agent: impl Into<String>) -> Self {
        Self::Hello { agent: agent.into() }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self::Error {
            description: description.into(),
        }
    }

    pub fn get_object(objectid: ObjectId) -> Self {
        Self::GetObject { objectid }
    }

    pub fn object(object: NetworkObject) -> Self {
        Self::Object { object }
    }

    /// The wire `type` tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Hello { .. } => "hello",
            Self::Text { .. } => "text",
            Self::GetObject { .. } => "getobject",
            Self::Object { .. } => "object",
            Self::Error { .. } => "error",
        }
    }

    /// Constraints serde cannot express.
    pub fn validate(&self) -> ProtocolResult<()> {
        if let Self::Text { text } = self {
            let len = text.encode_utf16().count();
            if len > MAX_TEXT_LEN {
                return Err(ProtocolError::TextTooLong {
                    len,
                    max: MAX_TEXT_LEN,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tags_match_wire_names() {
        let cases = [
            (Message::hello("a"), "hello"),
            (Message::Text { text: "t".into() }, "text"),
            (Message::get_object(ObjectId::null()), "getobject"),
            (Message::object(NetworkObject::leaf("o")), "object"),
            (Message::error("e"), "error"),
        ];
        for (msg, tag) in cases {
            let value = serde_json::to_value(&msg).unwrap();
            assert_eq!(value["type"], tag);
            assert_eq!(msg.type_name(), tag);
        }
    }

    #[test]
    fn getobject_carries_hex_id() {
        let id = ObjectId::from_bytes(b"x");
        let value = serde_json::to_value(Message::get_object(id)).unwrap();
        assert_eq!(value, json!({"type": "getobject", "objectid": id.to_hex()}));
    }

    #[test]
    fn object_message_shape() {
        let value = serde_json::to_value(Message::object(NetworkObject::leaf("alpha"))).unwrap();
        assert_eq!(
            value,
            json!({"type": "object", "object": {"name": "alpha", "deps": []}})
        );
    }

    #[test]
    fn text_at_limit_is_valid() {
        let msg = Message::Text { text: "x".repeat(MAX_TEXT_LEN) };
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn text_over_limit_is_rejected() {
        let msg = Message::Text { text: "x".repeat(MAX_TEXT_LEN + 1) };
        assert!(matches!(
            msg.validate(),
            Err(ProtocolError::TextTooLong { len: 21, max: 20 })
        ));
    }

    #[test]
    fn text_limit_counts_characters_not_bytes() {
        let msg = Message::Text { text: "é".repeat(MAX_TEXT_LEN) };
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn text_limit_counts_surrogate_pairs_twice() {
        let at_limit = Message::Text { text: "😀".repeat(MAX_TEXT_LEN / 2) };
        assert!(at_limit.validate().is_ok());

        let over = Message::Text { text: "😀".repeat(MAX_TEXT_LEN / 2 + 1) };
        assert!(matches!(
            over.validate(),
            Err(ProtocolError::TextTooLong { len: 22, max: 20 })
        ));
    }

    #[test]
    fn error_without_description_is_accepted() {
        let msg: Message = serde_json::from_value(json!({"type": "error"})).unwrap();
        assert_eq!(msg, Message::error(""));
    }
}
