use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("could not parse message as JSON: {0}")]
    Parse(String),

    #[error("unknown protocol message: {0}")]
    InvalidMessage(String),

    #[error("text message longer than {max} characters ({len})")]
    TextTooLong { len: usize, max: usize },

    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("encoding error: {0}")]
    Encoding(#[from] objnet_types::TypeError),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
