use thiserror::Error;

use crate::StatusWord;

/// Ways a response from the target can fail to carry a usable payload.
///
/// Every variant keeps the raw response bytes as upper-case hex so the
/// anomaly can be logged verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApduError {
    #[error("Response too short ({length} bytes): {raw}")]
    ResponseTooShort { length: usize, raw: String },

    #[error("Reader reported transport status {status:#04X}: {raw}")]
    TransportStatus { status: u8, raw: String },

    #[error("Target returned status {status}: {raw}")]
    StatusWord { status: StatusWord, raw: String },

    #[error("Expected {expected} payload bytes, got {actual}: {raw}")]
    UnexpectedPayloadLength {
        expected: usize,
        actual: usize,
        raw: String,
    },

    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

impl ApduError {
    /// Raw response hex, when the error came from a response.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::ResponseTooShort { raw, .. }
            | Self::TransportStatus { raw, .. }
            | Self::StatusWord { raw, .. }
            | Self::UnexpectedPayloadLength { raw, .. } => Some(raw),
            Self::InvalidCommand(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApduError>;
