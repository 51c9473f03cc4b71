use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Identifier errors
    #[error("Invalid hardware identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid custom identifier length: expected {expected} bytes, got {actual}")]
    InvalidCustomIdentifierLength { expected: usize, actual: usize },

    #[error("Invalid hex string: {0}")]
    InvalidHex(String),

    #[error("Invalid room ID: {0}")]
    InvalidRoomId(String),

    // Scan flow errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
