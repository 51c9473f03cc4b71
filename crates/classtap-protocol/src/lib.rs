//! APDU command encoding and response parsing for the room-entry exchange.
//!
//! The scanner sends two commands to a target: a SELECT for the room-entry
//! application and a READ for the seven-byte custom identifier. This crate
//! builds those commands and validates the envelope the reader returns.

pub mod command;
pub mod error;
pub mod response;
pub mod status;

pub use command::ApduCommand;
pub use error::{ApduError, Result};
pub use response::{ApduResponse, parse_custom_identifier};
pub use status::StatusWord;
