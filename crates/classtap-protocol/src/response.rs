//! Parsing of the reader's response envelope.
//!
//! The reader wraps every target response as `[transport status][payload][SW1 SW2]`.
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. fewer than three bytes
//! 2. transport status byte not `0x00`
//! 3. status word not `90 00`
//!
//! The payload length is not checked here; READ callers apply it through
//! [`ApduResponse::custom_identifier`].

use classtap_core::constants::{CUSTOM_IDENTIFIER_LENGTH, MIN_RESPONSE_LENGTH, TRANSPORT_STATUS_OK};
use classtap_core::{CustomIdentifier, to_hex_upper};

use crate::StatusWord;
use crate::error::{ApduError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduResponse {
    payload: Vec<u8>,
    status: StatusWord,
    raw: Vec<u8>,
}

impl ApduResponse {
    /// Validate a raw reader response and split it into payload and status.
    ///
    /// # Example
    /// ```
    /// use classtap_protocol::ApduResponse;
    ///
    /// let response = ApduResponse::parse(&[0x00, 0xAB, 0xCD, 0x90, 0x00]).unwrap();
    /// assert_eq!(response.payload(), &[0xAB, 0xCD]);
    /// assert!(response.status().is_success());
    /// ```
    ///
    /// # Errors
    /// Returns the first envelope check that fails, carrying the raw bytes as hex.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() < MIN_RESPONSE_LENGTH {
            return Err(ApduError::ResponseTooShort {
                length: raw.len(),
                raw: to_hex_upper(raw),
            });
        }

        if raw[0] != TRANSPORT_STATUS_OK {
            return Err(ApduError::TransportStatus {
                status: raw[0],
                raw: to_hex_upper(raw),
            });
        }

        let sw_offset = raw.len() - 2;
        let status = StatusWord::new(raw[sw_offset], raw[sw_offset + 1]);
        if !status.is_success() {
            return Err(ApduError::StatusWord {
                status,
                raw: to_hex_upper(raw),
            });
        }

        Ok(ApduResponse {
            payload: raw[1..sw_offset].to_vec(),
            status,
            raw: raw.to_vec(),
        })
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn status(&self) -> StatusWord {
        self.status
    }

    /// Full response as received, including transport status and status word.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Interpret the payload as a custom identifier.
    ///
    /// # Errors
    /// Returns [`ApduError::UnexpectedPayloadLength`] unless the payload is
    /// exactly seven bytes.
    pub fn custom_identifier(&self) -> Result<CustomIdentifier> {
        CustomIdentifier::try_from(self.payload.as_slice()).map_err(|_| {
            ApduError::UnexpectedPayloadLength {
                expected: CUSTOM_IDENTIFIER_LENGTH,
                actual: self.payload.len(),
                raw: to_hex_upper(&self.raw),
            }
        })
    }
}

/// Parse a READ response straight into a custom identifier.
///
/// # Errors
/// Returns any envelope failure from [`ApduResponse::parse`], then a payload
/// length failure.
pub fn parse_custom_identifier(raw: &[u8]) -> Result<CustomIdentifier> {
    ApduResponse::parse(raw)?.custom_identifier()
}
