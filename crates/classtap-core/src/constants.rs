//! Core constants for the room-entry scanner.
//!
//! This module defines the protocol-level and timing constants shared by the
//! scanner crates. Keeping them in one place guarantees that the reader side
//! and the phone application agree on the same AID and command layout.
//!
//! # APDU Exchange
//!
//! A detected target is probed with two ISO 7816-4 commands:
//!
//! ```text
//! SELECT:  00 A4 04 00 07 F0 01 02 03 04 05 06
//! READ:    00 B0 00 00 07
//! ```
//!
//! and every reader response is wrapped in the transport envelope:
//!
//! ```text
//! [transport status] [payload ...] [SW1] [SW2]
//! ```
//!
//! # Usage
//!
//! ```
//! use classtap_core::constants::*;
//!
//! assert_eq!(ROOM_ENTRY_AID.len(), CUSTOM_IDENTIFIER_LENGTH);
//! assert_eq!(SW_SUCCESS, 0x9000);
//!
//! use std::time::Duration;
//! let cooldown = Duration::from_secs(DEFAULT_SCAN_COOLDOWN_SECS);
//! assert_eq!(cooldown.as_secs(), 3);
//! ```

// ============================================================================
// Application Identifier
// ============================================================================

/// Application identifier of the room-entry HCE service.
///
/// Must match the AID registered by the phone application; any other
/// application on the target will answer the SELECT with `6A 82`.
pub const ROOM_ENTRY_AID: [u8; 7] = [0xF0, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06];

/// Length in bytes of the identifier broadcast by the HCE service.
pub const CUSTOM_IDENTIFIER_LENGTH: usize = 7;

// ============================================================================
// APDU Command Bytes
// ============================================================================

/// Interindustry class byte used by both commands.
pub const CLA_ISO: u8 = 0x00;

/// SELECT instruction.
pub const INS_SELECT: u8 = 0xA4;

/// READ BINARY instruction.
pub const INS_READ_BINARY: u8 = 0xB0;

/// SELECT P1: select by DF name (AID).
pub const P1_SELECT_BY_NAME: u8 = 0x04;

/// SELECT P2: first or only occurrence.
pub const P2_FIRST_OCCURRENCE: u8 = 0x00;

/// Number of bytes requested by the READ command (Le).
pub const READ_LENGTH: u8 = CUSTOM_IDENTIFIER_LENGTH as u8;

// ============================================================================
// Response Envelope
// ============================================================================

/// Transport status byte reported by the reader for a successful exchange.
pub const TRANSPORT_STATUS_OK: u8 = 0x00;

/// APDU status word for a successful command.
pub const SW_SUCCESS: u16 = 0x9000;

/// APDU status word returned when the selected application does not exist.
pub const SW_FILE_NOT_FOUND: u16 = 0x6A82;

/// Smallest valid response: transport status plus a 2-byte status word.
pub const MIN_RESPONSE_LENGTH: usize = 3;

// ============================================================================
// Reader Transport
// ============================================================================

/// Logical target number used for every exchange (the reader tracks one target).
pub const TARGET_INDEX: u8 = 0x01;

/// Maximum number of response bytes requested from the reader per exchange.
pub const MAX_RESPONSE_LENGTH: usize = 255;

/// Minimum hardware UID length in bytes (ISO 14443 single size).
pub const MIN_UID_LENGTH: usize = 4;

/// Maximum hardware UID length in bytes (ISO 14443 triple size).
pub const MAX_UID_LENGTH: usize = 10;

// ============================================================================
// Scan Loop Timing
// ============================================================================

/// Seconds during which the same hardware UID is not submitted again.
pub const DEFAULT_SCAN_COOLDOWN_SECS: u64 = 3;

/// Presence poll timeout in milliseconds.
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 500;

/// Upper bound for the poll timeout; longer polls delay shutdown and repeat taps.
pub const MAX_POLL_TIMEOUT_MS: u64 = 1000;

/// Pause at the end of every poll cycle in milliseconds.
pub const DEFAULT_IDLE_INTERVAL_MS: u64 = 100;

/// Extra pause after a detected target has been handled, in milliseconds.
pub const DEFAULT_POST_SCAN_DELAY_MS: u64 = 500;

// ============================================================================
// Submission
// ============================================================================

/// Default API base URL for entry-request submission.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";

/// Path of the entry-request endpoint, relative to the base URL.
pub const ROOM_ENTRY_REQUEST_PATH: &str = "/api/RoomEntryRequest/CreateRequest";

/// Submission timeout in milliseconds.
pub const DEFAULT_SUBMIT_TIMEOUT_MS: u64 = 5000;
