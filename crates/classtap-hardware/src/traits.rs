//! Reader trait definitions.
//!
//! This module defines the contract between the scanner core and a
//! contactless reader. The reader side is split the way the scan cycle uses
//! it: a [`PresenceDetector`] that reports whether a target is in the field,
//! and an [`ApduTransport`] that exchanges raw commands with that target and
//! releases it afterwards.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use std::time::Duration;

use classtap_core::RawIdentifier;

use crate::error::Result;
use crate::types::ReaderInfo;

/// Target presence detection.
///
/// # Examples
///
/// ```no_run
/// use classtap_hardware::traits::PresenceDetector;
/// use classtap_hardware::error::Result;
/// use std::time::Duration;
///
/// async fn wait_for_uid<D: PresenceDetector>(reader: &mut D) -> Result<String> {
///     loop {
///         if let Some(uid) = reader.poll_target(Duration::from_millis(500)).await? {
///             return Ok(uid.to_hex());
///         }
///     }
/// }
/// ```
pub trait PresenceDetector: Send + Sync {
    /// Poll the field for a target.
    ///
    /// Returns `Ok(None)` when no target appeared within `timeout`. Must not
    /// block longer than `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader is disconnected or the poll command
    /// itself fails.
    async fn poll_target(&mut self, timeout: Duration) -> Result<Option<RawIdentifier>>;
}

/// Raw command exchange with the target found by the last poll.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. For dynamic dispatch, use
/// [`AnyReader`](crate::devices::AnyReader).
pub trait ApduTransport: Send + Sync {
    /// Send `command` to the logical target `target` and return the reader's
    /// response, at most `max_response_len` bytes.
    ///
    /// The response starts with the reader's transport status byte, followed
    /// by whatever the target answered.
    ///
    /// # Errors
    ///
    /// Returns an error when the reader cannot complete the exchange. This
    /// is what a physical tag that does not speak ISO 7816-4 produces, so
    /// callers should not treat it as a reader fault.
    async fn exchange(
        &mut self,
        target: u8,
        command: &[u8],
        max_response_len: usize,
    ) -> Result<Vec<u8>>;

    /// Release the target so the reader returns to idle for the next poll.
    ///
    /// # Errors
    ///
    /// Returns an error if the release command fails. Callers treat this as
    /// best effort.
    async fn release(&mut self, target: u8) -> Result<()>;

    /// Get reader information.
    ///
    /// # Errors
    ///
    /// Returns an error if a communication error occurs while querying
    /// reader information.
    async fn reader_info(&self) -> Result<ReaderInfo>;
}

/// A complete contactless reader: presence detection plus command exchange.
///
/// Implemented automatically for every type providing both halves.
pub trait NfcReader: PresenceDetector + ApduTransport {}

impl<T: PresenceDetector + ApduTransport> NfcReader for T {}
