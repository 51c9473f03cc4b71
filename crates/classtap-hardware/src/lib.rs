//! Reader abstraction layer for the classtap room-entry scanner.
//!
//! This crate provides trait-based abstractions for the contactless reader
//! the scanner polls. The traits enable easy substitution between the mock
//! implementation (for development and testing) and real reader drivers.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All I/O operations are asynchronous using native `async fn`
//!   in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Thread-safe**: All traits require `Send + Sync` for use with Tokio.
//! - **Error-aware**: All operations return `Result<T>` with detailed error information.
//!
//! # Reader Traits
//!
//! A reader is used in two halves during a scan cycle:
//!
//! ```no_run
//! use classtap_hardware::traits::{ApduTransport, PresenceDetector};
//! use classtap_hardware::error::Result;
//! use std::time::Duration;
//!
//! async fn probe<R: PresenceDetector + ApduTransport>(reader: &mut R) -> Result<()> {
//!     if let Some(uid) = reader.poll_target(Duration::from_millis(500)).await? {
//!         println!("Target {uid} in field");
//!         let response = reader.exchange(1, &[0x00, 0xA4, 0x04, 0x00], 255).await;
//!         println!("Response: {response:?}");
//!         reader.release(1).await.ok();
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`][error::Result] which uses the
//! [`HardwareError`] error type. A failed exchange is a normal outcome for
//! targets that do not speak ISO 7816-4 and callers decide how to treat it.
//!
//! # Mock Implementations
//!
//! [`mock::MockReader`] simulates physical tags, HCE phones and scripted
//! targets, and records the commands and releases it received.

pub mod devices;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::AnyReader;
pub use error::{HardwareError, Result};
pub use traits::{ApduTransport, NfcReader, PresenceDetector};
pub use types::ReaderInfo;
