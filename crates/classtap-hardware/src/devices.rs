//! Enum wrapper for reader dispatch.
//!
//! Native `async fn` in traits (RPITIT) are not object-safe, so a
//! `Box<dyn ApduTransport>` is not available. [`AnyReader`] provides concrete
//! type dispatch instead, and gives real drivers a place to plug in behind
//! feature flags.

use std::time::Duration;

use classtap_core::RawIdentifier;

use crate::mock::MockReader;
use crate::traits::{ApduTransport, PresenceDetector};
use crate::{ReaderInfo, Result};

/// Enum wrapper for reader dispatch.
///
/// # Examples
///
/// ```
/// use classtap_hardware::devices::AnyReader;
/// use classtap_hardware::traits::ApduTransport;
/// use classtap_hardware::mock::MockReader;
///
/// #[tokio::main]
/// async fn main() -> classtap_hardware::Result<()> {
///     let (reader, _handle) = MockReader::new();
///     let any_reader = AnyReader::Mock(reader);
///
///     let info = any_reader.reader_info().await?;
///     println!("Reader: {}", info.name);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyReader {
    /// Mock reader for development and testing.
    Mock(MockReader),
}

impl PresenceDetector for AnyReader {
    async fn poll_target(&mut self, timeout: Duration) -> Result<Option<RawIdentifier>> {
        match self {
            Self::Mock(device) => device.poll_target(timeout).await,
        }
    }
}

impl ApduTransport for AnyReader {
    async fn exchange(
        &mut self,
        target: u8,
        command: &[u8],
        max_response_len: usize,
    ) -> Result<Vec<u8>> {
        match self {
            Self::Mock(device) => device.exchange(target, command, max_response_len).await,
        }
    }

    async fn release(&mut self, target: u8) -> Result<()> {
        match self {
            Self::Mock(device) => device.release(target).await,
        }
    }

    async fn reader_info(&self) -> Result<ReaderInfo> {
        match self {
            Self::Mock(device) => device.reader_info().await,
        }
    }
}
