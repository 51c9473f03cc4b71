//! Taps read from text lines, for running without a reader attached.
//!
//! One tap per line, hex with optional `:`/`-` separators:
//!
//! ```text
//! 04A1B2C3                  # physical tag
//! 04A1B2C3=11223344556677   # phone broadcasting a custom identifier
//! ```
//!
//! Blank lines and `#` comments are ignored.

use classtap_core::{CustomIdentifier, RawIdentifier, Result};
use classtap_hardware::mock::{MockReaderHandle, MockTarget};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedTap {
    pub uid: RawIdentifier,
    pub custom: Option<CustomIdentifier>,
}

impl SimulatedTap {
    pub fn into_target(self) -> MockTarget {
        match self.custom {
            Some(custom) => MockTarget::hce_phone(self.uid, custom),
            None => MockTarget::physical_tag(self.uid),
        }
    }
}

/// Parse one input line; `Ok(None)` for blank lines and comments.
pub fn parse_tap(line: &str) -> Result<Option<SimulatedTap>> {
    let line = match line.split_once('#') {
        Some((before, _)) => before,
        None => line,
    }
    .trim();

    if line.is_empty() {
        return Ok(None);
    }

    let tap = match line.split_once('=') {
        Some((uid, custom)) => SimulatedTap {
            uid: uid.parse()?,
            custom: Some(custom.parse()?),
        },
        None => SimulatedTap {
            uid: line.parse()?,
            custom: None,
        },
    };
    Ok(Some(tap))
}

/// Present every tap read from `input` to the mock reader.
///
/// Returns the number of taps presented once `input` is exhausted.
/// Malformed lines are logged and skipped.
///
/// # Errors
/// Returns an I/O error from `input`.
pub async fn feed_taps<R>(input: R, handle: MockReaderHandle) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut presented = 0;

    while let Some(line) = lines.next_line().await? {
        match parse_tap(&line) {
            Ok(Some(tap)) => {
                debug!("Simulated tap {:?}", tap);
                if let Err(e) = handle.present(tap.into_target()).await {
                    warn!("Reader gone, stopping simulation: {}", e);
                    break;
                }
                presented += 1;
            }
            Ok(None) => {}
            Err(e) => warn!("Skipping line {:?}: {}", line, e),
        }
    }

    info!("Simulation input closed after {} taps", presented);
    Ok(presented)
}
