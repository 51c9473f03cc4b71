//! Custom-identifier exchange with a detected target.
//!
//! The engine probes the target with SELECT for the room-entry application and
//! then READ for the seven-byte identifier. Each step yields an explicit
//! [`StepResult`]; the first step that does not succeed decides the
//! [`Fallback`]. The target is released exactly once before the engine returns,
//! whatever the outcome.
//!
//! ```text
//! SELECT ──Ok──> READ ──Ok──> payload == 7 bytes ──> Custom
//!   │              │                  │
//!   └──────────────┴──────────────────┴──> Fallback (Unsupported | Anomaly)
//! ```
//!
//! A transport error is how a plain tag answers an application command, so
//! [`Fallback::Unsupported`] is logged at debug level. Status failures and
//! malformed payloads come from a target that did take part in the protocol,
//! so [`Fallback::Anomaly`] is logged as a warning with the raw response.

use std::fmt;

use classtap_core::constants::{MAX_RESPONSE_LENGTH, TARGET_INDEX};
use classtap_core::{CustomIdentifier, RawIdentifier};
use classtap_hardware::{ApduTransport, HardwareError};
use classtap_protocol::{ApduCommand, ApduError, ApduResponse};
use tracing::{debug, trace, warn};

/// Command of the exchange a step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExchangeStage {
    Select,
    Read,
}

impl fmt::Display for ExchangeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeStage::Select => f.write_str("SELECT"),
            ExchangeStage::Read => f.write_str("READ"),
        }
    }
}

/// Result of sending one command.
#[derive(Debug)]
pub enum StepResult {
    /// Both status layers succeeded.
    Success(ApduResponse),

    /// The reader could not carry the command to the target.
    TransportFailure(HardwareError),

    /// The target answered, but the envelope failed validation.
    ProtocolAnomaly(ApduError),
}

impl StepResult {
    fn into_response(self, stage: ExchangeStage) -> Result<ApduResponse, Fallback> {
        match self {
            StepResult::Success(response) => Ok(response),
            StepResult::TransportFailure(error) => Err(Fallback::Unsupported { stage, error }),
            StepResult::ProtocolAnomaly(error) => Err(Fallback::Anomaly { stage, error }),
        }
    }
}

/// Why the exchange did not produce a custom identifier.
#[derive(Debug)]
pub enum Fallback {
    /// Transport failure; the normal answer of a physical tag.
    Unsupported {
        stage: ExchangeStage,
        error: HardwareError,
    },

    /// Status byte, status word or payload length failure.
    Anomaly {
        stage: ExchangeStage,
        error: ApduError,
    },
}

impl Fallback {
    pub fn stage(&self) -> ExchangeStage {
        match self {
            Fallback::Unsupported { stage, .. } | Fallback::Anomaly { stage, .. } => *stage,
        }
    }

    pub fn is_anomaly(&self) -> bool {
        matches!(self, Fallback::Anomaly { .. })
    }

    /// Whether the READ envelope was valid and only the payload length failed.
    pub fn read_succeeded(&self) -> bool {
        matches!(
            self,
            Fallback::Anomaly {
                stage: ExchangeStage::Read,
                error: ApduError::UnexpectedPayloadLength { .. },
            }
        )
    }
}

/// Folded result of the whole exchange.
#[derive(Debug)]
pub enum ExchangeOutcome {
    Custom(CustomIdentifier),
    Fallback(Fallback),
}

impl ExchangeOutcome {
    pub fn custom_identifier(&self) -> Option<&CustomIdentifier> {
        match self {
            ExchangeOutcome::Custom(id) => Some(id),
            ExchangeOutcome::Fallback(_) => None,
        }
    }

    pub fn fallback(&self) -> Option<&Fallback> {
        match self {
            ExchangeOutcome::Custom(_) => None,
            ExchangeOutcome::Fallback(fallback) => Some(fallback),
        }
    }

    pub fn is_anomaly(&self) -> bool {
        self.fallback().is_some_and(Fallback::is_anomaly)
    }
}

/// Send one command to the target and classify the result.
pub async fn exchange_step<T: ApduTransport>(
    transport: &mut T,
    command: &ApduCommand,
) -> StepResult {
    let encoded = command.encode();
    trace!("{} >> {:02X?}", command.name(), encoded.as_ref());

    match transport
        .exchange(TARGET_INDEX, &encoded, MAX_RESPONSE_LENGTH)
        .await
    {
        Err(error) => StepResult::TransportFailure(error),
        Ok(raw) => match ApduResponse::parse(&raw) {
            Ok(response) => StepResult::Success(response),
            Err(error) => StepResult::ProtocolAnomaly(error),
        },
    }
}

/// Release the target, ignoring any failure.
pub async fn release_target<T: ApduTransport>(transport: &mut T, target: u8) {
    if let Err(e) = transport.release(target).await {
        debug!("Release of target {} failed: {}", target, e);
    }
}

async fn run_exchange<T: ApduTransport>(transport: &mut T) -> Result<CustomIdentifier, Fallback> {
    exchange_step(transport, &ApduCommand::select_room_entry())
        .await
        .into_response(ExchangeStage::Select)?;

    let response = exchange_step(transport, &ApduCommand::read_custom_identifier())
        .await
        .into_response(ExchangeStage::Read)?;

    response
        .custom_identifier()
        .map_err(|error| Fallback::Anomaly {
            stage: ExchangeStage::Read,
            error,
        })
}

/// Try to read a custom identifier from the target detected as `raw`.
///
/// Never fails: every failure becomes an [`ExchangeOutcome::Fallback`]. The
/// target is released exactly once before returning.
///
/// # Examples
///
/// ```
/// use classtap_core::{CustomIdentifier, RawIdentifier};
/// use classtap_hardware::mock::{MockReader, MockTarget};
/// use classtap_hardware::PresenceDetector;
/// use classtap_scanner::engine::perform_custom_identifier_exchange;
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let (mut reader, handle) = MockReader::new();
/// let uid = RawIdentifier::from_hex("04A1B2C3").unwrap();
/// let custom = CustomIdentifier::new([0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77]);
/// handle.present(MockTarget::hce_phone(uid.clone(), custom)).await.unwrap();
///
/// reader.poll_target(Duration::from_millis(10)).await.unwrap();
/// let outcome = perform_custom_identifier_exchange(&mut reader, &uid).await;
/// assert_eq!(outcome.custom_identifier(), Some(&custom));
/// assert_eq!(handle.release_count(), 1);
/// # }
/// ```
pub async fn perform_custom_identifier_exchange<T: ApduTransport>(
    transport: &mut T,
    raw: &RawIdentifier,
) -> ExchangeOutcome {
    let outcome = match run_exchange(transport).await {
        Ok(id) => {
            debug!("Read custom identifier {} from {}", id, raw);
            ExchangeOutcome::Custom(id)
        }
        Err(fallback) => {
            match &fallback {
                Fallback::Unsupported { stage, error } => {
                    debug!(
                        "{} does not support {} ({}), using hardware id",
                        raw, stage, error
                    );
                }
                Fallback::Anomaly { stage, error } => {
                    warn!("Protocol anomaly from {} during {}: {}", raw, stage, error);
                }
            }
            ExchangeOutcome::Fallback(fallback)
        }
    };

    release_target(transport, TARGET_INDEX).await;
    outcome
}
