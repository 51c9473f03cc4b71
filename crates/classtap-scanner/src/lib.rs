//! Room-entry scanning for classtap.
//!
//! Ties the reader, the APDU exchange and the submission gateway together:
//!
//! - [`engine`]: SELECT/READ exchange with a detected target, always followed
//!   by a release
//! - [`resolver`]: custom identifier or hardware UID, plus the device class
//! - [`dedup`]: cooldown gate keyed on the hardware UID
//! - [`state`]: per-cycle state machine with a bounded transition history
//! - [`scanner`]: the scan loop
//! - [`clock`]: time source, real or hand-driven

pub mod clock;
pub mod dedup;
pub mod engine;
pub mod resolver;
pub mod scanner;
pub mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dedup::ScanDeduplicator;
pub use engine::{
    ExchangeOutcome, ExchangeStage, Fallback, perform_custom_identifier_exchange, release_target,
};
pub use resolver::{Resolution, resolve};
pub use scanner::{CycleOutcome, Delivery, ScanStats, Scanner, ScannerConfig};
pub use state::{ScanState, ScanStateMachine};
