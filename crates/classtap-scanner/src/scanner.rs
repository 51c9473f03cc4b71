//! The scan loop.
//!
//! One cycle polls the reader once. When a target is present the cycle runs
//! the exchange, resolves the identifier, checks the cooldown and submits the
//! accepted scan, all before the next poll:
//!
//! ```text
//! poll ──None──────────────────────────────────────────────┐
//!  │                                                       │
//!  └─Some(uid)─> exchange + release ─> resolve ─> dedup ───┤
//!                                                │         │
//!                                                └─> submit┤
//!                                                          v
//!                                        post-scan delay / idle interval
//! ```
//!
//! Nothing inside a cycle is fatal. Reader errors end the cycle as idle and
//! submission failures are logged; the loop keeps polling either way.

use std::future::Future;
use std::time::Duration;

use classtap_core::constants::{
    DEFAULT_IDLE_INTERVAL_MS, DEFAULT_POLL_TIMEOUT_MS, DEFAULT_POST_SCAN_DELAY_MS,
    DEFAULT_SCAN_COOLDOWN_SECS, MAX_POLL_TIMEOUT_MS,
};
use classtap_core::{DeviceClass, Error, ResolvedScan, Result, RoomId};
use classtap_hardware::NfcReader;
use classtap_network::{GatewayError, SubmissionGateway, SubmissionReceipt};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::dedup::ScanDeduplicator;
use crate::engine::perform_custom_identifier_exchange;
use crate::resolver::resolve;
use crate::state::{ScanState, ScanStateMachine};

/// Timing configuration for the scan loop.
///
/// # Example
///
/// ```
/// use classtap_scanner::ScannerConfig;
/// use std::time::Duration;
///
/// let config = ScannerConfig::default().with_cooldown(Duration::from_secs(5));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannerConfig {
    /// How long one presence poll may wait for a target
    pub poll_timeout: Duration,

    /// Pause at the end of every cycle
    pub idle_interval: Duration,

    /// Extra pause after a target was handled
    pub post_scan_delay: Duration,

    /// Window in which the same hardware UID is not submitted again
    pub cooldown: Duration,
}

impl ScannerConfig {
    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    pub fn with_idle_interval(mut self, idle_interval: Duration) -> Self {
        self.idle_interval = idle_interval;
        self
    }

    pub fn with_post_scan_delay(mut self, post_scan_delay: Duration) -> Self {
        self.post_scan_delay = post_scan_delay;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Check the configuration before the loop starts.
    ///
    /// # Errors
    /// Returns `Error::Config` if the poll timeout is zero or above one
    /// second, or the cooldown is zero.
    pub fn validate(&self) -> Result<()> {
        if self.poll_timeout.is_zero() {
            return Err(Error::Config("poll timeout must be non-zero".to_string()));
        }
        if self.poll_timeout > Duration::from_millis(MAX_POLL_TIMEOUT_MS) {
            return Err(Error::Config(format!(
                "poll timeout must be at most {MAX_POLL_TIMEOUT_MS}ms, got {}ms",
                self.poll_timeout.as_millis()
            )));
        }
        if self.cooldown.is_zero() {
            return Err(Error::Config("cooldown must be non-zero".to_string()));
        }
        Ok(())
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_millis(DEFAULT_POLL_TIMEOUT_MS),
            idle_interval: Duration::from_millis(DEFAULT_IDLE_INTERVAL_MS),
            post_scan_delay: Duration::from_millis(DEFAULT_POST_SCAN_DELAY_MS),
            cooldown: Duration::from_secs(DEFAULT_SCAN_COOLDOWN_SECS),
        }
    }
}

/// What happened to an accepted scan at the gateway.
#[derive(Debug)]
pub enum Delivery {
    /// Backend answered 200.
    Delivered(SubmissionReceipt),

    /// Backend answered with another status.
    Rejected(SubmissionReceipt),

    /// No response was obtained.
    Failed(GatewayError),
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered(_))
    }
}

/// Result of one scan cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    /// No target, or the reader failed to poll.
    Idle,

    /// Repeat tap within the cooldown; nothing submitted.
    Suppressed(ResolvedScan),

    Accepted {
        scan: ResolvedScan,
        delivery: Delivery,
    },
}

impl CycleOutcome {
    pub fn scan(&self) -> Option<&ResolvedScan> {
        match self {
            CycleOutcome::Idle => None,
            CycleOutcome::Suppressed(scan) | CycleOutcome::Accepted { scan, .. } => Some(scan),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, CycleOutcome::Idle)
    }
}

/// Running counters, logged when the loop stops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub cycles: u64,
    pub detections: u64,
    pub custom_identifiers: u64,
    pub fallbacks: u64,
    pub anomalies: u64,
    pub suppressed: u64,
    pub accepted: u64,
    pub delivered: u64,
    pub failed_submissions: u64,
}

/// Scan loop over a reader, a submission gateway and a clock.
///
/// # Examples
///
/// ```no_run
/// use classtap_core::RoomId;
/// use classtap_hardware::{AnyReader, mock::MockReader};
/// use classtap_network::{HttpGateway, HttpGatewayConfig};
/// use classtap_scanner::{Scanner, ScannerConfig, clock::SystemClock};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (reader, _handle) = MockReader::new();
/// let gateway = HttpGateway::new(HttpGatewayConfig::default())?;
/// let mut scanner = Scanner::new(
///     AnyReader::Mock(reader),
///     gateway,
///     SystemClock,
///     RoomId::new(12)?,
///     ScannerConfig::default(),
/// )?;
///
/// let stats = scanner.run_until(async { tokio::signal::ctrl_c().await.ok(); }).await;
/// println!("{} scans accepted", stats.accepted);
/// # Ok(())
/// # }
/// ```
pub struct Scanner<R, G, C = SystemClock> {
    reader: R,
    gateway: G,
    clock: C,
    room_id: RoomId,
    config: ScannerConfig,
    dedup: ScanDeduplicator,
    state: ScanStateMachine,
    stats: ScanStats,
}

impl<R, G, C> Scanner<R, G, C>
where
    R: NfcReader,
    G: SubmissionGateway,
    C: Clock,
{
    /// # Errors
    /// Returns `Error::Config` if the configuration does not validate.
    pub fn new(
        reader: R,
        gateway: G,
        clock: C,
        room_id: RoomId,
        config: ScannerConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            reader,
            gateway,
            clock,
            room_id,
            dedup: ScanDeduplicator::new(config.cooldown),
            config,
            state: ScanStateMachine::new(),
            stats: ScanStats::default(),
        })
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn dedup(&self) -> &ScanDeduplicator {
        &self.dedup
    }

    pub fn state_machine(&self) -> &ScanStateMachine {
        &self.state
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Run one poll and handle whatever it finds.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.stats.cycles += 1;

        let raw = match self.reader.poll_target(self.config.poll_timeout).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return CycleOutcome::Idle,
            Err(e) => {
                warn!("Presence poll failed: {}", e);
                return CycleOutcome::Idle;
            }
        };

        self.stats.detections += 1;
        debug!("Target {} detected", raw);
        self.advance(&[ScanState::TargetDetected, ScanState::ExchangeAttempt]);

        let outcome = perform_custom_identifier_exchange(&mut self.reader, &raw).await;
        self.advance(ScanState::exchange_path(&outcome));
        match outcome.custom_identifier() {
            Some(_) => self.stats.custom_identifiers += 1,
            None => {
                self.stats.fallbacks += 1;
                if outcome.is_anomaly() {
                    self.stats.anomalies += 1;
                }
            }
        }

        let now = self.clock.now();
        let seen_at = self.clock.instant();
        let resolution = resolve(&raw, outcome.custom_identifier());
        self.advance(&[ScanState::Resolved, ScanState::DedupCheck]);

        let key = raw.to_hex();
        let scan = resolution.into_scan(raw, self.room_id, now);

        if !self.dedup.should_accept(&key, seen_at) {
            debug!("Suppressed repeat of {} within cooldown", key);
            self.stats.suppressed += 1;
            self.advance(&[ScanState::Suppressed, ScanState::Idle]);
            return CycleOutcome::Suppressed(scan);
        }

        self.dedup.record(&key, seen_at);
        self.stats.accepted += 1;
        self.advance(&[ScanState::Accepted]);
        match scan.device_class {
            DeviceClass::CustomBroadcast => info!(
                "{} scanned: {} (hardware id {}), room {}",
                scan.device_class, scan.identifier, scan.hardware_id, self.room_id
            ),
            DeviceClass::PhysicalTag => info!(
                "{} scanned: {}, room {}",
                scan.device_class, scan.identifier, self.room_id
            ),
        }

        self.advance(&[ScanState::Submit]);
        let delivery = match self.gateway.submit(&scan.identifier, self.room_id).await {
            Ok(receipt) if receipt.is_delivered() => {
                self.stats.delivered += 1;
                Delivery::Delivered(receipt)
            }
            Ok(receipt) => {
                self.stats.failed_submissions += 1;
                Delivery::Rejected(receipt)
            }
            Err(e) => {
                // The gateway reports its own failures
                debug!("Submission of {} failed: {}", scan.identifier, e);
                self.stats.failed_submissions += 1;
                Delivery::Failed(e)
            }
        };
        self.advance(&[ScanState::Idle]);

        CycleOutcome::Accepted { scan, delivery }
    }

    /// Run cycles until `shutdown` resolves.
    ///
    /// Shutdown is observed between cycles, so an in-flight cycle always
    /// completes.
    pub async fn run_until<F>(&mut self, shutdown: F) -> ScanStats
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(
            "Scanning for room {} (cooldown {}s)",
            self.room_id,
            self.config.cooldown.as_secs_f32()
        );

        loop {
            let outcome = self.run_cycle().await;

            let pause = if outcome.is_idle() {
                self.config.idle_interval
            } else {
                self.config.post_scan_delay + self.config.idle_interval
            };

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = self.clock.sleep(pause) => {}
            }
        }

        info!(
            "Scanner stopped after {} cycles: {} accepted, {} suppressed, {} delivered, {} failed",
            self.stats.cycles,
            self.stats.accepted,
            self.stats.suppressed,
            self.stats.delivered,
            self.stats.failed_submissions
        );
        self.stats.clone()
    }

    fn advance(&mut self, states: &[ScanState]) {
        if let Err(e) = self.state.walk(states) {
            error!("{}; resetting scan state", e);
            self.state.reset();
        }
    }
}
