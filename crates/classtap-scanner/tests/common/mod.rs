//! Common test utilities for scanner integration tests.
//!
//! - `reader_with_target` puts a target in the field and polls it, leaving the
//!   reader ready for an exchange
//! - `RecordingGateway` stands in for the backend and records every submission
//! - `test_data` holds the identifiers used across the flow tests
//! - `LogCapture` collects formatted log lines so tests can check levels

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use classtap_core::{CustomIdentifier, RawIdentifier, RoomId};
use classtap_hardware::PresenceDetector;
use classtap_hardware::mock::{MockReader, MockReaderHandle, MockTarget};
use classtap_network::{GatewayError, SubmissionGateway, SubmissionReceipt};
use classtap_scanner::{ManualClock, Scanner, ScannerConfig};

pub mod test_data {
    /// Hardware UID used by most tests
    pub const UID: &str = "04A1B2C3";

    /// Second, unrelated hardware UID
    pub const OTHER_UID: &str = "04D5E6F7A8B9C0";

    /// Custom identifier broadcast by the test phone
    pub const CUSTOM: [u8; 7] = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77];

    pub const CUSTOM_HEX: &str = "11223344556677";

    pub const ROOM: i32 = 12;
}

pub fn uid() -> RawIdentifier {
    RawIdentifier::from_hex(test_data::UID).unwrap()
}

pub fn other_uid() -> RawIdentifier {
    RawIdentifier::from_hex(test_data::OTHER_UID).unwrap()
}

pub fn custom() -> CustomIdentifier {
    CustomIdentifier::new(test_data::CUSTOM)
}

pub fn room() -> RoomId {
    RoomId::new(test_data::ROOM).unwrap()
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 5, 8, 0, 0).unwrap()
}

/// Present `target` and poll it, so the reader holds it as the current target.
pub async fn reader_with_target(target: MockTarget) -> (MockReader, MockReaderHandle) {
    let (mut reader, handle) = MockReader::new();
    handle.present(target).await.unwrap();
    let polled = reader.poll_target(Duration::from_millis(10)).await.unwrap();
    assert!(polled.is_some(), "target was not detected");
    (reader, handle)
}

/// How the recording gateway answers.
#[derive(Debug, Clone, Copy, Default)]
pub enum GatewayMode {
    #[default]
    Accept,
    Status(u16),
    Unreachable,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingGateway {
    mode: GatewayMode,
    submissions: Arc<Mutex<Vec<(String, RoomId)>>>,
}

impl RecordingGateway {
    pub fn new(mode: GatewayMode) -> Self {
        Self {
            mode,
            submissions: Arc::default(),
        }
    }

    pub fn submissions(&self) -> Vec<(String, RoomId)> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn submitted_identifiers(&self) -> Vec<String> {
        self.submissions().into_iter().map(|(id, _)| id).collect()
    }
}

impl SubmissionGateway for RecordingGateway {
    async fn submit(
        &self,
        identifier: &str,
        room_id: RoomId,
    ) -> Result<SubmissionReceipt, GatewayError> {
        self.submissions
            .lock()
            .unwrap()
            .push((identifier.to_string(), room_id));

        match self.mode {
            GatewayMode::Accept => Ok(SubmissionReceipt {
                status_code: 200,
                body: String::new(),
            }),
            GatewayMode::Status(status_code) => Ok(SubmissionReceipt {
                status_code,
                body: "rejected".to_string(),
            }),
            GatewayMode::Unreachable => {
                Err(GatewayError::Request("connection refused".to_string()))
            }
        }
    }
}

/// Collects formatted log output from the current thread.
#[derive(Debug, Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Route this thread's events into the capture until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_target(false)
            .without_time()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Captured lines logged at `level` (`"WARN"`, `"DEBUG"`, ...).
    pub fn lines_at(&self, level: &str) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter(|line| line.trim_start().starts_with(level))
            .map(str::to_string)
            .collect()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub type TestScanner = Scanner<MockReader, RecordingGateway, ManualClock>;

/// Scanner over a fresh mock reader, with handles for driving it.
pub fn scanner(
    mode: GatewayMode,
) -> (TestScanner, MockReaderHandle, RecordingGateway, ManualClock) {
    let (reader, handle) = MockReader::new();
    let gateway = RecordingGateway::new(mode);
    let clock = ManualClock::new(start_time());
    let scanner = Scanner::new(
        reader,
        gateway.clone(),
        clock.clone(),
        room(),
        ScannerConfig::default(),
    )
    .unwrap();
    (scanner, handle, gateway, clock)
}
