//! Mock contactless reader for testing and development.
//!
//! This module provides a simulated PN532-style reader that can be fed
//! targets programmatically: physical tags that reject application commands,
//! phones running the HCE service, or fully scripted targets that return
//! arbitrary reader responses.

use crate::{
    HardwareError, Result,
    traits::{ApduTransport, PresenceDetector},
    types::ReaderInfo,
};
use classtap_core::{
    CustomIdentifier, RawIdentifier,
    constants::{
        CLA_ISO, INS_SELECT, P1_SELECT_BY_NAME, P2_FIRST_OCCURRENCE, ROOM_ENTRY_AID,
        SW_FILE_NOT_FOUND, SW_SUCCESS, TARGET_INDEX, TRANSPORT_STATUS_OK,
    },
    to_hex_upper,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::trace;

const SELECT_HEADER: [u8; 4] = [CLA_ISO, INS_SELECT, P1_SELECT_BY_NAME, P2_FIRST_OCCURRENCE];

/// One scripted reader reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// The reader returns these bytes, transport status byte included.
    Response(Vec<u8>),

    /// The reader reports that the target could not process the command.
    TransportError,
}

#[derive(Debug, Clone)]
enum Behavior {
    PhysicalTag,
    HceService {
        aid: Vec<u8>,
        identifier: Vec<u8>,
    },
    Scripted(VecDeque<MockReply>),
}

/// A target that can be placed in the mock reader's field.
///
/// # Examples
///
/// ```
/// use classtap_hardware::mock::MockTarget;
/// use classtap_core::RawIdentifier;
///
/// let uid = RawIdentifier::from_hex("04A1B2C3").unwrap();
///
/// // SELECT succeeds, READ returns a 6-byte payload
/// let target = MockTarget::scripted(uid)
///     .reply([0x00, 0x90, 0x00])
///     .reply([0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x90, 0x00]);
/// ```
#[derive(Debug, Clone)]
pub struct MockTarget {
    uid: RawIdentifier,
    behavior: Behavior,
}

impl MockTarget {
    /// A plain tag: every exchange fails at the transport level.
    pub fn physical_tag(uid: RawIdentifier) -> Self {
        Self {
            uid,
            behavior: Behavior::PhysicalTag,
        }
    }

    /// A phone running the room-entry HCE service.
    ///
    /// Answers a SELECT for the room-entry AID with `90 00`, a SELECT for any
    /// other AID with `6A 82`, and every other command with the identifier
    /// followed by `90 00`.
    pub fn hce_phone(uid: RawIdentifier, identifier: CustomIdentifier) -> Self {
        Self::hce_service(uid, &ROOM_ENTRY_AID, identifier.as_bytes())
    }

    /// A phone running an HCE service with an arbitrary AID and identifier.
    ///
    /// The identifier is not length-checked, which makes this useful for
    /// simulating misbehaving applications.
    pub fn hce_service(uid: RawIdentifier, aid: &[u8], identifier: &[u8]) -> Self {
        Self {
            uid,
            behavior: Behavior::HceService {
                aid: aid.to_vec(),
                identifier: identifier.to_vec(),
            },
        }
    }

    /// A target whose replies are given one by one with [`reply`](Self::reply)
    /// and [`transport_error`](Self::transport_error). Once the script runs
    /// out, exchanges fail at the transport level.
    pub fn scripted(uid: RawIdentifier) -> Self {
        Self {
            uid,
            behavior: Behavior::Scripted(VecDeque::new()),
        }
    }

    /// Append a raw reader response to the script.
    pub fn reply(self, bytes: impl Into<Vec<u8>>) -> Self {
        self.push(MockReply::Response(bytes.into()))
    }

    /// Append a transport failure to the script.
    pub fn transport_error(self) -> Self {
        self.push(MockReply::TransportError)
    }

    fn push(mut self, reply: MockReply) -> Self {
        match &mut self.behavior {
            Behavior::Scripted(replies) => replies.push_back(reply),
            _ => self.behavior = Behavior::Scripted(VecDeque::from([reply])),
        }
        self
    }

    /// Hardware UID reported when the target is polled.
    pub fn uid(&self) -> &RawIdentifier {
        &self.uid
    }

    fn respond(&mut self, command: &[u8]) -> Result<Vec<u8>> {
        match &mut self.behavior {
            Behavior::PhysicalTag => Err(HardwareError::communication(
                "target does not support APDU exchange",
            )),
            Behavior::HceService { aid, identifier } => {
                if !command.starts_with(&SELECT_HEADER) {
                    return Ok(envelope(identifier, SW_SUCCESS));
                }

                let lc = command.get(4).copied().unwrap_or(0) as usize;
                let status = if command.get(5..5 + lc) == Some(aid.as_slice()) {
                    SW_SUCCESS
                } else {
                    SW_FILE_NOT_FOUND
                };
                Ok(envelope(&[], status))
            }
            Behavior::Scripted(replies) => match replies.pop_front() {
                Some(MockReply::Response(bytes)) => Ok(bytes),
                Some(MockReply::TransportError) | None => Err(HardwareError::communication(
                    "InDataExchange failed",
                )),
            },
        }
    }
}

fn envelope(payload: &[u8], status_word: u16) -> Vec<u8> {
    let mut response = Vec::with_capacity(payload.len() + 3);
    response.push(TRANSPORT_STATUS_OK);
    response.extend_from_slice(payload);
    response.extend_from_slice(&status_word.to_be_bytes());
    response
}

/// Shared record of what the scanner did with the reader.
#[derive(Debug, Default)]
struct ReaderLog {
    commands: Mutex<Vec<Vec<u8>>>,
    releases: AtomicUsize,
    polls: AtomicUsize,
    fail_release: AtomicBool,
}

/// Mock contactless reader.
///
/// # Examples
///
/// ```
/// use classtap_hardware::mock::{MockReader, MockTarget};
/// use classtap_hardware::traits::PresenceDetector;
/// use classtap_core::RawIdentifier;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> classtap_hardware::Result<()> {
///     let (mut reader, handle) = MockReader::new();
///
///     let uid = RawIdentifier::from_hex("04A1B2C3").unwrap();
///     handle.present(MockTarget::physical_tag(uid)).await?;
///
///     let polled = reader.poll_target(Duration::from_millis(500)).await?;
///     assert_eq!(polled.unwrap().to_hex(), "04A1B2C3");
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockReader {
    /// Channel receiver for presented targets
    target_rx: mpsc::Receiver<MockTarget>,

    /// Device name
    name: String,

    /// Target selected by the last successful poll
    current: Option<MockTarget>,

    log: Arc<ReaderLog>,
}

impl MockReader {
    /// Create a new mock reader with the default name.
    pub fn new() -> (Self, MockReaderHandle) {
        Self::with_name("Mock PN532 Reader".to_string())
    }

    /// Create a new mock reader with a custom name.
    pub fn with_name(name: String) -> (Self, MockReaderHandle) {
        let (target_tx, target_rx) = mpsc::channel(32);
        let log = Arc::new(ReaderLog::default());

        let reader = Self {
            target_rx,
            name: name.clone(),
            current: None,
            log: Arc::clone(&log),
        };

        let handle = MockReaderHandle {
            target_tx,
            name,
            log,
        };

        (reader, handle)
    }

    /// Check whether a target is currently selected.
    pub fn has_target(&self) -> bool {
        self.current.is_some()
    }
}

impl PresenceDetector for MockReader {
    async fn poll_target(&mut self, timeout: Duration) -> Result<Option<RawIdentifier>> {
        self.log.polls.fetch_add(1, Ordering::SeqCst);

        let target = match tokio::time::timeout(timeout, self.target_rx.recv()).await {
            Ok(Some(target)) => target,
            Ok(None) => return Err(HardwareError::disconnected(self.name.clone())),
            Err(_) => return Ok(None),
        };

        let uid = target.uid.clone();
        self.current = Some(target);
        Ok(Some(uid))
    }
}

impl ApduTransport for MockReader {
    async fn exchange(
        &mut self,
        target: u8,
        command: &[u8],
        max_response_len: usize,
    ) -> Result<Vec<u8>> {
        trace!(reader = %self.name, command = %to_hex_upper(command), "mock exchange");
        self.log
            .commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command.to_vec());

        if target != TARGET_INDEX {
            return Err(HardwareError::communication(format!(
                "unknown target number {target}"
            )));
        }

        let current = self
            .current
            .as_mut()
            .ok_or_else(|| HardwareError::communication("no target in field"))?;

        let mut response = current.respond(command)?;
        response.truncate(max_response_len);
        Ok(response)
    }

    async fn release(&mut self, _target: u8) -> Result<()> {
        self.log.releases.fetch_add(1, Ordering::SeqCst);
        self.current = None;

        if self.log.fail_release.load(Ordering::SeqCst) {
            return Err(HardwareError::communication("InRelease failed"));
        }
        Ok(())
    }

    async fn reader_info(&self) -> Result<ReaderInfo> {
        Ok(
            ReaderInfo::new(self.name.clone(), vec!["ISO14443A".to_string()])
                .with_firmware_version("mock"),
        )
    }
}

/// Handle for controlling a mock reader and inspecting what it was asked to do.
#[derive(Debug, Clone)]
pub struct MockReaderHandle {
    /// Channel sender for presented targets
    target_tx: mpsc::Sender<MockTarget>,

    /// Device name
    name: String,

    log: Arc<ReaderLog>,
}

impl MockReaderHandle {
    /// Place a target in the field; the next poll detects it.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn present(&self, target: MockTarget) -> Result<()> {
        self.target_tx
            .send(target)
            .await
            .map_err(|_| HardwareError::disconnected(self.name.clone()))
    }

    /// Make every following release fail (or succeed again).
    pub fn set_release_failure(&self, fail: bool) {
        self.log.fail_release.store(fail, Ordering::SeqCst);
    }

    /// Number of release calls so far.
    pub fn release_count(&self) -> usize {
        self.log.releases.load(Ordering::SeqCst)
    }

    /// Number of poll calls so far.
    pub fn poll_count(&self) -> usize {
        self.log.polls.load(Ordering::SeqCst)
    }

    /// Every command sent through `exchange`, in order.
    pub fn sent_commands(&self) -> Vec<Vec<u8>> {
        self.log
            .commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
