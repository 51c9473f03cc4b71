//! ISO 7816-4 command APDUs.

use bytes::{BufMut, Bytes, BytesMut};
use classtap_core::constants::{
    CLA_ISO, INS_READ_BINARY, INS_SELECT, P1_SELECT_BY_NAME, P2_FIRST_OCCURRENCE, READ_LENGTH,
    ROOM_ENTRY_AID,
};

use crate::error::{ApduError, Result};

/// Longest application identifier ISO 7816-4 allows in a SELECT.
pub const MAX_AID_LENGTH: usize = 16;

/// A short (single-byte Lc/Le) command APDU.
///
/// # Example
/// ```
/// use classtap_protocol::ApduCommand;
///
/// let select = ApduCommand::select_room_entry();
/// assert_eq!(
///     select.to_vec(),
///     vec![0x00, 0xA4, 0x04, 0x00, 0x07, 0xF0, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06]
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduCommand {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: Vec<u8>,
    pub le: Option<u8>,
}

impl ApduCommand {
    /// Create a header-only command (case 1).
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        ApduCommand {
            cla,
            ins,
            p1,
            p2,
            data: Vec::new(),
            le: None,
        }
    }

    /// Attach a command body.
    ///
    /// # Errors
    /// Returns error if the body does not fit a single-byte Lc.
    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Result<Self> {
        let data = data.into();
        if data.len() > u8::MAX as usize {
            return Err(ApduError::InvalidCommand(format!(
                "command body of {} bytes exceeds short APDU limit",
                data.len()
            )));
        }
        self.data = data;
        Ok(self)
    }

    /// Set the expected response length.
    pub fn with_le(mut self, le: u8) -> Self {
        self.le = Some(le);
        self
    }

    /// SELECT by application name.
    ///
    /// # Errors
    /// Returns error if the AID is empty or longer than [`MAX_AID_LENGTH`].
    pub fn select(aid: &[u8]) -> Result<Self> {
        if aid.is_empty() || aid.len() > MAX_AID_LENGTH {
            return Err(ApduError::InvalidCommand(format!(
                "AID must be 1..={MAX_AID_LENGTH} bytes, got {}",
                aid.len()
            )));
        }
        ApduCommand::new(CLA_ISO, INS_SELECT, P1_SELECT_BY_NAME, P2_FIRST_OCCURRENCE).with_data(aid)
    }

    /// SELECT for the room-entry application the phone service registers.
    pub fn select_room_entry() -> Self {
        ApduCommand::new(CLA_ISO, INS_SELECT, P1_SELECT_BY_NAME, P2_FIRST_OCCURRENCE)
            .with_payload(ROOM_ENTRY_AID.to_vec())
    }

    /// READ BINARY from offset zero.
    pub fn read_binary(le: u8) -> Self {
        ApduCommand::new(CLA_ISO, INS_READ_BINARY, 0x00, 0x00).with_le(le)
    }

    /// READ for the custom identifier once the application is selected.
    pub fn read_custom_identifier() -> Self {
        Self::read_binary(READ_LENGTH)
    }

    // Internal constructor for bodies known to fit.
    fn with_payload(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    /// Human-readable instruction name for logs.
    pub fn name(&self) -> &'static str {
        match self.ins {
            INS_SELECT => "SELECT",
            INS_READ_BINARY => "READ BINARY",
            _ => "UNKNOWN",
        }
    }

    /// Number of bytes [`encode`](Self::encode) produces.
    pub fn encoded_len(&self) -> usize {
        let body = if self.data.is_empty() {
            0
        } else {
            1 + self.data.len()
        };
        4 + body + usize::from(self.le.is_some())
    }

    /// Serialize to wire bytes: `CLA INS P1 P2 [Lc data] [Le]`.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_u8(self.cla);
        buf.put_u8(self.ins);
        buf.put_u8(self.p1);
        buf.put_u8(self.p2);
        if !self.data.is_empty() {
            // Length is bounded to u8 by every constructor
            buf.put_u8(self.data.len() as u8);
            buf.put_slice(&self.data);
        }
        if let Some(le) = self.le {
            buf.put_u8(le);
        }
        buf.freeze()
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.encode().to_vec()
    }
}
