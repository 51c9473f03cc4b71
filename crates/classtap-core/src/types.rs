use crate::{
    Result,
    constants::{CUSTOM_IDENTIFIER_LENGTH, MAX_UID_LENGTH, MIN_UID_LENGTH},
    error::Error,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Render bytes as an uppercase hex string without separators.
///
/// ```
/// use classtap_core::to_hex_upper;
///
/// assert_eq!(to_hex_upper(&[0x04, 0xA1, 0xB2, 0xC3]), "04A1B2C3");
/// ```
#[must_use]
pub fn to_hex_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

/// Parse a hex string into bytes.
///
/// Accepts `:`, `-` and whitespace as separators, so `04:A1:B2:C3`,
/// `04-a1-b2-c3` and `04A1B2C3` all decode to the same bytes.
///
/// # Errors
/// Returns `Error::InvalidHex` on an odd digit count or a non-hex character.
pub fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let digits: String = input
        .chars()
        .filter(|c| !matches!(c, ':' | '-') && !c.is_whitespace())
        .collect();

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidHex(format!("non-hex character in {input:?}")));
    }

    if digits.is_empty() || digits.len() % 2 != 0 {
        return Err(Error::InvalidHex(format!(
            "expected an even, non-zero number of hex digits in {input:?}"
        )));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| Error::InvalidHex(format!("invalid hex byte in {input:?}")))
        })
        .collect()
}

/// Hardware identifier (UID) reported by the reader for a detected target.
///
/// For physical tags this is the chip's factory UID. Phones in HCE mode
/// report a random UID that changes between taps, which is why the scanner
/// asks them for a custom identifier instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawIdentifier(Vec<u8>);

impl RawIdentifier {
    /// Create a new hardware identifier with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidIdentifier` if the length is outside 4-10 bytes.
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        let len = bytes.len();
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&len) {
            return Err(Error::InvalidIdentifier(format!(
                "UID must be {MIN_UID_LENGTH}-{MAX_UID_LENGTH} bytes, got {len}"
            )));
        }
        Ok(RawIdentifier(bytes))
    }

    /// Parse an identifier from hex text.
    ///
    /// # Errors
    /// Returns an error if the text is not hex or has an invalid length.
    pub fn from_hex(input: &str) -> Result<Self> {
        Self::new(parse_hex(input)?)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Uppercase hex rendering used for comparison and transmission.
    #[must_use]
    pub fn to_hex(&self) -> String {
        to_hex_upper(&self.0)
    }
}

impl fmt::Display for RawIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for RawIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        RawIdentifier::from_hex(s)
    }
}

/// Identifier chosen by the phone application and returned by the READ command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomIdentifier([u8; CUSTOM_IDENTIFIER_LENGTH]);

impl CustomIdentifier {
    #[must_use]
    pub fn new(bytes: [u8; CUSTOM_IDENTIFIER_LENGTH]) -> Self {
        CustomIdentifier(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; CUSTOM_IDENTIFIER_LENGTH] {
        &self.0
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        to_hex_upper(&self.0)
    }
}

impl TryFrom<&[u8]> for CustomIdentifier {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let array: [u8; CUSTOM_IDENTIFIER_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| Error::InvalidCustomIdentifierLength {
                    expected: CUSTOM_IDENTIFIER_LENGTH,
                    actual: bytes.len(),
                })?;
        Ok(CustomIdentifier(array))
    }
}

impl fmt::Display for CustomIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for CustomIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CustomIdentifier::try_from(parse_hex(s)?.as_slice())
    }
}

/// Kind of device a resolved identifier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    /// Smartphone running the HCE service; identifier is the custom broadcast.
    CustomBroadcast,

    /// Plain NFC tag or card; identifier is the hardware UID.
    PhysicalTag,
}

impl DeviceClass {
    /// Human-readable label for log output.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            DeviceClass::CustomBroadcast => "Smartphone (HCE)",
            DeviceClass::PhysicalTag => "Physical NFC Tag",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifier of the room the scanner is mounted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(i32);

impl RoomId {
    /// Create a new room ID with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidRoomId` if the ID is not positive.
    pub fn new(id: i32) -> Result<Self> {
        if id <= 0 {
            return Err(Error::InvalidRoomId(format!(
                "Room ID must be positive, got {id}"
            )));
        }
        Ok(RoomId(id))
    }

    #[must_use]
    pub fn as_i32(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RoomId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let id: i32 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidRoomId(format!("Invalid room ID: {s}")))?;
        RoomId::new(id)
    }
}

/// Final output of one accepted detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedScan {
    /// Identifier submitted to the API (custom or hardware, uppercase hex).
    pub identifier: String,

    pub device_class: DeviceClass,

    pub room_id: RoomId,

    /// Hardware UID the scan was detected with; also the deduplication key.
    pub hardware_id: RawIdentifier,

    /// When the target was detected.
    pub timestamp: DateTime<Utc>,
}
