//! APDU status words (SW1 SW2).

use std::fmt;

use classtap_core::constants::{SW_FILE_NOT_FOUND, SW_SUCCESS};

/// Two-byte result code the target appends to every APDU response.
///
/// # Examples
///
/// ```
/// use classtap_protocol::StatusWord;
///
/// let sw = StatusWord::new(0x6A, 0x82);
/// assert!(!sw.is_success());
/// assert_eq!(sw.to_string(), "6A82 (file or application not found)");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusWord(u16);

impl StatusWord {
    pub const SUCCESS: StatusWord = StatusWord(SW_SUCCESS);
    pub const FILE_NOT_FOUND: StatusWord = StatusWord(SW_FILE_NOT_FOUND);

    #[must_use]
    pub fn new(sw1: u8, sw2: u8) -> Self {
        StatusWord(u16::from_be_bytes([sw1, sw2]))
    }

    #[must_use]
    pub fn from_u16(value: u16) -> Self {
        StatusWord(value)
    }

    #[must_use]
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    #[must_use]
    pub fn sw1(&self) -> u8 {
        self.0.to_be_bytes()[0]
    }

    #[must_use]
    pub fn sw2(&self) -> u8 {
        self.0.to_be_bytes()[1]
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        *self == Self::SUCCESS
    }

    /// Short ISO 7816-4 meaning of the status word, for log output.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match (self.sw1(), self.sw2()) {
            (0x90, 0x00) => "success",
            (0x61, _) => "more response bytes available",
            (0x62 | 0x63, _) => "warning",
            (0x67, 0x00) => "wrong length",
            (0x69, 0x82) => "security status not satisfied",
            (0x69, 0x85) => "conditions of use not satisfied",
            (0x6A, 0x82) => "file or application not found",
            (0x6A, 0x86) => "incorrect P1/P2",
            (0x6C, _) => "wrong Le field",
            (0x6D, 0x00) => "instruction not supported",
            (0x6E, 0x00) => "class not supported",
            (0x6F, 0x00) => "no precise diagnosis",
            // Returned by the phone service when it fails to build a response
            (0x00, 0x00) => "no status",
            _ => "unknown status",
        }
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X} ({})", self.0, self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_status_word_bytes() {
        let sw = StatusWord::new(0x90, 0x00);
        assert_eq!(sw, StatusWord::SUCCESS);
        assert_eq!(sw.as_u16(), 0x9000);
        assert_eq!(sw.sw1(), 0x90);
        assert_eq!(sw.sw2(), 0x00);
        assert!(sw.is_success());
    }

    #[rstest]
    #[case(0x6A82, "file or application not found")]
    #[case(0x6D00, "instruction not supported")]
    #[case(0x6110, "more response bytes available")]
    #[case(0x0000, "no status")]
    #[case(0x1234, "unknown status")]
    fn test_status_word_description(#[case] value: u16, #[case] expected: &str) {
        let sw = StatusWord::from_u16(value);
        assert!(!sw.is_success());
        assert_eq!(sw.description(), expected);
    }

    #[test]
    fn test_status_word_display() {
        assert_eq!(StatusWord::SUCCESS.to_string(), "9000 (success)");
    }
}
