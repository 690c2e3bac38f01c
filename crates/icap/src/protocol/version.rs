//! ICAP protocol version token.

use std::fmt;
use std::str::FromStr;

use crate::protocol::ParseError;

/// The `ICAP/<major>.<minor>` token found on every initial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IcapVersion {
    major: u8,
    minor: u8,
}

impl IcapVersion {
    /// `ICAP/1.0`, the only version defined by RFC 3507.
    pub const ICAP_10: IcapVersion = IcapVersion { major: 1, minor: 0 };

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    pub fn major(&self) -> u8 {
        self.major
    }

    pub fn minor(&self) -> u8 {
        self.minor
    }
}

impl Default for IcapVersion {
    fn default() -> Self {
        Self::ICAP_10
    }
}

impl fmt::Display for IcapVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ICAP/{}.{}", self.major, self.minor)
    }
}

impl FromStr for IcapVersion {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::malformed_initial_line(format!("invalid icap version: {s}"));

        let numbers = s.strip_prefix("ICAP/").ok_or_else(invalid)?;
        let (major, minor) = numbers.split_once('.').ok_or_else(invalid)?;
        let major = major.parse::<u8>().map_err(|_| invalid())?;
        let minor = minor.parse::<u8>().map_err(|_| invalid())?;

        Ok(Self { major, minor })
    }
}
