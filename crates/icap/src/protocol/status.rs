use std::fmt;
use std::str::FromStr;

use crate::protocol::ParseError;

/// An ICAP response status code.
///
/// The constants cover the codes defined by RFC 3507; any three digit code is
/// accepted on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IcapStatus(u16);

impl IcapStatus {
    pub const CONTINUE: IcapStatus = IcapStatus(100);
    pub const OK: IcapStatus = IcapStatus(200);
    pub const NO_CONTENT: IcapStatus = IcapStatus(204);
    pub const PARTIAL_CONTENT: IcapStatus = IcapStatus(206);
    pub const BAD_REQUEST: IcapStatus = IcapStatus(400);
    pub const FORBIDDEN: IcapStatus = IcapStatus(403);
    pub const SERVICE_NOT_FOUND: IcapStatus = IcapStatus(404);
    pub const METHOD_NOT_ALLOWED: IcapStatus = IcapStatus(405);
    pub const PROXY_AUTHENTICATION_REQUIRED: IcapStatus = IcapStatus(407);
    pub const REQUEST_TIMEOUT: IcapStatus = IcapStatus(408);
    pub const SERVER_ERROR: IcapStatus = IcapStatus(500);
    pub const METHOD_NOT_IMPLEMENTED: IcapStatus = IcapStatus(501);
    pub const BAD_GATEWAY: IcapStatus = IcapStatus(502);
    pub const SERVICE_OVERLOADED: IcapStatus = IcapStatus(503);
    pub const VERSION_NOT_SUPPORTED: IcapStatus = IcapStatus(505);

    pub fn from_u16(code: u16) -> Result<Self, ParseError> {
        if (100..1000).contains(&code) {
            Ok(IcapStatus(code))
        } else {
            Err(ParseError::malformed_initial_line(format!("invalid icap status code: {code}")))
        }
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn canonical_reason(&self) -> Option<&'static str> {
        let reason = match self.0 {
            100 => "Continue",
            200 => "OK",
            204 => "No Content",
            206 => "Partial Content",
            400 => "Bad Request",
            403 => "Forbidden",
            404 => "ICAP Service Not Found",
            405 => "Method Not Allowed For Service",
            407 => "Proxy Authentication Required",
            408 => "Request Timeout",
            500 => "Server Error",
            501 => "Method Not Implemented",
            502 => "Bad Gateway",
            503 => "Service Overloaded",
            505 => "ICAP Version Not Supported",
            _ => return None,
        };
        Some(reason)
    }
}

impl fmt::Display for IcapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for IcapStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s
            .parse::<u16>()
            .map_err(|_| ParseError::malformed_initial_line(format!("invalid icap status code: {s}")))?;
        IcapStatus::from_u16(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_reasons() {
        assert_eq!(IcapStatus::NO_CONTENT.canonical_reason(), Some("No Content"));
        assert_eq!(IcapStatus::SERVICE_NOT_FOUND.canonical_reason(), Some("ICAP Service Not Found"));
        assert_eq!(IcapStatus::from_u16(299).unwrap().canonical_reason(), None);
    }

    #[test]
    fn parse_status_code() {
        assert_eq!("204".parse::<IcapStatus>().unwrap(), IcapStatus::NO_CONTENT);
        assert!("20".parse::<IcapStatus>().is_err());
        assert!("abc".parse::<IcapStatus>().is_err());
    }
}
