use std::fmt;
use std::str::FromStr;

use crate::protocol::ParseError;

/// ICAP request methods, RFC 3507 section 4.3.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IcapMethod {
    ReqMod,
    RespMod,
    Options,
}

impl IcapMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            IcapMethod::ReqMod => "REQMOD",
            IcapMethod::RespMod => "RESPMOD",
            IcapMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for IcapMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IcapMethod {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REQMOD" => Ok(IcapMethod::ReqMod),
            "RESPMOD" => Ok(IcapMethod::RespMod),
            "OPTIONS" => Ok(IcapMethod::Options),
            other => Err(ParseError::malformed_initial_line(format!("unknown icap method: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn methods_are_case_sensitive() {
        assert_eq!("RESPMOD".parse::<IcapMethod>().unwrap(), IcapMethod::RespMod);
        assert!("respmod".parse::<IcapMethod>().is_err());
        assert!("GET".parse::<IcapMethod>().is_err());
    }
}
