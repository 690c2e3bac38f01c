//! The `Encapsulated` header, RFC 3507 section 4.4.1.
//!
//! The header lists the entities embedded in an ICAP message together with
//! their byte offsets relative to the start of the encapsulated part, e.g.
//! `req-hdr=0, res-hdr=137, res-body=296`.
//!
//! A well formed descriptor satisfies:
//!
//! - at most one body entity (`req-body`, `res-body`, `opt-body` or `null-body`)
//! - the body entity, when present, is the last entry
//! - offsets never decrease

use std::fmt;
use std::str::FromStr;

use crate::ensure;
use crate::protocol::ParseError;

/// Name of the header on the wire.
pub const ENCAPSULATED: &str = "Encapsulated";

/// The entities an ICAP message can embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    ReqHdr,
    ResHdr,
    ReqBody,
    ResBody,
    OptBody,
    NullBody,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::ReqHdr => "req-hdr",
            EntityKind::ResHdr => "res-hdr",
            EntityKind::ReqBody => "req-body",
            EntityKind::ResBody => "res-body",
            EntityKind::OptBody => "opt-body",
            EntityKind::NullBody => "null-body",
        }
    }

    /// Returns true for the four body kinds, `null-body` included.
    #[inline]
    pub fn is_body(&self) -> bool {
        !matches!(self, EntityKind::ReqHdr | EntityKind::ResHdr)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "req-hdr" => EntityKind::ReqHdr,
            "res-hdr" => EntityKind::ResHdr,
            "req-body" => EntityKind::ReqBody,
            "res-body" => EntityKind::ResBody,
            "opt-body" => EntityKind::OptBody,
            "null-body" => EntityKind::NullBody,
            _ => return Err(ParseError::malformed_encapsulation(format!("unknown entity: {s}"))),
        };
        Ok(kind)
    }
}

/// An ordered list of `(entity, offset)` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Encapsulated {
    entries: Vec<(EntityKind, usize)>,
}

impl Encapsulated {
    /// Builds a descriptor from entries, checking the ordering rules.
    pub fn from_entries<I>(entries: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = (EntityKind, usize)>,
    {
        let mut encapsulated = Encapsulated::default();
        for (kind, offset) in entries {
            encapsulated.push(kind, offset)?;
        }
        Ok(encapsulated)
    }

    fn push(&mut self, kind: EntityKind, offset: usize) -> Result<(), ParseError> {
        if let Some(&(last_kind, last_offset)) = self.entries.last() {
            ensure!(
                !last_kind.is_body(),
                ParseError::malformed_encapsulation(format!("{kind} follows body entity {last_kind}"))
            );
            ensure!(
                offset >= last_offset,
                ParseError::malformed_encapsulation(format!("offset of {kind} ({offset}) is before {last_kind} ({last_offset})"))
            );
        }
        ensure!(
            !self.contains(kind),
            ParseError::malformed_encapsulation(format!("duplicated entity {kind}"))
        );

        self.entries.push((kind, offset));
        Ok(())
    }

    pub fn entries(&self) -> &[(EntityKind, usize)] {
        &self.entries
    }

    pub fn contains(&self, kind: EntityKind) -> bool {
        self.entries.iter().any(|(k, _)| *k == kind)
    }

    pub fn offset(&self, kind: EntityKind) -> Option<usize> {
        self.entries.iter().find(|(k, _)| *k == kind).map(|(_, offset)| *offset)
    }

    /// The body entry, `null-body` included.
    pub fn body_entry(&self) -> Option<EntityKind> {
        self.entries.last().map(|(kind, _)| *kind).filter(EntityKind::is_body)
    }

    /// The embedded HTTP heads, in wire order.
    pub fn heads(&self) -> impl Iterator<Item = EntityKind> + '_ {
        self.entries.iter().map(|(kind, _)| *kind).filter(|kind| !kind.is_body())
    }
}

impl fmt::Display for Encapsulated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (kind, offset)) in self.entries.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{kind}={offset}")?;
        }
        Ok(())
    }
}

impl FromStr for Encapsulated {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut encapsulated = Encapsulated::default();
        for pair in s.split(',') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }

            let (kind, offset) = pair
                .split_once('=')
                .ok_or_else(|| ParseError::malformed_encapsulation(format!("missing offset in '{pair}'")))?;
            let kind = kind.trim().parse::<EntityKind>()?;
            let offset = offset
                .trim()
                .parse::<usize>()
                .map_err(|_| ParseError::malformed_encapsulation(format!("invalid offset in '{pair}'")))?;

            encapsulated.push(kind, offset)?;
        }

        ensure!(!encapsulated.entries.is_empty(), ParseError::malformed_encapsulation("no entity"));
        Ok(encapsulated)
    }
}
