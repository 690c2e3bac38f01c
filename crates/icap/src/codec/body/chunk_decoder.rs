//! Decoding primitives for ICAP chunked bodies.
//!
//! A chunk is framed as
//!
//! ```text
//! <hex-size>[; ieof] CRLF
//! <size bytes of data> CRLF
//! ```
//!
//! and the body ends with a zero sized chunk followed by an optional
//! `Use-Original-Body` line and a blank line.

use bytes::{Buf, Bytes, BytesMut};
use tracing::trace;

use crate::ensure;
use crate::protocol::ParseError;

/// Chunk extension announcing that no more body data follows a preview.
const IEOF: &str = "ieof";

/// A parsed chunk size line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChunkSize {
    pub(crate) size: usize,
    pub(crate) ieof: bool,
}

impl ChunkSize {
    /// Parses `<hex-size>[;extension]*`, enforcing `max_chunk_size`.
    ///
    /// Extensions other than `ieof` are ignored.
    pub(crate) fn parse(line: &str, max_chunk_size: usize) -> Result<Self, ParseError> {
        let mut segments = line.split(';');
        let size_str = segments.next().unwrap_or_default().trim();
        ensure!(!size_str.is_empty(), ParseError::invalid_chunk("missing chunk size"));
        ensure!(
            size_str.bytes().all(|b| b.is_ascii_hexdigit()),
            ParseError::invalid_chunk(format!("invalid chunk size: {size_str}"))
        );

        // more than 16 hex digits cannot fit in a u64, it is too large anyway
        let size = if size_str.len() > 16 {
            u64::MAX
        } else {
            u64::from_str_radix(size_str, 16).map_err(|_| ParseError::invalid_chunk(format!("invalid chunk size: {size_str}")))?
        };
        ensure!(size <= max_chunk_size as u64, ParseError::chunk_too_large(size, max_chunk_size));

        let ieof = segments.any(|extension| extension.trim().eq_ignore_ascii_case(IEOF));
        trace!(size, ieof, "parsed chunk size line");

        Ok(Self { size: size as usize, ieof })
    }
}

/// Takes exactly `size` bytes of chunk data, or nothing if fewer are buffered.
pub(crate) fn read_chunk_data(src: &mut BytesMut, size: usize) -> Option<Bytes> {
    if src.len() < size {
        return None;
    }
    Some(src.split_to(size).freeze())
}

/// Consumes the CRLF (or bare LF) following chunk data.
///
/// Returns `Ok(false)` without consuming anything if the delimiter is not
/// fully buffered.
pub(crate) fn read_chunk_delimiter(src: &mut BytesMut) -> Result<bool, ParseError> {
    match src.first() {
        None => Ok(false),
        Some(b'\n') => {
            src.advance(1);
            Ok(true)
        }
        Some(b'\r') => match src.get(1) {
            None => Ok(false),
            Some(b'\n') => {
                src.advance(2);
                Ok(true)
            }
            Some(_) => Err(ParseError::invalid_chunk("invalid chunk data LF")),
        },
        Some(_) => Err(ParseError::invalid_chunk("chunk data is longer than its announced size")),
    }
}
