//! Line level primitives used by the decoder states.
//!
//! Every function either consumes a complete unit from the buffer or leaves
//! the buffer untouched and returns `None`.

use bytes::{Buf, BytesMut};

use crate::ensure;
use crate::protocol::ParseError;

/// Discards leading CR, LF and whitespace.
///
/// Returns true once a significant byte is at the front of `src`.
pub(crate) fn skip_control_chars(src: &mut BytesMut) -> bool {
    let skip = src.iter().take_while(|b| b.is_ascii_control() || b.is_ascii_whitespace()).count();
    src.advance(skip);
    !src.is_empty()
}

/// Reads one line terminated by CRLF or a bare LF.
///
/// The returned line has its terminator stripped; `consumed` is the number of
/// bytes taken from `src`, terminator included. When no terminator is
/// buffered yet, `None` is returned unless the partial line already exceeds
/// `max_len`.
pub(crate) fn read_line(src: &mut BytesMut, max_len: usize) -> Result<Option<Line>, ParseError> {
    match src.iter().position(|b| *b == b'\n') {
        Some(lf) => {
            let content_len = if lf > 0 && src[lf - 1] == b'\r' { lf - 1 } else { lf };
            ensure!(content_len <= max_len, ParseError::line_too_long(content_len, max_len));

            let line = src.split_to(lf + 1);
            Ok(Some(Line { bytes: line.freeze().slice(..content_len), consumed: lf + 1 }))
        }
        None => {
            // a trailing CR may still be followed by its LF
            let pending = src.len() - usize::from(src.last() == Some(&b'\r'));
            ensure!(pending <= max_len, ParseError::line_too_long(pending, max_len));
            Ok(None)
        }
    }
}

#[derive(Debug)]
pub(crate) struct Line {
    pub(crate) bytes: bytes::Bytes,
    pub(crate) consumed: usize,
}

impl Line {
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub(crate) fn as_str(&self) -> Result<&str, ParseError> {
        std::str::from_utf8(&self.bytes).map_err(|_| ParseError::invalid_header("line is not valid utf-8"))
    }
}

/// Splits an initial line into `first SP second SP rest`.
///
/// The third token keeps its inner whitespace so reason phrases such as
/// `ICAP Service Not Found` survive. Returns `None` for fewer than three tokens.
pub(crate) fn split_initial_line(line: &str) -> Option<[&str; 3]> {
    let line = line.trim();
    let (first, rest) = line.split_once(|c: char| c.is_ascii_whitespace())?;
    let rest = rest.trim_start();
    let (second, third) = rest.split_once(|c: char| c.is_ascii_whitespace())?;
    let third = third.trim();

    if first.is_empty() || second.is_empty() || third.is_empty() {
        return None;
    }
    Some([first, second, third])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_noise() {
        let mut src = BytesMut::from(&b"\r\n \t\r\nREQMOD"[..]);
        assert!(skip_control_chars(&mut src));
        assert_eq!(&src[..], b"REQMOD");

        let mut src = BytesMut::from(&b"\r\n\r\n"[..]);
        assert!(!skip_control_chars(&mut src));
        assert!(src.is_empty());
    }

    #[test]
    fn read_crlf_and_lf_lines() {
        let mut src = BytesMut::from(&b"first\r\nsecond\nthird"[..]);

        let line = read_line(&mut src, 64).unwrap().unwrap();
        assert_eq!(&line.bytes[..], b"first");
        assert_eq!(line.consumed, 7);

        let line = read_line(&mut src, 64).unwrap().unwrap();
        assert_eq!(&line.bytes[..], b"second");
        assert_eq!(line.consumed, 7);

        assert!(read_line(&mut src, 64).unwrap().is_none());
        assert_eq!(&src[..], b"third");
    }

    #[test]
    fn partial_line_is_not_consumed() {
        let mut src = BytesMut::from(&b"abc\r"[..]);
        assert!(read_line(&mut src, 3).unwrap().is_none());
        assert_eq!(src.len(), 4);
    }

    #[test]
    fn line_too_long() {
        let mut src = BytesMut::from(&b"abcdef"[..]);
        let result = read_line(&mut src, 5);
        assert!(matches!(result, Err(ParseError::LineTooLong { current_size: 6, max_size: 5 })));

        let mut src = BytesMut::from(&b"abcdef\r\n"[..]);
        assert!(read_line(&mut src, 5).is_err());
    }

    #[test]
    fn split_tokens() {
        assert_eq!(
            split_initial_line("ICAP/1.0 404 ICAP Service Not Found"),
            Some(["ICAP/1.0", "404", "ICAP Service Not Found"])
        );
        assert_eq!(
            split_initial_line("REQMOD  icap://example.org/modify   ICAP/1.0 "),
            Some(["REQMOD", "icap://example.org/modify", "ICAP/1.0"])
        );
        assert_eq!(split_initial_line("REQMOD icap://example.org"), None);
        assert_eq!(split_initial_line("garbage"), None);
    }
}
