//! ICAP header block decoding.
//!
//! The decoder feeds complete lines one at a time into a [`HeaderBlockBuilder`].
//! Once the blank line is seen the builder is frozen into a [`HeaderBlock`]:
//! an `http::HeaderMap` plus the typed `Encapsulated` and `Preview` values,
//! which are removed from the map so that re-encoding a decoded message does
//! not duplicate them.

use http::{HeaderMap, HeaderName, HeaderValue};

use crate::ensure;
use crate::protocol::{ENCAPSULATED, Encapsulated, PREVIEW, ParseError};

/// Only trailing header understood inside a chunk trailer.
pub(crate) const USE_ORIGINAL_BODY: &str = "Use-Original-Body";

#[derive(Debug, Default)]
pub(crate) struct HeaderBlockBuilder {
    entries: Vec<(String, String)>,
}

#[derive(Debug)]
pub(crate) struct HeaderBlock {
    pub(crate) headers: HeaderMap,
    pub(crate) encapsulated: Option<Encapsulated>,
    pub(crate) preview: Option<usize>,
}

impl HeaderBlockBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds one header line, terminator already stripped.
    pub(crate) fn push_line(&mut self, line: &str) -> Result<(), ParseError> {
        if line.starts_with([' ', '\t']) {
            let (_, value) = self
                .entries
                .last_mut()
                .ok_or_else(|| ParseError::invalid_header("continuation line without a preceding header"))?;
            let folded = line.trim();
            if !folded.is_empty() {
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(folded);
            }
            return Ok(());
        }

        let (name, value) = split_header(line)?;
        self.entries.push((name.to_string(), value.to_string()));
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<HeaderBlock, ParseError> {
        let mut headers = HeaderMap::with_capacity(self.entries.len());
        let mut encapsulated = None;
        let mut preview = None;

        for (name, value) in self.entries {
            if name.eq_ignore_ascii_case(ENCAPSULATED) {
                ensure!(encapsulated.is_none(), ParseError::malformed_encapsulation("duplicated Encapsulated header"));
                encapsulated = Some(value.parse::<Encapsulated>()?);
                continue;
            }

            if name.eq_ignore_ascii_case(PREVIEW) {
                let amount = value
                    .parse::<usize>()
                    .map_err(|_| ParseError::invalid_header(format!("invalid Preview value: {value}")))?;
                preview = Some(amount);
                continue;
            }

            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ParseError::invalid_header(format!("invalid header name: {name}")))?;
            let header_value = HeaderValue::from_str(&value)
                .map_err(|_| ParseError::invalid_header(format!("invalid value of header {name}")))?;
            headers.append(header_name, header_value);
        }

        Ok(HeaderBlock { headers, encapsulated, preview })
    }
}

fn split_header(line: &str) -> Result<(&str, &str), ParseError> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| ParseError::invalid_header(format!("missing colon in header line: {line}")))?;
    let name = name.trim();
    ensure!(!name.is_empty(), ParseError::invalid_header("empty header name"));
    Ok((name, value.trim()))
}

/// Parses a line of a chunk trailer, returning the `Use-Original-Body` offset.
pub(crate) fn parse_trailer_line(line: &str) -> Result<usize, ParseError> {
    let (name, value) = split_header(line).map_err(|e| ParseError::invalid_trailer(e.to_string()))?;
    ensure!(
        name.eq_ignore_ascii_case(USE_ORIGINAL_BODY),
        ParseError::invalid_trailer(format!("unsupported trailing header: {name}"))
    );
    value
        .parse::<usize>()
        .map_err(|_| ParseError::invalid_trailer(format!("invalid {USE_ORIGINAL_BODY} value: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::EntityKind;

    #[test]
    fn build_header_block() {
        let mut builder = HeaderBlockBuilder::new();
        builder.push_line("Host: icap-server.net").unwrap();
        builder.push_line("Encapsulated: req-hdr=0, null-body=170").unwrap();
        builder.push_line("preview: 1024").unwrap();
        builder.push_line("Allow: 204").unwrap();
        builder.push_line("allow: 206").unwrap();

        let block = builder.finish().unwrap();

        assert_eq!(block.preview, Some(1024));
        assert_eq!(block.encapsulated.unwrap().body_entry(), Some(EntityKind::NullBody));
        assert_eq!(block.headers.len(), 3);
        assert_eq!(block.headers.get("HOST").unwrap(), "icap-server.net");
        let allow = block.headers.get_all("Allow").iter().collect::<Vec<_>>();
        assert_eq!(allow, vec!["204", "206"]);
        assert!(block.headers.get(ENCAPSULATED).is_none());
    }

    #[test]
    fn fold_continuation_lines() {
        let mut builder = HeaderBlockBuilder::new();
        builder.push_line("X-Long: first").unwrap();
        builder.push_line("\tsecond").unwrap();

        let block = builder.finish().unwrap();
        assert_eq!(block.headers.get("x-long").unwrap(), "first second");
    }

    #[test]
    fn reject_invalid_lines() {
        let mut builder = HeaderBlockBuilder::new();
        assert!(builder.push_line(" orphan").is_err());
        assert!(builder.push_line("no colon here").is_err());
        assert!(builder.push_line(": empty name").is_err());
    }

    #[test]
    fn reject_invalid_preview() {
        let mut builder = HeaderBlockBuilder::new();
        builder.push_line("Preview: -1").unwrap();
        assert!(matches!(builder.finish(), Err(ParseError::InvalidHeader { .. })));
    }

    #[test]
    fn reject_malformed_encapsulated() {
        let mut builder = HeaderBlockBuilder::new();
        builder.push_line("Encapsulated: res-body=0, res-hdr=10").unwrap();
        assert!(matches!(builder.finish(), Err(ParseError::MalformedEncapsulation { .. })));
    }

    #[test]
    fn trailer_lines() {
        assert_eq!(parse_trailer_line("Use-Original-Body: 5").unwrap(), 5);
        assert_eq!(parse_trailer_line("use-original-body:0").unwrap(), 0);
        assert!(matches!(parse_trailer_line("X-Foo: bar"), Err(ParseError::InvalidTrailer { .. })));
        assert!(parse_trailer_line("Use-Original-Body: x").is_err());
    }
}
