//! Embedded HTTP/1.x heads (`req-hdr` and `res-hdr` entities).
//!
//! Decoding relies on `httparse`: a head is only taken from the buffer once it
//! is complete, otherwise the buffer is left untouched. Encoding writes the
//! head back in HTTP/1.x wire format.

use bytes::{Buf, BufMut, BytesMut};
use http::{HeaderMap, HeaderName, HeaderValue, Request, Response, Version};
use httparse::Status;
use tracing::trace;

use crate::ensure;
use crate::protocol::{HttpRequestHead, HttpResponseHead, ParseError};

/// Maximum number of header fields in an embedded HTTP head
const MAX_HEADER_NUM: usize = 64;

pub(crate) fn decode_request_head(src: &mut BytesMut, max_size: usize) -> Result<Option<HttpRequestHead>, ParseError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
    let mut req = httparse::Request::new(&mut headers);

    match req.parse(src).map_err(map_httparse_error)? {
        Status::Complete(head_len) => {
            ensure!(head_len <= max_size, ParseError::header_block_too_large(head_len, max_size));
            trace!(head_len, "parsed encapsulated http request head");

            let method = req.method.ok_or_else(|| ParseError::invalid_http_head("missing method"))?;
            let path = req.path.ok_or_else(|| ParseError::invalid_http_head("missing uri"))?;
            let mut builder = Request::builder().method(method).uri(path).version(http_version(req.version)?);
            if let Some(header_map) = builder.headers_mut() {
                copy_headers(req.headers, header_map)?;
            }
            let head = builder.body(()).map_err(|e| ParseError::invalid_http_head(e.to_string()))?;

            src.advance(head_len);
            Ok(Some(head))
        }
        Status::Partial => {
            ensure!(src.len() <= max_size, ParseError::header_block_too_large(src.len(), max_size));
            Ok(None)
        }
    }
}

pub(crate) fn decode_response_head(src: &mut BytesMut, max_size: usize) -> Result<Option<HttpResponseHead>, ParseError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
    let mut res = httparse::Response::new(&mut headers);

    match res.parse(src).map_err(map_httparse_error)? {
        Status::Complete(head_len) => {
            ensure!(head_len <= max_size, ParseError::header_block_too_large(head_len, max_size));
            trace!(head_len, "parsed encapsulated http response head");

            let status = res.code.ok_or_else(|| ParseError::invalid_http_head("missing status code"))?;
            let mut builder = Response::builder().status(status).version(http_version(res.version)?);
            if let Some(header_map) = builder.headers_mut() {
                copy_headers(res.headers, header_map)?;
            }
            let head = builder.body(()).map_err(|e| ParseError::invalid_http_head(e.to_string()))?;

            src.advance(head_len);
            Ok(Some(head))
        }
        Status::Partial => {
            ensure!(src.len() <= max_size, ParseError::header_block_too_large(src.len(), max_size));
            Ok(None)
        }
    }
}

fn map_httparse_error(e: httparse::Error) -> ParseError {
    match e {
        httparse::Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
        e => ParseError::invalid_http_head(e.to_string()),
    }
}

fn http_version(version: Option<u8>) -> Result<Version, ParseError> {
    match version {
        Some(0) => Ok(Version::HTTP_10),
        Some(1) => Ok(Version::HTTP_11),
        v => Err(ParseError::invalid_http_head(format!("unsupported http version: {v:?}"))),
    }
}

fn copy_headers(parsed: &[httparse::Header<'_>], headers: &mut HeaderMap) -> Result<(), ParseError> {
    headers.reserve(parsed.len());
    for header in parsed {
        let name = HeaderName::from_bytes(header.name.as_bytes())
            .map_err(|_| ParseError::invalid_http_head(format!("invalid header name: {}", header.name)))?;
        let value = HeaderValue::from_bytes(header.value)
            .map_err(|_| ParseError::invalid_http_head(format!("invalid value of header {}", header.name)))?;
        headers.append(name, value);
    }
    Ok(())
}

pub(crate) fn encode_request_head(head: &HttpRequestHead, dst: &mut BytesMut) {
    dst.put_slice(head.method().as_str().as_bytes());
    dst.put_u8(b' ');
    dst.put_slice(head.uri().to_string().as_bytes());
    dst.put_u8(b' ');
    dst.put_slice(version_str(head.version()).as_bytes());
    dst.put_slice(b"\r\n");
    encode_headers(head.headers(), dst);
}

pub(crate) fn encode_response_head(head: &HttpResponseHead, dst: &mut BytesMut) {
    dst.put_slice(version_str(head.version()).as_bytes());
    dst.put_u8(b' ');
    dst.put_slice(head.status().as_str().as_bytes());
    dst.put_u8(b' ');
    dst.put_slice(head.status().canonical_reason().unwrap_or_default().as_bytes());
    dst.put_slice(b"\r\n");
    encode_headers(head.headers(), dst);
}

/// Writes header lines followed by the blank line ending the block.
pub(crate) fn encode_headers(headers: &HeaderMap, dst: &mut BytesMut) {
    for (header_name, header_value) in headers {
        dst.put_slice(header_name.as_ref());
        dst.put_slice(b": ");
        dst.put_slice(header_value.as_ref());
        dst.put_slice(b"\r\n");
    }
    dst.put_slice(b"\r\n");
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_10 => "HTTP/1.0",
        _ => "HTTP/1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use indoc::indoc;

    #[test]
    fn decode_request() {
        let str = indoc! {"
            GET /origin-resource HTTP/1.1\r
            Host: www.origin-server.com\r
            Accept: text/html, text/plain\r
            \r
            rest"};
        let mut src = BytesMut::from(str);

        let head = decode_request_head(&mut src, 8192).unwrap().unwrap();

        assert_eq!(head.method(), Method::GET);
        assert_eq!(head.uri().path(), "/origin-resource");
        assert_eq!(head.version(), Version::HTTP_11);
        assert_eq!(head.headers().get(http::header::HOST).unwrap(), "www.origin-server.com");
        assert_eq!(&src[..], b"rest");
    }

    #[test]
    fn decode_partial_response_keeps_buffer() {
        let mut src = BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n"[..]);
        assert!(decode_response_head(&mut src, 8192).unwrap().is_none());
        assert_eq!(src.len(), 42);

        src.extend_from_slice(b"\r\n");
        let head = decode_response_head(&mut src, 8192).unwrap().unwrap();
        assert_eq!(head.status(), http::StatusCode::OK);
        assert!(src.is_empty());
    }

    #[test]
    fn decode_too_large_head() {
        let mut src = BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n"[..]);
        let result = decode_response_head(&mut src, 16);
        assert!(matches!(result, Err(ParseError::HeaderBlockTooLarge { .. })));
    }

    #[test]
    fn encode_heads() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("http://www.origin-server.com/cgi-bin/submit")
            .header(http::header::HOST, "www.origin-server.com")
            .body(())
            .unwrap();
        let mut dst = BytesMut::new();
        encode_request_head(&request, &mut dst);
        assert_eq!(
            &dst[..],
            &b"POST http://www.origin-server.com/cgi-bin/submit HTTP/1.1\r\nhost: www.origin-server.com\r\n\r\n"[..]
        );

        let response = Response::builder().status(404).body(()).unwrap();
        let mut dst = BytesMut::new();
        encode_response_head(&response, &mut dst);
        assert_eq!(&dst[..], b"HTTP/1.1 404 Not Found\r\n\r\n");
    }
}
