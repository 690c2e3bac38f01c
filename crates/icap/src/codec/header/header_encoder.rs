//! ICAP head encoder
//!
//! Serializes the initial line and header block of an ICAP message followed
//! by its embedded HTTP heads. The `Encapsulated` header is computed from the
//! byte lengths of those heads and from the message's body type:
//!
//! ```text
//! req-hdr=0, res-hdr=<len(req head)>, <body or null-body>=<len(all heads)>
//! ```

use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;
use tracing::error;

use crate::codec::header::http_head::{encode_request_head, encode_response_head};
use crate::protocol::{BodyType, ENCAPSULATED, EntityKind, IcapMessage, PREVIEW, SendError};

/// Initial buffer size allocated for head serialization
const INIT_HEAD_SIZE: usize = 1024;

/// Encoder for ICAP heads implementing the [`Encoder`] trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderEncoder;

impl<M: IcapMessage> Encoder<&M> for HeaderEncoder {
    type Error = SendError;

    /// Encodes the head of `item` into `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::InconsistentEncapsulation`] when the body type names
    /// an entity the message does not carry. Nothing is written in that case.
    fn encode(&mut self, item: &M, dst: &mut BytesMut) -> Result<(), Self::Error> {
        check_body_source(item)?;

        let parts = item.parts();

        let mut http_heads = BytesMut::new();
        let mut encapsulated = Vec::with_capacity(3);
        if let Some(request) = parts.http_request() {
            encapsulated.push((EntityKind::ReqHdr, http_heads.len()));
            encode_request_head(request.head(), &mut http_heads);
        }
        if let Some(response) = parts.http_response() {
            encapsulated.push((EntityKind::ResHdr, http_heads.len()));
            encode_response_head(response.head(), &mut http_heads);
        }
        let body_kind = parts.body_type().map_or(EntityKind::NullBody, |body_type| body_type.entity_kind());
        encapsulated.push((body_kind, http_heads.len()));

        dst.reserve(INIT_HEAD_SIZE + http_heads.len());
        item.encode_initial_line(dst);

        for (header_name, header_value) in parts.headers() {
            dst.put_slice(header_name.as_ref());
            dst.put_slice(b": ");
            dst.put_slice(header_value.as_ref());
            dst.put_slice(b"\r\n");
        }

        if let Some(preview) = parts.preview_amount() {
            dst.put_slice(PREVIEW.as_bytes());
            dst.put_slice(b": ");
            dst.put_slice(preview.to_string().as_bytes());
            dst.put_slice(b"\r\n");
        }

        if item.has_encapsulated_header() {
            dst.put_slice(ENCAPSULATED.as_bytes());
            dst.put_slice(b": ");
            for (index, (kind, offset)) in encapsulated.iter().enumerate() {
                if index > 0 {
                    dst.put_slice(b", ");
                }
                dst.put_slice(kind.as_str().as_bytes());
                dst.put_u8(b'=');
                dst.put_slice(offset.to_string().as_bytes());
            }
            dst.put_slice(b"\r\n");
        }

        dst.put_slice(b"\r\n");
        dst.put_slice(&http_heads);
        Ok(())
    }
}

fn check_body_source<M: IcapMessage>(item: &M) -> Result<(), SendError> {
    let parts = item.parts();
    let consistent = match parts.body_type() {
        None => true,
        Some(BodyType::ReqBody) => parts.http_request().is_some(),
        Some(BodyType::ResBody) => parts.http_response().is_some(),
        Some(BodyType::OptBody) => item.content().is_some(),
    };

    if !consistent {
        error!(body_type = ?parts.body_type(), "body type names an entity the message does not carry");
        return Err(SendError::inconsistent_encapsulation(format!(
            "body type {:?} has no backing entity",
            parts.body_type()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{HttpEntity, IcapMethod, IcapRequest, IcapResponse, IcapStatus};
    use bytes::Bytes;
    use http::{HeaderValue, Request, Response};
    use indoc::indoc;

    fn encode<M: IcapMessage>(message: &M) -> Result<String, SendError> {
        let mut dst = BytesMut::new();
        HeaderEncoder.encode(message, &mut dst)?;
        Ok(String::from_utf8(dst.to_vec()).unwrap())
    }

    #[test]
    fn encode_reqmod_without_body() {
        let http_request = Request::builder().uri("/").header("Host", "www.origin-server.com").body(()).unwrap();
        let mut request = IcapRequest::new(IcapMethod::ReqMod, "icap://icap.mimo.ch:1344/reqmod")
            .with_http_request(HttpEntity::new(http_request));
        request.headers_mut().insert(http::header::HOST, HeaderValue::from_static("icap.google.com:1344"));

        let expected = indoc! {"
            REQMOD icap://icap.mimo.ch:1344/reqmod ICAP/1.0\r
            host: icap.google.com:1344\r
            Encapsulated: req-hdr=0, null-body=47\r
            \r
            GET / HTTP/1.1\r
            host: www.origin-server.com\r
            \r
            "};
        assert_eq!(encode(&request).unwrap(), expected);
    }

    #[test]
    fn encode_respmod_offsets() {
        let http_request = Request::builder().uri("/").body(()).unwrap();
        let http_response = Response::builder().status(200).body(()).unwrap();
        let mut response = IcapResponse::new(IcapStatus::OK)
            .with_http_request(HttpEntity::new(http_request))
            .with_http_response(HttpEntity::with_content(http_response, Bytes::from_static(b"data")));
        response.parts_mut().set_body_type(Some(BodyType::ResBody));

        let encoded = encode(&response).unwrap();
        // "GET / HTTP/1.1\r\n\r\n" is 18 bytes, "HTTP/1.1 200 OK\r\n\r\n" is 19
        assert!(encoded.contains("Encapsulated: req-hdr=0, res-hdr=18, res-body=37\r\n"));
        assert!(encoded.ends_with("GET / HTTP/1.1\r\n\r\nHTTP/1.1 200 OK\r\n\r\n"));
    }

    #[test]
    fn encode_preview_and_options_body() {
        let mut response = IcapResponse::new(IcapStatus::OK).with_content(Bytes::from_static(b"options body"));
        response.parts_mut().set_body_type(Some(BodyType::OptBody));

        assert_eq!(encode(&response).unwrap(), "ICAP/1.0 200 OK\r\nEncapsulated: opt-body=0\r\n\r\n");

        let request = IcapRequest::new(IcapMethod::RespMod, "icap://icap/respmod").with_preview(4);
        assert_eq!(
            encode(&request).unwrap(),
            "RESPMOD icap://icap/respmod ICAP/1.0\r\nPreview: 4\r\nEncapsulated: null-body=0\r\n\r\n"
        );
    }

    #[test]
    fn continue_response_has_no_encapsulated_header() {
        let response = IcapResponse::new(IcapStatus::CONTINUE);
        assert_eq!(encode(&response).unwrap(), "ICAP/1.0 100 Continue\r\n\r\n");
    }

    #[test]
    fn reject_inconsistent_body_type() {
        let mut request = IcapRequest::new(IcapMethod::ReqMod, "icap://icap/reqmod");
        request.parts_mut().set_body_type(Some(BodyType::ReqBody));

        let mut dst = BytesMut::new();
        let result = HeaderEncoder.encode(&request, &mut dst);
        assert!(matches!(result, Err(SendError::InconsistentEncapsulation { .. })));
        assert!(dst.is_empty());
    }
}
