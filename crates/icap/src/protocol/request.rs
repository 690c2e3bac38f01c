//! ICAP request, RFC 3507 section 4.8 to 4.10.

use bytes::{BufMut, BytesMut};

use crate::protocol::{FullHttpRequest, FullHttpResponse, IcapMessage, IcapMethod, IcapVersion, MessageParts, ParseError};

/// An ICAP request: `METHOD SP URI SP ICAP/VERSION`.
#[derive(Debug, Clone)]
pub struct IcapRequest {
    method: IcapMethod,
    uri: String,
    parts: MessageParts,
}

impl IcapRequest {
    pub fn new<U: Into<String>>(method: IcapMethod, uri: U) -> Self {
        Self { method, uri: uri.into(), parts: MessageParts::new(IcapVersion::ICAP_10) }
    }

    pub fn method(&self) -> IcapMethod {
        self.method
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn with_preview(mut self, preview: usize) -> Self {
        self.parts.set_preview_amount(Some(preview));
        self
    }

    pub fn with_http_request(mut self, http_request: FullHttpRequest) -> Self {
        self.parts.set_http_request(Some(http_request));
        self
    }

    pub fn with_http_response(mut self, http_response: FullHttpResponse) -> Self {
        self.parts.set_http_response(Some(http_response));
        self
    }
}

impl AsRef<MessageParts> for IcapRequest {
    fn as_ref(&self) -> &MessageParts {
        &self.parts
    }
}

impl AsMut<MessageParts> for IcapRequest {
    fn as_mut(&mut self) -> &mut MessageParts {
        &mut self.parts
    }
}

impl IcapMessage for IcapRequest {
    fn parts(&self) -> &MessageParts {
        &self.parts
    }

    fn parts_mut(&mut self) -> &mut MessageParts {
        &mut self.parts
    }

    fn from_initial_line(tokens: [&str; 3]) -> Result<Self, ParseError> {
        let [method, uri, version] = tokens;
        let method = method.parse::<IcapMethod>()?;
        let version = version.parse::<IcapVersion>()?;

        Ok(Self { method, uri: uri.to_string(), parts: MessageParts::new(version) })
    }

    fn encode_initial_line(&self, dst: &mut BytesMut) {
        dst.put_slice(self.method.as_str().as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(self.uri.as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(self.parts.version().to_string().as_bytes());
        dst.put_slice(b"\r\n");
    }
}
