//! ICAP response, RFC 3507 section 4.3.3.

use bytes::{BufMut, Bytes, BytesMut};

use crate::protocol::{FullHttpRequest, FullHttpResponse, IcapMessage, IcapStatus, IcapVersion, MessageParts, ParseError};

/// An ICAP response: `ICAP/VERSION SP STATUS SP REASON`.
#[derive(Debug, Clone)]
pub struct IcapResponse {
    status: IcapStatus,
    reason: String,
    content: Option<Bytes>,
    use_original_body: Option<usize>,
    parts: MessageParts,
}

impl IcapResponse {
    /// Creates a response using the canonical reason phrase of `status`.
    pub fn new(status: IcapStatus) -> Self {
        Self {
            status,
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            content: None,
            use_original_body: None,
            parts: MessageParts::new(IcapVersion::ICAP_10),
        }
    }

    pub fn status(&self) -> IcapStatus {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn with_reason<S: Into<String>>(mut self, reason: S) -> Self {
        self.reason = reason.into();
        self
    }

    /// Sets the standalone body sent as `opt-body`.
    pub fn with_content(mut self, content: Bytes) -> Self {
        self.content = Some(content);
        self
    }

    /// Asks the client to reuse the original body from `offset` onward.
    pub fn with_use_original_body(mut self, offset: usize) -> Self {
        self.use_original_body = Some(offset);
        self
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

    pub fn take_content(&mut self) -> Option<Bytes> {
        self.content.take()
    }
}

impl AsRef<MessageParts> for IcapResponse {
    fn as_ref(&self) -> &MessageParts {
        &self.parts
    }
}

impl AsMut<MessageParts> for IcapResponse {
    fn as_mut(&mut self) -> &mut MessageParts {
        &mut self.parts
    }
}

impl IcapMessage for IcapResponse {
    fn parts(&self) -> &MessageParts {
        &self.parts
    }

    fn parts_mut(&mut self) -> &mut MessageParts {
        &mut self.parts
    }

    fn from_initial_line(tokens: [&str; 3]) -> Result<Self, ParseError> {
        let [version, status, reason] = tokens;
        let version = version.parse::<IcapVersion>()?;
        let status = status.parse::<IcapStatus>()?;

        Ok(Self {
            status,
            reason: reason.to_string(),
            content: None,
            use_original_body: None,
            parts: MessageParts::new(version),
        })
    }

    fn encode_initial_line(&self, dst: &mut BytesMut) {
        dst.put_slice(self.parts.version().to_string().as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(self.status.to_string().as_bytes());
        dst.put_u8(b' ');
        dst.put_slice(self.reason.as_bytes());
        dst.put_slice(b"\r\n");
    }

    fn content(&self) -> Option<&Bytes> {
        self.content.as_ref()
    }

    fn set_content(&mut self, content: Bytes) -> Result<(), ParseError> {
        self.content = Some(content);
        Ok(())
    }

    fn use_original_body(&self) -> Option<usize> {
        self.use_original_body
    }

    fn set_use_original_body(&mut self, use_original_body: Option<usize>) {
        self.use_original_body = use_original_body;
    }

    fn has_encapsulated_header(&self) -> bool {
        self.status != IcapStatus::CONTINUE
    }
}
