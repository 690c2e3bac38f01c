//! State shared by ICAP requests and responses.
//!
//! [`MessageParts`] holds everything common to both variants: version, header
//! map, the decoded `Encapsulated` descriptor, the preview amount, the embedded
//! HTTP entities, the body type and the reference count. The [`IcapMessage`]
//! trait is implemented by [`IcapRequest`](crate::protocol::IcapRequest) and
//! [`IcapResponse`](crate::protocol::IcapResponse) and is what the codec is
//! generic over.

use bytes::{Bytes, BytesMut};
use http::HeaderMap;
use tracing::trace;

use crate::protocol::{
    BodyType, Encapsulated, FullHttpRequest, FullHttpResponse, IcapVersion, ParseError, RefCountError, RefCount,
};

/// Name of the preview header on the wire.
pub const PREVIEW: &str = "Preview";

#[derive(Debug, Clone, Default)]
pub struct MessageParts {
    version: IcapVersion,
    headers: HeaderMap,
    encapsulated: Option<Encapsulated>,
    preview: Option<usize>,
    http_request: Option<FullHttpRequest>,
    http_response: Option<FullHttpResponse>,
    body_type: Option<BodyType>,
    ref_count: RefCount,
}

impl MessageParts {
    pub fn new(version: IcapVersion) -> Self {
        Self { version, ..Default::default() }
    }

    pub fn version(&self) -> IcapVersion {
        self.version
    }

    pub fn set_version(&mut self, version: IcapVersion) -> &mut Self {
        self.version = version;
        self
    }

    /// ICAP headers, `Encapsulated` and `Preview` excluded.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub(crate) fn set_headers(&mut self, headers: HeaderMap) {
        self.headers = headers;
    }

    /// The descriptor received on the wire, `None` for messages built locally.
    pub fn encapsulated(&self) -> Option<&Encapsulated> {
        self.encapsulated.as_ref()
    }

    pub fn set_encapsulated(&mut self, encapsulated: Option<Encapsulated>) -> &mut Self {
        self.encapsulated = encapsulated;
        self
    }

    /// The negotiated preview size in bytes, `None` when no preview is used.
    pub fn preview_amount(&self) -> Option<usize> {
        self.preview
    }

    pub fn set_preview_amount(&mut self, preview: Option<usize>) -> &mut Self {
        self.preview = preview;
        self
    }

    #[inline]
    pub fn is_preview_message(&self) -> bool {
        self.preview.is_some()
    }

    pub fn http_request(&self) -> Option<&FullHttpRequest> {
        self.http_request.as_ref()
    }

    pub fn http_request_mut(&mut self) -> Option<&mut FullHttpRequest> {
        self.http_request.as_mut()
    }

    pub fn set_http_request(&mut self, http_request: Option<FullHttpRequest>) -> &mut Self {
        self.http_request = http_request;
        self
    }

    pub fn http_response(&self) -> Option<&FullHttpResponse> {
        self.http_response.as_ref()
    }

    pub fn http_response_mut(&mut self) -> Option<&mut FullHttpResponse> {
        self.http_response.as_mut()
    }

    pub fn set_http_response(&mut self, http_response: Option<FullHttpResponse>) -> &mut Self {
        self.http_response = http_response;
        self
    }

    /// Which entity carries the body, `None` for no body.
    pub fn body_type(&self) -> Option<BodyType> {
        self.body_type
    }

    pub fn set_body_type(&mut self, body_type: Option<BodyType>) -> &mut Self {
        self.body_type = body_type;
        self
    }

    pub fn ref_count(&self) -> usize {
        self.ref_count.get()
    }

    /// Increments the count of the message and of each embedded entity.
    pub fn retain(&mut self, increment: usize) -> &mut Self {
        self.ref_count.retain(increment);
        if let Some(request) = &mut self.http_request {
            request.retain(increment);
        }
        if let Some(response) = &mut self.http_response {
            response.retain(increment);
        }
        self
    }

    /// Decrements the count of the message and of each embedded entity.
    ///
    /// Returns true when the message count reaches zero. Nothing changes when
    /// any of the counts would go below zero.
    pub fn release(&mut self, decrement: usize) -> Result<bool, RefCountError> {
        self.ref_count.check_release(decrement)?;
        if let Some(request) = &self.http_request {
            request.check_release(decrement)?;
        }
        if let Some(response) = &self.http_response {
            response.check_release(decrement)?;
        }

        if let Some(request) = &mut self.http_request {
            request.release(decrement)?;
        }
        if let Some(response) = &mut self.http_response {
            response.release(decrement)?;
        }
        self.ref_count.release(decrement)
    }

    /// Forwards a liveness hint to the embedded entities.
    pub fn touch(&self, hint: &str) {
        trace!(hint, ref_count = self.ref_count.get(), "touch icap message");
        if let Some(request) = &self.http_request {
            request.touch(hint);
        }
        if let Some(response) = &self.http_response {
            response.touch(hint);
        }
    }
}

/// Behaviour shared by ICAP requests and responses.
pub trait IcapMessage: Sized {
    fn parts(&self) -> &MessageParts;

    fn parts_mut(&mut self) -> &mut MessageParts;

    /// Creates a message from the three tokens of an initial line.
    ///
    /// Any error is reported as [`ParseError::MalformedInitialLine`].
    fn from_initial_line(tokens: [&str; 3]) -> Result<Self, ParseError>;

    /// Writes the initial line, CRLF included.
    fn encode_initial_line(&self, dst: &mut BytesMut);

    /// Body not carried by an embedded HTTP entity (`opt-body`).
    fn content(&self) -> Option<&Bytes> {
        None
    }

    /// Attaches an aggregated `opt-body`.
    fn set_content(&mut self, content: Bytes) -> Result<(), ParseError> {
        Err(ParseError::invalid_body(format!("opt-body of {} bytes is not supported by this message", content.len())))
    }

    fn use_original_body(&self) -> Option<usize> {
        None
    }

    fn set_use_original_body(&mut self, _use_original_body: Option<usize>) {}

    /// Whether the encoder writes an `Encapsulated` header for this message.
    fn has_encapsulated_header(&self) -> bool {
        true
    }

    fn headers(&self) -> &HeaderMap {
        self.parts().headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.parts_mut().headers_mut()
    }

    fn preview_amount(&self) -> Option<usize> {
        self.parts().preview_amount()
    }

    fn is_preview_message(&self) -> bool {
        self.parts().is_preview_message()
    }

    fn body_type(&self) -> Option<BodyType> {
        self.parts().body_type()
    }

    fn http_request(&self) -> Option<&FullHttpRequest> {
        self.parts().http_request()
    }

    fn http_response(&self) -> Option<&FullHttpResponse> {
        self.parts().http_response()
    }

    fn retain(&mut self, increment: usize) -> &mut Self {
        self.parts_mut().retain(increment);
        self
    }

    fn release(&mut self, decrement: usize) -> Result<bool, RefCountError> {
        self.parts_mut().release(decrement)
    }

    fn touch(&self, hint: &str) {
        self.parts().touch(hint);
    }
}
