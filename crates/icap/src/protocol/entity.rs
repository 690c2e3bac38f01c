//! Embedded HTTP entities and the explicit reference count that governs the
//! lifetime of their body buffers.
//!
//! Body buffers are [`Bytes`], so sharing a slice of a body between frames is a
//! cheap reference-counted clone. On top of that every entity and every ICAP
//! message carries a [`RefCount`] mirroring the retain/release discipline of
//! the surrounding pipeline: an entity drops its content once its count
//! reaches zero.

use bytes::Bytes;
use http::{Request, Response};
use tracing::trace;

use crate::ensure;
use crate::protocol::RefCountError;

/// Head of an embedded HTTP request.
pub type HttpRequestHead = Request<()>;

/// Head of an embedded HTTP response.
pub type HttpResponseHead = Response<()>;

/// Embedded HTTP request with its optional body.
pub type FullHttpRequest = HttpEntity<HttpRequestHead>;

/// Embedded HTTP response with its optional body.
pub type FullHttpResponse = HttpEntity<HttpResponseHead>;

/// A reference count that starts at one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefCount {
    count: usize,
}

impl RefCount {
    pub fn new() -> Self {
        Self { count: 1 }
    }

    #[inline]
    pub fn get(&self) -> usize {
        self.count
    }

    pub fn retain(&mut self, increment: usize) {
        self.count = self.count.saturating_add(increment);
    }

    /// Checks that `decrement` can be released without underflow.
    pub fn check_release(&self, decrement: usize) -> Result<(), RefCountError> {
        ensure!(
            decrement <= self.count,
            RefCountError::Underflow { current: self.count, decrement }
        );
        Ok(())
    }

    /// Decrements the count, returns true when it reaches zero.
    pub fn release(&mut self, decrement: usize) -> Result<bool, RefCountError> {
        self.check_release(decrement)?;
        self.count -= decrement;
        Ok(self.count == 0)
    }
}

impl Default for RefCount {
    fn default() -> Self {
        Self::new()
    }
}

/// An embedded HTTP head plus an optional content buffer.
///
/// `content == None` means the entity carries no body at all, while
/// `Some(Bytes::new())` is an empty body that may still be announced on the
/// wire (e.g. a zero byte preview).
#[derive(Debug, Clone)]
pub struct HttpEntity<H> {
    head: H,
    content: Option<Bytes>,
    ref_count: RefCount,
}

impl<H> HttpEntity<H> {
    pub fn new(head: H) -> Self {
        Self { head, content: None, ref_count: RefCount::new() }
    }

    pub fn with_content(head: H, content: Bytes) -> Self {
        Self { head, content: Some(content), ref_count: RefCount::new() }
    }

    pub fn head(&self) -> &H {
        &self.head
    }

    pub fn head_mut(&mut self) -> &mut H {
        &mut self.head
    }

    pub fn content(&self) -> Option<&Bytes> {
        self.content.as_ref()
    }

    pub fn set_content(&mut self, content: Option<Bytes>) {
        self.content = content;
    }

    pub fn take_content(&mut self) -> Option<Bytes> {
        self.content.take()
    }

    /// Number of content bytes, zero when there is no content.
    pub fn content_len(&self) -> usize {
        self.content.as_ref().map_or(0, Bytes::len)
    }

    pub fn ref_count(&self) -> usize {
        self.ref_count.get()
    }

    pub fn retain(&mut self, increment: usize) -> &mut Self {
        self.ref_count.retain(increment);
        self
    }

    pub(crate) fn check_release(&self, decrement: usize) -> Result<(), RefCountError> {
        self.ref_count.check_release(decrement)
    }

    /// Releases `decrement` references; the content buffer is dropped when the
    /// count reaches zero.
    pub fn release(&mut self, decrement: usize) -> Result<bool, RefCountError> {
        let deallocated = self.ref_count.release(decrement)?;
        if deallocated {
            trace!(len = self.content_len(), "reference count reached zero, dropping entity content");
            self.content = None;
        }
        Ok(deallocated)
    }

    pub fn touch(&self, hint: &str) {
        trace!(hint, ref_count = self.ref_count.get(), content_len = self.content_len(), "touch http entity");
    }

    pub fn into_parts(self) -> (H, Option<Bytes>) {
        (self.head, self.content)
    }
}
