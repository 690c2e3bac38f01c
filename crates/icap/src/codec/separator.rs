//! Splits a complete outbound message into wire units.
//!
//! [`ChunkSeparator::separate`] picks the body source of a message, tags the
//! message with the matching [`BodyType`] and returns an iterator yielding the
//! head, the body sliced into chunks of at most `chunk_size` bytes, and the
//! trailer. Chunks are zero-copy slices of the source [`Bytes`].

use std::cmp;

use bytes::Bytes;
use tracing::debug;

use crate::codec::config::{ConfigError, positive};
use crate::protocol::{BodyType, IcapChunk, IcapChunkTrailer, IcapMessage, Message};

/// Default maximum size of a chunk written by the separator.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSeparator {
    chunk_size: usize,
}

impl ChunkSeparator {
    /// Creates a separator writing chunks of at most `chunk_size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotPositive`] when `chunk_size` is zero.
    pub fn new(chunk_size: usize) -> Result<Self, ConfigError> {
        Ok(Self { chunk_size: positive("chunk_size", chunk_size)? })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Turns `message` into its head, chunk and trailer units.
    ///
    /// The body source is, by priority: a non-empty standalone response
    /// content (`opt-body`), the embedded HTTP response content, then the
    /// embedded HTTP request content. An embedded content qualifies when it is
    /// non-empty, when `Use-Original-Body` is set or when the message is a
    /// preview. Without a body source only the head is produced.
    pub fn separate<M: IcapMessage>(&self, mut message: M) -> Separated<M> {
        let source = body_source(&message);
        message.parts_mut().set_body_type(source.as_ref().map(|(body_type, _)| *body_type));

        let Some((body_type, body)) = source else {
            debug!("separate icap message without body");
            return Separated { head: Some(message), body: Bytes::new(), chunk_size: self.chunk_size, trailer: None };
        };

        let preview = message.is_preview_message();
        let use_original_body = message.use_original_body();
        let early_termination = preview && message.preview_amount().is_some_and(|amount| body.len() < amount);
        let append_trailer = !body.is_empty() || use_original_body.is_some() || preview;

        debug!(?body_type, len = body.len(), preview, early_termination, append_trailer, "separate icap message");

        let trailer = append_trailer.then(|| {
            let mut trailer = IcapChunkTrailer::new();
            trailer
                .set_preview_chunk(preview)
                .set_early_termination(early_termination)
                .set_use_original_body(use_original_body);
            trailer
        });

        Separated { head: Some(message), body, chunk_size: self.chunk_size, trailer }
    }
}

impl Default for ChunkSeparator {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE }
    }
}

fn body_source<M: IcapMessage>(message: &M) -> Option<(BodyType, Bytes)> {
    if let Some(content) = message.content().filter(|content| !content.is_empty()) {
        return Some((BodyType::OptBody, content.clone()));
    }

    let qualifies =
        |content: &&Bytes| !content.is_empty() || message.use_original_body().is_some() || message.is_preview_message();

    if let Some(content) = message.http_response().and_then(|response| response.content()).filter(qualifies) {
        return Some((BodyType::ResBody, content.clone()));
    }

    if let Some(content) = message.http_request().and_then(|request| request.content()).filter(qualifies) {
        return Some((BodyType::ReqBody, content.clone()));
    }

    None
}

/// Units of one separated message, in wire order.
#[derive(Debug)]
pub struct Separated<M> {
    head: Option<M>,
    body: Bytes,
    chunk_size: usize,
    trailer: Option<IcapChunkTrailer>,
}

impl<M> Iterator for Separated<M> {
    type Item = Message<M>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(head) = self.head.take() {
            return Some(Message::Head(head));
        }

        if !self.body.is_empty() {
            let len = cmp::min(self.chunk_size, self.body.len());
            let mut chunk = IcapChunk::new(self.body.split_to(len));
            if let Some(trailer) = &self.trailer {
                chunk
                    .set_preview_chunk(trailer.is_preview_chunk())
                    .set_early_termination(trailer.is_early_termination());
            }
            return Some(Message::Chunk(chunk));
        }

        self.trailer.take().map(Message::Trailer)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = usize::from(self.head.is_some()) + self.body.len().div_ceil(self.chunk_size) + usize::from(self.trailer.is_some());
        (len, Some(len))
    }
}

impl<M> ExactSizeIterator for Separated<M> {}
