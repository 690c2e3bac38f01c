use std::any::Any;
use std::fmt;

use bytes::Bytes;

use crate::protocol::EntityKind;

/// A unit travelling through an ICAP pipeline.
///
/// The decoder produces one `Head`, zero or more `Chunk`s and, when the head
/// declared a body, one `Trailer`. The separator produces the same sequence
/// for an outbound message. Units are correlated by stream order only.
///
/// `Other` carries objects injected by foreign pipeline stages; the codec
/// never produces it and the aggregator passes it through untouched.
pub enum Message<M> {
    /// An ICAP request or response head
    Head(M),
    /// A piece of the encapsulated body
    Chunk(IcapChunk),
    /// The terminating marker of the body
    Trailer(IcapChunkTrailer),
    /// Anything else
    Other(Box<dyn Any + Send>),
}

impl<M> Message<M> {
    /// Returns true if this unit is a message head
    #[inline]
    pub fn is_head(&self) -> bool {
        matches!(self, Message::Head(_))
    }

    /// Returns true if this unit is a body chunk
    #[inline]
    pub fn is_chunk(&self) -> bool {
        matches!(self, Message::Chunk(_))
    }

    /// Returns true if this unit terminates a body
    #[inline]
    pub fn is_trailer(&self) -> bool {
        matches!(self, Message::Trailer(_))
    }

    pub fn into_head(self) -> Option<M> {
        match self {
            Message::Head(head) => Some(head),
            _ => None,
        }
    }

    pub fn into_chunk(self) -> Option<IcapChunk> {
        match self {
            Message::Chunk(chunk) => Some(chunk),
            _ => None,
        }
    }

    pub fn into_trailer(self) -> Option<IcapChunkTrailer> {
        match self {
            Message::Trailer(trailer) => Some(trailer),
            _ => None,
        }
    }
}

impl<M: fmt::Debug> fmt::Debug for Message<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Head(head) => f.debug_tuple("Head").field(head).finish(),
            Message::Chunk(chunk) => f.debug_tuple("Chunk").field(chunk).finish(),
            Message::Trailer(trailer) => f.debug_tuple("Trailer").field(trailer).finish(),
            Message::Other(_) => f.write_str("Other(..)"),
        }
    }
}

impl<M> From<IcapChunk> for Message<M> {
    fn from(chunk: IcapChunk) -> Self {
        Message::Chunk(chunk)
    }
}

impl<M> From<IcapChunkTrailer> for Message<M> {
    fn from(trailer: IcapChunkTrailer) -> Self {
        Message::Trailer(trailer)
    }
}

/// Which encapsulated entity carries the body of a message.
///
/// `null-body` is represented by the absence of a body type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyType {
    ReqBody,
    ResBody,
    OptBody,
}

impl BodyType {
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            BodyType::ReqBody => EntityKind::ReqBody,
            BodyType::ResBody => EntityKind::ResBody,
            BodyType::OptBody => EntityKind::OptBody,
        }
    }

    /// Maps a body entity to a body type, `null-body` and heads map to `None`.
    pub fn from_entity_kind(kind: EntityKind) -> Option<BodyType> {
        match kind {
            EntityKind::ReqBody => Some(BodyType::ReqBody),
            EntityKind::ResBody => Some(BodyType::ResBody),
            EntityKind::OptBody => Some(BodyType::OptBody),
            EntityKind::NullBody | EntityKind::ReqHdr | EntityKind::ResHdr => None,
        }
    }
}

/// A piece of an encapsulated body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcapChunk {
    content: Bytes,
    preview_chunk: bool,
    early_termination: bool,
}

impl IcapChunk {
    pub fn new(content: Bytes) -> Self {
        Self { content, preview_chunk: false, early_termination: false }
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn into_content(self) -> Bytes {
        self.content
    }

    pub fn is_preview_chunk(&self) -> bool {
        self.preview_chunk
    }

    pub fn set_preview_chunk(&mut self, preview_chunk: bool) -> &mut Self {
        self.preview_chunk = preview_chunk;
        self
    }

    pub fn is_early_termination(&self) -> bool {
        self.early_termination
    }

    pub fn set_early_termination(&mut self, early_termination: bool) -> &mut Self {
        self.early_termination = early_termination;
        self
    }
}

/// The terminating marker of an encapsulated body.
///
/// Trailing header fields other than `Use-Original-Body` are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IcapChunkTrailer {
    preview_chunk: bool,
    early_termination: bool,
    use_original_body: Option<usize>,
}

impl IcapChunkTrailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_preview_chunk(&self) -> bool {
        self.preview_chunk
    }

    pub fn set_preview_chunk(&mut self, preview_chunk: bool) -> &mut Self {
        self.preview_chunk = preview_chunk;
        self
    }

    pub fn is_early_termination(&self) -> bool {
        self.early_termination
    }

    pub fn set_early_termination(&mut self, early_termination: bool) -> &mut Self {
        self.early_termination = early_termination;
        self
    }

    pub fn use_original_body(&self) -> Option<usize> {
        self.use_original_body
    }

    pub fn set_use_original_body(&mut self, use_original_body: Option<usize>) -> &mut Self {
        self.use_original_body = use_original_body;
        self
    }
}
