use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IcapError {
    #[error("decode error: {source}")]
    DecodeError {
        #[from]
        source: ParseError,
    },

    #[error("encode error: {source}")]
    EncodeError {
        #[from]
        source: SendError,
    },
}

/// Errors raised while turning bytes into ICAP units.
///
/// Every variant except [`ParseError::MalformedInitialLine`] is fatal for the
/// connection: the decoder stops producing units and the transport is expected
/// to close. A malformed initial line is dropped and the decoder resyncs on the
/// next line.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("line too long, current: {current_size} exceed the limit {max_size}")]
    LineTooLong { current_size: usize, max_size: usize },

    #[error("header block too large, current: {current_size} exceed the limit {max_size}")]
    HeaderBlockTooLarge { current_size: usize, max_size: usize },

    #[error("chunk too large, size: {size} exceed the limit {max_size}")]
    ChunkTooLarge { size: u64, max_size: usize },

    #[error("malformed encapsulated header: {reason}")]
    MalformedEncapsulation { reason: String },

    #[error("malformed initial line: {reason}")]
    MalformedInitialLine { reason: String },

    #[error("invalid decoder state: {reason}")]
    InvalidState { reason: String },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid chunk: {reason}")]
    InvalidChunk { reason: String },

    #[error("invalid chunk trailer: {reason}")]
    InvalidTrailer { reason: String },

    #[error("invalid encapsulated http head: {reason}")]
    InvalidHttpHead { reason: String },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("content too large, current: {current_size} exceed the limit {max_size}")]
    ContentTooLarge { current_size: usize, max_size: usize },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn line_too_long(current_size: usize, max_size: usize) -> Self {
        Self::LineTooLong { current_size, max_size }
    }

    pub fn header_block_too_large(current_size: usize, max_size: usize) -> Self {
        Self::HeaderBlockTooLarge { current_size, max_size }
    }

    pub fn chunk_too_large(size: u64, max_size: usize) -> Self {
        Self::ChunkTooLarge { size, max_size }
    }

    pub fn malformed_encapsulation<S: ToString>(str: S) -> Self {
        Self::MalformedEncapsulation { reason: str.to_string() }
    }

    pub fn malformed_initial_line<S: ToString>(str: S) -> Self {
        Self::MalformedInitialLine { reason: str.to_string() }
    }

    pub fn invalid_state<S: ToString>(str: S) -> Self {
        Self::InvalidState { reason: str.to_string() }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_chunk<S: ToString>(str: S) -> Self {
        Self::InvalidChunk { reason: str.to_string() }
    }

    pub fn invalid_trailer<S: ToString>(str: S) -> Self {
        Self::InvalidTrailer { reason: str.to_string() }
    }

    pub fn invalid_http_head<S: ToString>(str: S) -> Self {
        Self::InvalidHttpHead { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn content_too_large(current_size: usize, max_size: usize) -> Self {
        Self::ContentTooLarge { current_size, max_size }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Returns true if decoding may continue after this error.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedInitialLine { .. })
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("inconsistent encapsulation: {reason}")]
    InconsistentEncapsulation { reason: String },

    #[error("unexpected frame: {reason}")]
    UnexpectedFrame { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn inconsistent_encapsulation<S: ToString>(str: S) -> Self {
        Self::InconsistentEncapsulation { reason: str.to_string() }
    }

    pub fn unexpected_frame<S: ToString>(str: S) -> Self {
        Self::UnexpectedFrame { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

/// Misuse of the explicit reference count carried by messages and their
/// embedded HTTP entities.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefCountError {
    #[error("release of {decrement} would take the reference count {current} below zero")]
    Underflow { current: usize, decrement: usize },
}
