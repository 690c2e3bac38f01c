//! ICAP message decoder
//!
//! [`IcapMessageDecoder`] turns a byte stream into a sequence of [`Message`]
//! units: one head, followed by body chunks and a trailer when the head
//! declares a body. It is an explicit incremental state machine:
//!
//! ```text
//! SkipControlChars -> ReadInitialLine -> ReadHeaders -> ReadHttpHead*
//!     -> BodyDecision -> { Preview | ReadChunkSize | (next message) }
//!     -> ReadChunkData -> ReadChunkDelimiter -> ReadChunkSize ...
//!     -> ReadChunkTrailer -> (next message)
//! ```
//!
//! Every state either consumes a complete grammar element or asks for more
//! input without consuming anything, so the decoder resumes exactly where it
//! stopped when more bytes arrive. Per exchange context lives in a cursor
//! rather than in the states themselves.
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use micro_icap::codec::IcapRequestDecoder;
//! use micro_icap::protocol::{IcapMessage, IcapMethod, Message};
//! use tokio_util::codec::Decoder;
//!
//! let mut decoder = IcapRequestDecoder::new();
//! let mut buffer = BytesMut::from(
//!     &b"OPTIONS icap://icap.example.net/sample-service ICAP/1.0\r\nHost: icap.example.net\r\nEncapsulated: null-body=0\r\n\r\n"[..],
//! );
//!
//! match decoder.decode(&mut buffer).unwrap() {
//!     Some(Message::Head(request)) => {
//!         assert_eq!(request.method(), IcapMethod::Options);
//!         assert!(request.body_type().is_none());
//!     }
//!     other => panic!("unexpected unit: {other:?}"),
//! }
//! ```

use std::collections::VecDeque;

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::{error, trace, warn};

use crate::codec::DecoderConfig;
use crate::codec::body::{ChunkSize, read_chunk_data, read_chunk_delimiter};
use crate::codec::header::http_head::{decode_request_head, decode_response_head};
use crate::codec::header::{HeaderBlockBuilder, parse_trailer_line};
use crate::codec::line::{read_line, skip_control_chars, split_initial_line};
use crate::ensure;
use crate::protocol::{
    BodyType, EntityKind, HttpEntity, IcapChunk, IcapChunkTrailer, IcapMessage, IcapRequest, IcapResponse, Message,
    ParseError,
};

/// Decoder used by ICAP servers.
pub type IcapRequestDecoder = IcapMessageDecoder<IcapRequest>;

/// Decoder used by ICAP clients.
pub type IcapResponseDecoder = IcapMessageDecoder<IcapResponse>;

/// Incremental decoder of ICAP messages of type `M`.
#[derive(Debug)]
pub struct IcapMessageDecoder<M> {
    state: State,
    cursor: Cursor<M>,
    config: DecoderConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Discard noise between messages
    SkipControlChars,
    /// Read the request or status line
    ReadInitialLine,
    /// Read ICAP header lines up to the blank line
    ReadHeaders,
    /// Read the embedded HTTP heads named by `Encapsulated`
    ReadHttpHead,
    /// Emit the head and pick the body handling
    BodyDecision,
    /// Enter a preview exchange
    Preview,
    /// Read a chunk size line
    ReadChunkSize,
    /// Read the data of a chunk
    ReadChunkData { size: usize },
    /// Read the CRLF following chunk data
    ReadChunkDelimiter,
    /// Read the trailer following the last chunk
    ReadChunkTrailer { early_termination: bool },
    /// A fatal error happened, all input is discarded
    BadMessage,
}

/// Outcome of a single state step.
enum Transition<M> {
    /// Move to another state without producing a unit
    Next(State),
    /// Produce a unit and move to another state
    Emit(State, Message<M>),
    /// Wait for more bytes, nothing has been consumed
    NeedMoreInput,
}

/// Context of the exchange being decoded.
#[derive(Debug)]
struct Cursor<M> {
    message: Option<M>,
    headers: HeaderBlockBuilder,
    header_size: usize,
    pending_heads: VecDeque<EntityKind>,
    preview: Option<usize>,
    body_read: usize,
    use_original_body: Option<usize>,
}

impl<M> Cursor<M> {
    fn new() -> Self {
        Self {
            message: None,
            headers: HeaderBlockBuilder::new(),
            header_size: 0,
            pending_heads: VecDeque::new(),
            preview: None,
            body_read: 0,
            use_original_body: None,
        }
    }

    fn message_mut(&mut self) -> Result<&mut M, ParseError> {
        self.message
            .as_mut()
            .ok_or_else(|| ParseError::invalid_state("this state requires a message in progress"))
    }
}

impl<M: IcapMessage> IcapMessageDecoder<M> {
    /// Creates a decoder with the default limits.
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self { state: State::SkipControlChars, cursor: Cursor::new(), config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Returns true when no exchange is partially decoded.
    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::SkipControlChars | State::ReadInitialLine)
    }

    fn step(&mut self, src: &mut BytesMut) -> Result<Transition<M>, ParseError> {
        match self.state {
            State::SkipControlChars => Ok(self.skip_control_chars(src)),
            State::ReadInitialLine => self.read_initial_line(src),
            State::ReadHeaders => self.read_headers(src),
            State::ReadHttpHead => self.read_http_head(src),
            State::BodyDecision => self.body_decision(),
            State::Preview => Ok(self.preview()),
            State::ReadChunkSize => self.read_chunk_size(src),
            State::ReadChunkData { size } => Ok(self.read_chunk_data(src, size)),
            State::ReadChunkDelimiter => self.read_chunk_delimiter(src),
            State::ReadChunkTrailer { early_termination } => self.read_chunk_trailer(src, early_termination),
            State::BadMessage => {
                src.clear();
                Ok(Transition::NeedMoreInput)
            }
        }
    }

    fn skip_control_chars(&mut self, src: &mut BytesMut) -> Transition<M> {
        if skip_control_chars(src) {
            Transition::Next(State::ReadInitialLine)
        } else {
            Transition::NeedMoreInput
        }
    }

    fn read_initial_line(&mut self, src: &mut BytesMut) -> Result<Transition<M>, ParseError> {
        let Some(line) = read_line(src, self.config.max_initial_line_length())? else {
            return Ok(Transition::NeedMoreInput);
        };

        let created = std::str::from_utf8(&line.bytes)
            .map_err(|_| ParseError::malformed_initial_line("initial line is not valid utf-8"))
            .and_then(|line| {
                let tokens = split_initial_line(line)
                    .ok_or_else(|| ParseError::malformed_initial_line(format!("expect 3 tokens: {line}")))?;
                M::from_initial_line(tokens)
            });

        match created {
            Ok(message) => {
                self.cursor = Cursor::new();
                self.cursor.message = Some(message);
                Ok(Transition::Next(State::ReadHeaders))
            }
            Err(e) if e.is_recoverable() => {
                warn!(cause = %e, "ignore invalid initial line");
                Ok(Transition::Next(State::SkipControlChars))
            }
            Err(e) => Err(e),
        }
    }

    fn read_headers(&mut self, src: &mut BytesMut) -> Result<Transition<M>, ParseError> {
        let max_size = self.config.max_header_size();
        let header_size = self.cursor.header_size;

        let line = read_line(src, max_size).map_err(|e| match e {
            ParseError::LineTooLong { current_size, .. } => {
                ParseError::header_block_too_large(header_size + current_size, max_size)
            }
            e => e,
        })?;

        let Some(line) = line else {
            ensure!(
                header_size + src.len() <= max_size,
                ParseError::header_block_too_large(header_size + src.len(), max_size)
            );
            return Ok(Transition::NeedMoreInput);
        };

        self.cursor.header_size += line.consumed;
        ensure!(
            self.cursor.header_size <= max_size,
            ParseError::header_block_too_large(self.cursor.header_size, max_size)
        );

        if !line.is_empty() {
            self.cursor.headers.push_line(line.as_str()?)?;
            return Ok(Transition::Next(State::ReadHeaders));
        }

        let block = std::mem::take(&mut self.cursor.headers).finish()?;
        trace!(header_size = self.cursor.header_size, headers = block.headers.len(), "read icap headers");

        let body_type = block.encapsulated.as_ref().and_then(|e| e.body_entry()).and_then(BodyType::from_entity_kind);
        self.cursor.pending_heads = block.encapsulated.as_ref().map(|e| e.heads().collect()).unwrap_or_default();

        let parts = self.cursor.message_mut()?.parts_mut();
        parts.set_headers(block.headers);
        parts.set_preview_amount(block.preview);
        parts.set_encapsulated(block.encapsulated);
        parts.set_body_type(body_type);

        Ok(Transition::Next(State::ReadHttpHead))
    }

    fn read_http_head(&mut self, src: &mut BytesMut) -> Result<Transition<M>, ParseError> {
        let Some(kind) = self.cursor.pending_heads.front().copied() else {
            return Ok(Transition::Next(State::BodyDecision));
        };

        let max_size = self.config.max_header_size();
        match kind {
            EntityKind::ReqHdr => {
                let Some(head) = decode_request_head(src, max_size)? else {
                    return Ok(Transition::NeedMoreInput);
                };
                self.cursor.message_mut()?.parts_mut().set_http_request(Some(HttpEntity::new(head)));
            }
            EntityKind::ResHdr => {
                let Some(head) = decode_response_head(src, max_size)? else {
                    return Ok(Transition::NeedMoreInput);
                };
                self.cursor.message_mut()?.parts_mut().set_http_response(Some(HttpEntity::new(head)));
            }
            kind => return Err(ParseError::invalid_state(format!("{kind} is not an http head"))),
        }

        self.cursor.pending_heads.pop_front();
        Ok(Transition::Next(State::ReadHttpHead))
    }

    fn body_decision(&mut self) -> Result<Transition<M>, ParseError> {
        let message = self
            .cursor
            .message
            .take()
            .ok_or_else(|| ParseError::invalid_state("body decision requires a valid icap message"))?;

        if message.body_type().is_none() {
            trace!("decoded icap message without body");
            return Ok(Transition::Emit(State::SkipControlChars, Message::Head(message)));
        }

        if message.is_preview_message() {
            self.cursor.preview = message.preview_amount();
            return Ok(Transition::Emit(State::Preview, Message::Head(message)));
        }

        Ok(Transition::Emit(State::ReadChunkSize, Message::Head(message)))
    }

    fn preview(&mut self) -> Transition<M> {
        trace!(preview = ?self.cursor.preview, "reading preview body");
        Transition::Next(State::ReadChunkSize)
    }

    fn read_chunk_size(&mut self, src: &mut BytesMut) -> Result<Transition<M>, ParseError> {
        let Some(line) = read_line(src, self.config.max_initial_line_length())? else {
            return Ok(Transition::NeedMoreInput);
        };

        let chunk_size = ChunkSize::parse(line.as_str()?, self.config.max_chunk_size())?;
        if chunk_size.size > 0 {
            return Ok(Transition::Next(State::ReadChunkData { size: chunk_size.size }));
        }

        let early_termination =
            chunk_size.ieof && self.cursor.preview.is_some_and(|preview| self.cursor.body_read < preview);
        Ok(Transition::Next(State::ReadChunkTrailer { early_termination }))
    }

    fn read_chunk_data(&mut self, src: &mut BytesMut, size: usize) -> Transition<M> {
        let Some(content) = read_chunk_data(src, size) else {
            return Transition::NeedMoreInput;
        };

        self.cursor.body_read += size;
        trace!(len = size, body_read = self.cursor.body_read, "read chunk");

        let mut chunk = IcapChunk::new(content);
        chunk.set_preview_chunk(self.cursor.preview.is_some());
        Transition::Emit(State::ReadChunkDelimiter, Message::Chunk(chunk))
    }

    fn read_chunk_delimiter(&mut self, src: &mut BytesMut) -> Result<Transition<M>, ParseError> {
        if read_chunk_delimiter(src)? {
            Ok(Transition::Next(State::ReadChunkSize))
        } else {
            Ok(Transition::NeedMoreInput)
        }
    }

    fn read_chunk_trailer(&mut self, src: &mut BytesMut, early_termination: bool) -> Result<Transition<M>, ParseError> {
        let Some(line) = read_line(src, self.config.max_initial_line_length())? else {
            return Ok(Transition::NeedMoreInput);
        };

        if !line.is_empty() {
            let line = line.as_str().map_err(|e| ParseError::invalid_trailer(e.to_string()))?;
            let offset = parse_trailer_line(line)?;
            ensure!(
                self.cursor.use_original_body.is_none(),
                ParseError::invalid_trailer("duplicated Use-Original-Body")
            );
            self.cursor.use_original_body = Some(offset);
            return Ok(Transition::Next(State::ReadChunkTrailer { early_termination }));
        }

        let mut trailer = IcapChunkTrailer::new();
        trailer
            .set_preview_chunk(self.cursor.preview.is_some())
            .set_early_termination(early_termination)
            .set_use_original_body(self.cursor.use_original_body);
        trace!(body_read = self.cursor.body_read, early_termination, "read chunk trailer");

        self.cursor = Cursor::new();
        Ok(Transition::Emit(State::SkipControlChars, Message::Trailer(trailer)))
    }
}

impl<M: IcapMessage> Default for IcapMessageDecoder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: IcapMessage> Decoder for IcapMessageDecoder<M> {
    type Item = Message<M>;
    type Error = ParseError;

    /// Attempts to decode the next unit from the provided buffer
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Message::Head(_)))`: a request or response head was decoded
    /// - `Ok(Some(Message::Chunk(_)))`: a body chunk was decoded
    /// - `Ok(Some(Message::Trailer(_)))`: the body ended
    /// - `Ok(None)`: need more data to proceed
    /// - `Err(_)`: a fatal error, the connection should be closed
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.step(src) {
                Ok(Transition::Next(state)) => {
                    trace!(from = ?self.state, to = ?state, "decoder state transition");
                    self.state = state;
                }
                Ok(Transition::Emit(state, item)) => {
                    self.state = state;
                    return Ok(Some(item));
                }
                Ok(Transition::NeedMoreInput) => return Ok(None),
                Err(e) => {
                    error!(cause = %e, state = ?self.state, "failed to decode icap message");
                    self.state = State::BadMessage;
                    self.cursor = Cursor::new();
                    return Err(e);
                }
            }
        }
    }
}
