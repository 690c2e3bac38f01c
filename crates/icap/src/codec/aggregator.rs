//! Reassembles decoded units into whole messages.
//!
//! A head without a body passes through. A head declaring a body is held back
//! while the following chunks are collected; the trailer completes it and the
//! collected bytes become the content of the entity named by its body type.

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::{error, trace};

use crate::codec::config::{ConfigError, positive};
use crate::codec::{DecoderConfig, IcapMessageDecoder};
use crate::ensure;
use crate::protocol::{BodyType, IcapMessage, Message, ParseError};

/// Default limit of an aggregated body.
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 8 * 1024 * 1024;

#[derive(Debug)]
pub struct ChunkAggregator<M> {
    pending: Option<M>,
    body: BytesMut,
    max_content_length: usize,
}

impl<M: IcapMessage> ChunkAggregator<M> {
    /// Creates an aggregator refusing bodies larger than `max_content_length`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotPositive`] when `max_content_length` is zero.
    pub fn new(max_content_length: usize) -> Result<Self, ConfigError> {
        Ok(Self { pending: None, body: BytesMut::new(), max_content_length: positive("max_content_length", max_content_length)? })
    }

    pub fn max_content_length(&self) -> usize {
        self.max_content_length
    }

    /// Returns true while a head is waiting for its trailer.
    pub fn is_aggregating(&self) -> bool {
        self.pending.is_some()
    }

    /// Feeds one unit, returning the unit to forward if any.
    ///
    /// # Errors
    ///
    /// - [`ParseError::InvalidBody`] when a head arrives while another one is
    ///   still waiting for its trailer, or when the entity designated by the
    ///   body type is missing
    /// - [`ParseError::ContentTooLarge`] when the body exceeds the limit
    pub fn aggregate(&mut self, item: Message<M>) -> Result<Option<Message<M>>, ParseError> {
        match item {
            Message::Head(head) => {
                ensure!(
                    self.pending.is_none(),
                    ParseError::invalid_body("received a new head while the previous body is incomplete")
                );

                let Some(body_type) = head.body_type() else {
                    return Ok(Some(Message::Head(head)));
                };

                check_body_entity(&head, body_type)?;
                self.pending = Some(head);
                Ok(None)
            }

            Message::Chunk(chunk) => {
                if self.pending.is_none() {
                    trace!(len = chunk.content().len(), "forward chunk without head");
                    return Ok(Some(Message::Chunk(chunk)));
                }

                let current_size = self.body.len() + chunk.content().len();
                ensure!(
                    current_size <= self.max_content_length,
                    ParseError::content_too_large(current_size, self.max_content_length)
                );

                self.body.extend_from_slice(chunk.content());
                Ok(None)
            }

            Message::Trailer(trailer) => {
                let Some(mut head) = self.pending.take() else {
                    trace!("forward trailer without head");
                    return Ok(Some(Message::Trailer(trailer)));
                };

                let content = self.body.split().freeze();
                trace!(len = content.len(), "aggregated icap body");

                match head.body_type() {
                    Some(BodyType::ReqBody) => {
                        let request = head
                            .parts_mut()
                            .http_request_mut()
                            .ok_or_else(|| ParseError::invalid_body("req-body without http request"))?;
                        request.set_content(Some(content));
                    }
                    Some(BodyType::ResBody) => {
                        let response = head
                            .parts_mut()
                            .http_response_mut()
                            .ok_or_else(|| ParseError::invalid_body("res-body without http response"))?;
                        response.set_content(Some(content));
                    }
                    Some(BodyType::OptBody) => head.set_content(content)?,
                    None => return Err(ParseError::invalid_state("aggregated message lost its body type")),
                }

                if trailer.use_original_body().is_some() {
                    head.set_use_original_body(trailer.use_original_body());
                }

                head.touch("aggregated");
                Ok(Some(Message::Head(head)))
            }

            other @ Message::Other(_) => Ok(Some(other)),
        }
    }

    fn reset(&mut self) {
        self.pending = None;
        self.body.clear();
    }
}

impl<M: IcapMessage> Default for ChunkAggregator<M> {
    fn default() -> Self {
        Self { pending: None, body: BytesMut::new(), max_content_length: DEFAULT_MAX_CONTENT_LENGTH }
    }
}

fn check_body_entity<M: IcapMessage>(head: &M, body_type: BodyType) -> Result<(), ParseError> {
    match body_type {
        BodyType::ReqBody => {
            ensure!(head.http_request().is_some(), ParseError::invalid_body("req-body without http request"));
        }
        BodyType::ResBody => {
            ensure!(head.http_response().is_some(), ParseError::invalid_body("res-body without http response"));
        }
        BodyType::OptBody => {}
    }
    Ok(())
}

/// Decodes whole messages: [`IcapMessageDecoder`] followed by [`ChunkAggregator`].
#[derive(Debug)]
pub struct FullMessageDecoder<M> {
    decoder: IcapMessageDecoder<M>,
    aggregator: ChunkAggregator<M>,
}

impl<M: IcapMessage> FullMessageDecoder<M> {
    pub fn new() -> Self {
        Self { decoder: IcapMessageDecoder::new(), aggregator: ChunkAggregator::default() }
    }

    pub fn with_config(config: DecoderConfig, max_content_length: usize) -> Result<Self, ConfigError> {
        Ok(Self { decoder: IcapMessageDecoder::with_config(config), aggregator: ChunkAggregator::new(max_content_length)? })
    }
}

impl<M: IcapMessage> Default for FullMessageDecoder<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: IcapMessage> Decoder for FullMessageDecoder<M> {
    type Item = Message<M>;
    type Error = ParseError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while let Some(unit) = self.decoder.decode(src)? {
            match self.aggregator.aggregate(unit) {
                Ok(Some(message)) => return Ok(Some(message)),
                Ok(None) => {}
                Err(e) => {
                    error!(cause = %e, "failed to aggregate icap message");
                    self.aggregator.reset();
                    return Err(e);
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::IcapRequestDecoder;
    use crate::protocol::{HttpEntity, IcapChunk, IcapChunkTrailer, IcapMethod, IcapRequest, IcapResponse, IcapStatus};
    use bytes::Bytes;
    use http::{Request, Response};
    use indoc::indoc;

    const REQMOD_WITH_TWO_CHUNKS: &str = indoc! {"
        REQMOD icap://icap.mimo.ch:1344/reqmod ICAP/1.0\r
        Host: icap-server.net\r
        Encapsulated: req-hdr=0, req-body=61\r
        \r
        POST /origin-resource/form.pl HTTP/1.1\r
        Host: www.origin-server.com\r
        \r
        33\r
        This is data that was returned by an origin server.\r
        3a\r
        And this the second chunk which contains more information.\r
        0\r
        \r
        "};

    const RESPMOD_WITH_PREVIEW: &str = indoc! {"
        RESPMOD icap://icap.mimo.ch:1344/respmod ICAP/1.0\r
        Host: icap-server.net\r
        Preview: 51\r
        Encapsulated: req-hdr=0, res-hdr=35, res-body=56\r
        \r
        GET /origin-resource HTTP/1.1\r
        \r
        HTTP/1.1 200 OK\r
        Server: Apache/1.3.12\r
        \r
        33\r
        This is data that was returned by an origin server.\r
        0\r
        \r
        "};

    fn reqmod_with_body_head() -> IcapRequest {
        let mut request = IcapRequest::new(IcapMethod::ReqMod, "icap://icap/reqmod")
            .with_http_request(HttpEntity::new(Request::builder().method("POST").uri("/").body(()).unwrap()));
        request.parts_mut().set_body_type(Some(BodyType::ReqBody));
        request
    }

    fn chunk(content: &'static [u8]) -> Message<IcapRequest> {
        Message::Chunk(IcapChunk::new(Bytes::from_static(content)))
    }

    #[test]
    fn offer_unknown_object() {
        let mut aggregator = ChunkAggregator::<IcapRequest>::default();
        let forwarded = aggregator.aggregate(Message::Other(Box::new("The ultimate answer is 42"))).unwrap();

        let Some(Message::Other(object)) = forwarded else { panic!("unknown object was not forwarded") };
        assert_eq!(object.downcast_ref::<&str>(), Some(&"The ultimate answer is 42"));
    }

    #[test]
    fn forward_message_without_body() {
        let mut aggregator = ChunkAggregator::default();
        let request = IcapRequest::new(IcapMethod::ReqMod, "icap://icap/reqmod")
            .with_http_request(HttpEntity::new(Request::builder().uri("/").body(()).unwrap()));

        let forwarded = aggregator.aggregate(Message::Head(request)).unwrap().unwrap();
        assert!(forwarded.into_head().unwrap().http_request().unwrap().content().is_none());
        assert!(!aggregator.is_aggregating());
    }

    #[test]
    fn forward_chunk_without_head() {
        let mut aggregator = ChunkAggregator::<IcapRequest>::default();
        let forwarded = aggregator.aggregate(chunk(b"orphan")).unwrap().unwrap();
        assert_eq!(forwarded.into_chunk().unwrap().content(), &Bytes::from_static(b"orphan"));

        let forwarded = aggregator.aggregate(Message::Trailer(IcapChunkTrailer::new())).unwrap().unwrap();
        assert!(forwarded.is_trailer());
    }

    #[test]
    fn message_without_body_followed_by_chunk() {
        let mut aggregator = ChunkAggregator::default();
        let request = IcapRequest::new(IcapMethod::Options, "icap://icap/options");

        assert!(aggregator.aggregate(Message::Head(request)).unwrap().unwrap().is_head());
        assert!(aggregator.aggregate(chunk(b"data")).unwrap().unwrap().is_chunk());
    }

    #[test]
    fn aggregate_reqmod_with_chunks() {
        let mut aggregator = ChunkAggregator::default();
        assert!(aggregator.aggregate(Message::Head(reqmod_with_body_head())).unwrap().is_none());
        assert!(aggregator.aggregate(chunk(b"This is data that was returned by an origin server.")).unwrap().is_none());
        assert!(aggregator.aggregate(chunk(b"And this the second chunk.")).unwrap().is_none());

        let request = aggregator.aggregate(Message::Trailer(IcapChunkTrailer::new())).unwrap().unwrap().into_head().unwrap();
        assert_eq!(
            request.http_request().unwrap().content().unwrap(),
            &Bytes::from_static(b"This is data that was returned by an origin server.And this the second chunk.")
        );
        assert!(!aggregator.is_aggregating());
    }

    #[test]
    fn aggregate_opt_body_and_use_original_body() {
        let mut aggregator = ChunkAggregator::default();
        let mut response = IcapResponse::new(IcapStatus::OK);
        response.parts_mut().set_body_type(Some(BodyType::OptBody));

        assert!(aggregator.aggregate(Message::Head(response)).unwrap().is_none());
        assert!(aggregator.aggregate(Message::Chunk(IcapChunk::new(Bytes::from_static(b"options")))).unwrap().is_none());

        let mut trailer = IcapChunkTrailer::new();
        trailer.set_use_original_body(Some(7));
        let response = aggregator.aggregate(Message::Trailer(trailer)).unwrap().unwrap().into_head().unwrap();
        assert_eq!(response.content(), Some(&Bytes::from_static(b"options")));
        assert_eq!(response.use_original_body(), Some(7));
    }

    #[test]
    fn reject_head_while_aggregating() {
        let mut aggregator = ChunkAggregator::default();
        assert!(aggregator.aggregate(Message::Head(reqmod_with_body_head())).unwrap().is_none());

        let result = aggregator.aggregate(Message::Head(reqmod_with_body_head()));
        assert!(matches!(result, Err(ParseError::InvalidBody { .. })));
    }

    #[test]
    fn reject_missing_body_entity() {
        let mut aggregator = ChunkAggregator::default();
        let mut request = IcapRequest::new(IcapMethod::RespMod, "icap://icap/respmod");
        request.parts_mut().set_body_type(Some(BodyType::ResBody));

        let result = aggregator.aggregate(Message::Head(request));
        assert!(matches!(result, Err(ParseError::InvalidBody { .. })));
    }

    #[test]
    fn reject_content_too_large() {
        let mut aggregator = ChunkAggregator::new(8).unwrap();
        assert!(aggregator.aggregate(Message::Head(reqmod_with_body_head())).unwrap().is_none());
        assert!(aggregator.aggregate(chunk(b"12345")).unwrap().is_none());

        let result = aggregator.aggregate(chunk(b"6789"));
        assert!(matches!(result, Err(ParseError::ContentTooLarge { current_size: 9, max_size: 8 })));
    }

    #[test]
    fn decode_full_reqmod_message() {
        let mut decoder = FullMessageDecoder::<IcapRequest>::new();
        let mut buffer = BytesMut::from(REQMOD_WITH_TWO_CHUNKS);

        let request = decoder.decode(&mut buffer).unwrap().unwrap().into_head().unwrap();
        let body = request.http_request().unwrap().content().unwrap();
        assert_eq!(body.len(), 0x33 + 0x3a);
        assert!(body.starts_with(b"This is data"));
        assert!(body.ends_with(b"more information."));
        assert!(decoder.decode(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn decode_full_respmod_preview() {
        let mut decoder = FullMessageDecoder::<IcapRequest>::new();
        let mut buffer = BytesMut::from(RESPMOD_WITH_PREVIEW);

        let request = decoder.decode(&mut buffer).unwrap().unwrap().into_head().unwrap();
        assert_eq!(request.preview_amount(), Some(51));
        assert!(request.http_request().unwrap().content().is_none());
        assert_eq!(
            request.http_response().unwrap().content().unwrap(),
            &Bytes::from_static(b"This is data that was returned by an origin server.")
        );
    }

    #[test]
    fn split_input_aggregates_like_whole_input() {
        let mut whole = FullMessageDecoder::<IcapRequest>::new();
        let mut buffer = BytesMut::from(REQMOD_WITH_TWO_CHUNKS);
        let expected = whole.decode(&mut buffer).unwrap().unwrap().into_head().unwrap();

        let mut split = FullMessageDecoder::<IcapRequest>::new();
        let mut buffer = BytesMut::new();
        let mut decoded = None;
        for piece in REQMOD_WITH_TWO_CHUNKS.as_bytes().chunks(7) {
            buffer.extend_from_slice(piece);
            if let Some(message) = split.decode(&mut buffer).unwrap() {
                decoded = Some(message.into_head().unwrap());
            }
        }

        let decoded = decoded.unwrap();
        assert_eq!(decoded.uri(), expected.uri());
        assert_eq!(decoded.headers(), expected.headers());
        assert_eq!(decoded.http_request().unwrap().content(), expected.http_request().unwrap().content());
    }

    #[test]
    fn unit_decoder_and_full_decoder_agree_on_bodiless_message() {
        let bytes = b"OPTIONS icap://icap/options ICAP/1.0\r\nEncapsulated: null-body=0\r\n\r\n";

        let mut units = IcapRequestDecoder::new();
        let unit = units.decode(&mut BytesMut::from(&bytes[..])).unwrap().unwrap().into_head().unwrap();

        let mut full = FullMessageDecoder::<IcapRequest>::new();
        let message = full.decode(&mut BytesMut::from(&bytes[..])).unwrap().unwrap().into_head().unwrap();

        assert_eq!(unit.method(), message.method());
        assert_eq!(unit.body_type(), message.body_type());
    }

    #[test]
    fn response_entity_without_request_entity() {
        let mut aggregator = ChunkAggregator::default();
        let mut response = IcapResponse::new(IcapStatus::OK)
            .with_http_response(HttpEntity::new(Response::builder().status(200).body(()).unwrap()));
        response.parts_mut().set_body_type(Some(BodyType::ResBody));

        assert!(aggregator.aggregate(Message::Head(response)).unwrap().is_none());
        assert!(aggregator.aggregate(Message::Chunk(IcapChunk::new(Bytes::from_static(b"abc")))).unwrap().is_none());
        let response = aggregator.aggregate(Message::Trailer(IcapChunkTrailer::new())).unwrap().unwrap().into_head().unwrap();
        assert_eq!(response.http_response().unwrap().content_len(), 3);
    }
}
