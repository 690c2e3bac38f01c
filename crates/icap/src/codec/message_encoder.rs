use std::marker::PhantomData;

use bytes::BytesMut;
use tokio_util::codec::Encoder;
use tracing::{error, trace};

use crate::codec::body::ChunkEncoder;
use crate::codec::header::HeaderEncoder;
use crate::protocol::{IcapMessage, IcapRequest, IcapResponse, Message, SendError};

/// Encoder used by ICAP clients.
pub type IcapRequestEncoder = IcapMessageEncoder<IcapRequest>;

/// Encoder used by ICAP servers.
pub type IcapResponseEncoder = IcapMessageEncoder<IcapResponse>;

/// Writes [`Message`] units to the wire.
///
/// The encoder tracks whether the last head declared a body, so frames must
/// arrive in the order produced by [`ChunkSeparator`](crate::codec::ChunkSeparator):
/// a head, then its chunks and trailer when it has a body.
#[derive(Debug)]
pub struct IcapMessageEncoder<M> {
    header_encoder: HeaderEncoder,
    chunk_encoder: ChunkEncoder,
    body_open: bool,
    _message: PhantomData<fn(M)>,
}

impl<M> IcapMessageEncoder<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when a head declared a body whose trailer was not written yet.
    pub fn is_body_open(&self) -> bool {
        self.body_open
    }
}

impl<M> Default for IcapMessageEncoder<M> {
    fn default() -> Self {
        Self { header_encoder: HeaderEncoder, chunk_encoder: ChunkEncoder, body_open: false, _message: PhantomData }
    }
}

impl<M: IcapMessage> Encoder<Message<M>> for IcapMessageEncoder<M> {
    type Error = SendError;

    fn encode(&mut self, item: Message<M>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            Message::Head(head) => {
                if self.body_open {
                    error!("expect body frame but receive icap head");
                    return Err(SendError::unexpected_frame("head received while a body is still open"));
                }

                self.header_encoder.encode(&head, dst)?;
                self.body_open = head.body_type().is_some();
                trace!(body_open = self.body_open, "encoded icap head");
                Ok(())
            }

            Message::Chunk(chunk) => {
                if !self.body_open {
                    error!("expect icap head but receive chunk");
                    return Err(SendError::unexpected_frame("chunk received without a head declaring a body"));
                }
                self.chunk_encoder.encode(chunk, dst)
            }

            Message::Trailer(trailer) => {
                if !self.body_open {
                    error!("expect icap head but receive chunk trailer");
                    return Err(SendError::unexpected_frame("trailer received without a head declaring a body"));
                }
                self.chunk_encoder.encode(trailer, dst)?;
                self.body_open = false;
                Ok(())
            }

            Message::Other(_) => Err(SendError::unexpected_frame("only icap units can be encoded")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{BodyType, IcapChunk, IcapChunkTrailer, IcapMethod, IcapStatus};
    use bytes::Bytes;

    #[test]
    fn encode_head_chunk_and_trailer() {
        let mut encoder = IcapResponseEncoder::new();
        let mut dst = BytesMut::new();

        let mut response = IcapResponse::new(IcapStatus::OK).with_content(Bytes::from_static(b"hello"));
        response.parts_mut().set_body_type(Some(BodyType::OptBody));

        encoder.encode(Message::Head(response), &mut dst).unwrap();
        assert!(encoder.is_body_open());
        encoder.encode(Message::Chunk(IcapChunk::new(Bytes::from_static(b"hello"))), &mut dst).unwrap();
        encoder.encode(Message::Trailer(IcapChunkTrailer::new()), &mut dst).unwrap();
        assert!(!encoder.is_body_open());

        let expected = "ICAP/1.0 200 OK\r\nEncapsulated: opt-body=0\r\n\r\n5\r\nhello\r\n0\r\n\r\n";
        assert_eq!(std::str::from_utf8(&dst).unwrap(), expected);
    }

    #[test]
    fn reject_chunk_without_head() {
        let mut encoder = IcapRequestEncoder::new();
        let mut dst = BytesMut::new();

        let result = encoder.encode(Message::Chunk(IcapChunk::new(Bytes::from_static(b"data"))), &mut dst);
        assert!(matches!(result, Err(SendError::UnexpectedFrame { .. })));

        let result = encoder.encode(Message::Trailer(IcapChunkTrailer::new()), &mut dst);
        assert!(matches!(result, Err(SendError::UnexpectedFrame { .. })));
        assert!(dst.is_empty());
    }

    #[test]
    fn reject_chunk_after_bodiless_head() {
        let mut encoder = IcapRequestEncoder::new();
        let mut dst = BytesMut::new();

        encoder.encode(Message::Head(IcapRequest::new(IcapMethod::Options, "icap://icap/options")), &mut dst).unwrap();
        let result = encoder.encode(Message::Chunk(IcapChunk::new(Bytes::from_static(b"data"))), &mut dst);
        assert!(matches!(result, Err(SendError::UnexpectedFrame { .. })));
    }

    #[test]
    fn reject_head_while_body_open() {
        let mut encoder = IcapResponseEncoder::new();
        let mut dst = BytesMut::new();

        let mut response = IcapResponse::new(IcapStatus::OK).with_content(Bytes::from_static(b"x"));
        response.parts_mut().set_body_type(Some(BodyType::OptBody));
        encoder.encode(Message::Head(response), &mut dst).unwrap();

        let result = encoder.encode(Message::Head(IcapResponse::new(IcapStatus::NO_CONTENT)), &mut dst);
        assert!(matches!(result, Err(SendError::UnexpectedFrame { .. })));
    }

    #[test]
    fn reject_other_units() {
        let mut encoder = IcapRequestEncoder::new();
        let mut dst = BytesMut::new();
        let result = encoder.encode(Message::Other(Box::new(42_u32)), &mut dst);
        assert!(matches!(result, Err(SendError::UnexpectedFrame { .. })));
    }
}
