use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;

use crate::codec::FullMessageDecoder;
use crate::protocol::{IcapMessage, Message, ParseError};

/// Initial capacity of the read buffer.
const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

#[derive(Debug)]
pub struct MessageReader<R, M> {
    framed_read: FramedRead<R, FullMessageDecoder<M>>,
}

impl<R, M> MessageReader<R, M>
where
    R: AsyncRead + Unpin,
    M: IcapMessage,
{
    pub fn new(reader: R) -> Self {
        Self::with_decoder(reader, FullMessageDecoder::new())
    }

    pub fn with_decoder(reader: R, decoder: FullMessageDecoder<M>) -> Self {
        Self { framed_read: FramedRead::with_capacity(reader, decoder, DEFAULT_BUFFER_SIZE) }
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut R {
        self.framed_read.get_mut()
    }

    /// Reads the next whole message.
    ///
    /// Returns `None` once the transport reached its end. After an error the
    /// connection should be closed.
    pub async fn next_message(&mut self) -> Option<Result<Message<M>, ParseError>> {
        self.framed_read.next().await
    }
}
