use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Encoder;
use tracing::error;

use crate::codec::{ChunkSeparator, IcapMessageEncoder};
use crate::protocol::{IcapMessage, Message, SendError};

/// Initial capacity of the write buffer.
const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

#[derive(Debug)]
pub struct MessageWriter<W, M> {
    writer: W,
    buffer: BytesMut,
    encoder: IcapMessageEncoder<M>,
    separator: ChunkSeparator,
}

impl<W, M> MessageWriter<W, M>
where
    W: AsyncWrite + Unpin,
    M: IcapMessage,
{
    pub fn new(writer: W) -> Self {
        Self::with_separator(writer, ChunkSeparator::default())
    }

    pub fn with_separator(writer: W, separator: ChunkSeparator) -> Self {
        Self { writer, buffer: BytesMut::with_capacity(DEFAULT_BUFFER_SIZE), encoder: IcapMessageEncoder::new(), separator }
    }

    #[inline]
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn clear_buf(&mut self) {
        self.buffer.clear();
    }

    /// Buffers every frame of `message`.
    ///
    /// Nothing is buffered when any frame fails to encode.
    pub fn write(&mut self, message: M) -> Result<(), SendError> {
        let mark = self.buffer.len();
        for unit in self.separator.separate(message) {
            if let Err(e) = self.encoder.encode(unit, &mut self.buffer) {
                error!(cause = %e, "failed to encode icap message");
                self.buffer.truncate(mark);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Buffers a single unit, for callers streaming units they already have.
    ///
    /// Nothing is buffered when the unit is out of order.
    pub fn write_unit(&mut self, unit: Message<M>) -> Result<(), SendError> {
        self.encoder.encode(unit, &mut self.buffer)
    }

    /// Writes the buffered frames to the transport.
    #[inline]
    pub async fn flush(&mut self) -> Result<(), SendError> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        self.writer.write_all(self.buffer.as_ref()).await?;
        self.buffer.clear();
        Ok(self.writer.flush().await?)
    }
}
