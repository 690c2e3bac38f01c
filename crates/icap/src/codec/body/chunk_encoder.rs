use bytes::{BufMut, BytesMut};
use std::io::Write;
use tokio_util::codec::Encoder;

use crate::codec::header::USE_ORIGINAL_BODY;
use crate::protocol::{IcapChunk, IcapChunkTrailer, SendError};

/// Writes body chunks and the terminating trailer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkEncoder;

impl Encoder<IcapChunk> for ChunkEncoder {
    type Error = SendError;

    fn encode(&mut self, item: IcapChunk, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let content = item.content();
        // a zero sized chunk would terminate the body
        if content.is_empty() {
            return Ok(());
        }

        write!(helper::Writer(dst), "{:x}\r\n", content.len())?;
        dst.reserve(content.len() + 2);
        dst.extend_from_slice(content);
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}

impl Encoder<IcapChunkTrailer> for ChunkEncoder {
    type Error = SendError;

    fn encode(&mut self, item: IcapChunkTrailer, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.is_early_termination() {
            dst.put_slice(b"0; ieof\r\n");
        } else {
            dst.put_slice(b"0\r\n");
        }

        if let Some(offset) = item.use_original_body() {
            write!(helper::Writer(dst), "{USE_ORIGINAL_BODY}: {offset}\r\n")?;
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

mod helper {
    use bytes::{BufMut, BytesMut};
    use std::io;

    pub struct Writer<'a>(pub &'a mut BytesMut);

    impl io::Write for Writer<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.put_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn encode_chunk() {
        let mut dst = BytesMut::new();
        let chunk = IcapChunk::new(Bytes::from_static(b"This is data that was returned by an origin server."));
        ChunkEncoder.encode(chunk, &mut dst).unwrap();
        assert_eq!(&dst[..], &b"33\r\nThis is data that was returned by an origin server.\r\n"[..]);
    }

    #[test]
    fn skip_empty_chunk() {
        let mut dst = BytesMut::new();
        ChunkEncoder.encode(IcapChunk::new(Bytes::new()), &mut dst).unwrap();
        assert!(dst.is_empty());
    }

    #[test]
    fn encode_trailers() {
        let mut dst = BytesMut::new();
        ChunkEncoder.encode(IcapChunkTrailer::new(), &mut dst).unwrap();
        assert_eq!(&dst[..], b"0\r\n\r\n");

        let mut dst = BytesMut::new();
        let mut trailer = IcapChunkTrailer::new();
        trailer.set_preview_chunk(true).set_early_termination(true);
        ChunkEncoder.encode(trailer, &mut dst).unwrap();
        assert_eq!(&dst[..], b"0; ieof\r\n\r\n");

        let mut dst = BytesMut::new();
        let mut trailer = IcapChunkTrailer::new();
        trailer.set_use_original_body(Some(5));
        ChunkEncoder.encode(trailer, &mut dst).unwrap();
        assert_eq!(&dst[..], b"0\r\nUse-Original-Body: 5\r\n\r\n");
    }
}
