//! ICAP chunked body framing
//!
//! ICAP always transfers encapsulated bodies with HTTP/1.1 style chunked
//! encoding, extended by the `ieof` chunk extension (RFC 3507 section 4.5)
//! and the `Use-Original-Body` trailer.
//!
//! # Components
//!
//! - chunk decoding primitives driven by the message decoder state machine
//! - [`ChunkEncoder`]: writes [`IcapChunk`](crate::protocol::IcapChunk) and
//!   [`IcapChunkTrailer`](crate::protocol::IcapChunkTrailer) frames

mod chunk_decoder;
mod chunk_encoder;

pub(crate) use chunk_decoder::ChunkSize;
pub(crate) use chunk_decoder::read_chunk_data;
pub(crate) use chunk_decoder::read_chunk_delimiter;
pub use chunk_encoder::ChunkEncoder;
