//! ICAP codec module for encoding and decoding ICAP messages
//!
//! # Architecture
//!
//! - Decoding:
//!   - [`IcapMessageDecoder`]: incremental state machine producing a head,
//!     body chunks and a trailer per message
//!   - [`ChunkAggregator`]: folds those units back into whole messages;
//!     [`FullMessageDecoder`] chains both
//!
//! - Encoding:
//!   - [`ChunkSeparator`]: splits a whole message into head, chunks and trailer
//!   - [`IcapMessageEncoder`]: writes those units to the wire, built on
//!     [`HeaderEncoder`] and [`ChunkEncoder`]
//!
//! # Example
//!
//! ```
//! use bytes::{Bytes, BytesMut};
//! use micro_icap::codec::{ChunkSeparator, FullMessageDecoder, IcapResponseEncoder};
//! use micro_icap::protocol::{IcapMessage, IcapResponse, IcapStatus};
//! use tokio_util::codec::{Decoder, Encoder};
//!
//! let response = IcapResponse::new(IcapStatus::OK).with_content(Bytes::from_static(b"hello"));
//!
//! let mut encoder = IcapResponseEncoder::new();
//! let mut buffer = BytesMut::new();
//! for unit in ChunkSeparator::default().separate(response) {
//!     encoder.encode(unit, &mut buffer).unwrap();
//! }
//!
//! let mut decoder = FullMessageDecoder::<IcapResponse>::new();
//! let decoded = decoder.decode(&mut buffer).unwrap().unwrap().into_head().unwrap();
//! assert_eq!(decoded.content(), Some(&Bytes::from_static(b"hello")));
//! ```

mod aggregator;
mod body;
mod config;
mod header;
mod line;
mod message_decoder;
mod message_encoder;
mod separator;

pub use aggregator::{ChunkAggregator, DEFAULT_MAX_CONTENT_LENGTH, FullMessageDecoder};
pub use body::ChunkEncoder;
pub use config::{ConfigError, DEFAULT_MAX_CHUNK_SIZE, DEFAULT_MAX_HEADER_SIZE, DEFAULT_MAX_INITIAL_LINE_LENGTH, DecoderConfig};
pub use header::HeaderEncoder;
pub use message_decoder::{IcapMessageDecoder, IcapRequestDecoder, IcapResponseDecoder};
pub use message_encoder::{IcapMessageEncoder, IcapRequestEncoder, IcapResponseEncoder};
pub use separator::{ChunkSeparator, DEFAULT_CHUNK_SIZE, Separated};
