//! Async adapters wiring the codec to a byte transport
//!
//! # Components
//!
//! - [`MessageReader`]: reads whole messages from an [`AsyncRead`](tokio::io::AsyncRead)
//!   through a [`FramedRead`](tokio_util::codec::FramedRead) driving
//!   [`FullMessageDecoder`](crate::codec::FullMessageDecoder)
//! - [`MessageWriter`]: separates and encodes outbound messages into a buffer
//!   flushed to an [`AsyncWrite`](tokio::io::AsyncWrite)
//!
//! Both only move bytes; all protocol rules live in [`codec`](crate::codec).

mod message_reader;
mod message_writer;

pub use message_reader::MessageReader;
pub use message_writer::MessageWriter;
