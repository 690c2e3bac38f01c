//! ICAP header processing for encoding and decoding heads
//!
//! # Components
//!
//! - [`HeaderBlockBuilder`]: accumulates ICAP header lines while decoding and
//!   freezes them into a [`HeaderBlock`], lifting out `Encapsulated` and
//!   `Preview`
//! - [`HeaderEncoder`]: writes an ICAP head, computing `Encapsulated` from the
//!   embedded HTTP heads
//! - [`http_head`]: parses and writes the embedded HTTP/1.x heads

mod header_decoder;
mod header_encoder;
pub(crate) mod http_head;

pub(crate) use header_decoder::HeaderBlock;
pub(crate) use header_decoder::HeaderBlockBuilder;
pub(crate) use header_decoder::USE_ORIGINAL_BODY;
pub(crate) use header_decoder::parse_trailer_line;
pub use header_encoder::HeaderEncoder;
