//! Core ICAP protocol types.
//!
//! This module provides the message model shared by the decoder, the encoder
//! and the pipeline stages in [`crate::codec`].
//!
//! # Architecture
//!
//! - **Messages** ([`request`], [`response`], [`parts`]): ICAP heads
//!   - [`IcapRequest`] and [`IcapResponse`] both implement [`IcapMessage`]
//!   - [`MessageParts`] holds the state common to both
//!
//! - **Units** ([`message`]): what flows through a pipeline
//!   - [`Message`]: a head, a body chunk, a trailer or a foreign object
//!   - [`IcapChunk`] and [`IcapChunkTrailer`]
//!
//! - **Encapsulation** ([`encapsulated`], [`entity`]): embedded HTTP entities
//!   - [`Encapsulated`]: the parsed `Encapsulated` header
//!   - [`HttpEntity`]: embedded HTTP head plus body buffer
//!   - [`RefCount`]: explicit lifetime of body buffers
//!
//! - **Error Handling** ([`error`])
//!   - [`IcapError`]: Top-level error type
//!   - [`ParseError`]: decoding errors
//!   - [`SendError`]: encoding errors

mod encapsulated;
pub use encapsulated::ENCAPSULATED;
pub use encapsulated::Encapsulated;
pub use encapsulated::EntityKind;

mod entity;
pub use entity::FullHttpRequest;
pub use entity::FullHttpResponse;
pub use entity::HttpEntity;
pub use entity::HttpRequestHead;
pub use entity::HttpResponseHead;
pub use entity::RefCount;

mod error;
pub use error::IcapError;
pub use error::ParseError;
pub use error::RefCountError;
pub use error::SendError;

mod message;
pub use message::BodyType;
pub use message::IcapChunk;
pub use message::IcapChunkTrailer;
pub use message::Message;

mod method;
pub use method::IcapMethod;

mod parts;
pub use parts::IcapMessage;
pub use parts::MessageParts;
pub use parts::PREVIEW;

mod request;
pub use request::IcapRequest;

mod response;
pub use response::IcapResponse;

mod status;
pub use status::IcapStatus;

mod version;
pub use version::IcapVersion;
