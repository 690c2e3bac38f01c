//! A bidirectional ICAP (RFC 3507) codec
//!
//! The crate turns a byte stream into ICAP requests and responses and back,
//! including the HTTP heads and chunked bodies they encapsulate, the
//! `Preview` exchange and the `ieof` / `Use-Original-Body` extensions.
//!
//! # Modules
//!
//! - [`protocol`]: the message model (requests, responses, chunks, embedded
//!   HTTP entities) and the error types
//! - [`codec`]: the incremental decoder, the chunk aggregator, the chunk
//!   separator and the wire encoder, all usable with `tokio_util::codec`
//! - [`connection`]: async reader and writer over a byte transport
//!
//! # Example
//!
//! ```no_run
//! use micro_icap::connection::{MessageReader, MessageWriter};
//! use micro_icap::protocol::{IcapRequest, IcapResponse, IcapStatus, Message};
//! use tokio::net::TcpListener;
//! use tracing::{error, info};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:1344").await.unwrap();
//!     let (stream, _) = listener.accept().await.unwrap();
//!     let (reader, writer) = stream.into_split();
//!
//!     let mut reader = MessageReader::<_, IcapRequest>::new(reader);
//!     let mut writer = MessageWriter::<_, IcapResponse>::new(writer);
//!
//!     while let Some(message) = reader.next_message().await {
//!         match message {
//!             Ok(Message::Head(request)) => {
//!                 info!(method = ?request.method(), uri = request.uri(), "receive icap request");
//!                 writer.write(IcapResponse::new(IcapStatus::NO_CONTENT)).unwrap();
//!                 writer.flush().await.unwrap();
//!             }
//!             Ok(_) => {}
//!             Err(e) => {
//!                 error!(cause = %e, "failed to read icap request");
//!                 break;
//!             }
//!         }
//!     }
//! }
//! ```

pub mod codec;
pub mod connection;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
