//! Protocol Module
//!
//! Newline framing for client packets.
//!
//! ## Protocol Format
//!
//! ### Request
//! ```text
//! ┌─────────────────────────────────────┬──────┐
//! │   opaque bytes (any length)         │ '\n' │
//! └─────────────────────────────────────┴──────┘
//! ```
//! No length prefix and no encoding assumptions. One packet per
//! connection.
//!
//! ### Response
//! The full contents of the log file, raw, with no header. The server
//! closes the connection afterwards; that close is the end-of-response
//! marker.

mod packet;

pub use packet::{Packet, PacketReader, ReadOutcome, DEFAULT_CHUNK_SIZE};
