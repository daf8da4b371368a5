//! Network Module
//!
//! TCP server, per-connection session handling and a small client.
//!
//! ## Architecture
//! - Single thread, blocking I/O
//! - accept → session → close, then the next accept
//! - No connection is ever served concurrently with another

mod client;
mod server;
mod session;

pub use client::send_packet;
pub use server::Server;
pub use session::{Session, SessionOutcome};
