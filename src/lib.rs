//! # packetlog
//!
//! A single-process TCP server that:
//! - Accepts newline-terminated packets, one per connection
//! - Appends each packet to a shared on-disk log
//! - Echoes the entire accumulated log back to the sender
//! - Removes the log and exits cleanly on SIGINT / SIGTERM
//! - Optionally runs as a daemon
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │              (one connection at a time)                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ accept
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     Session                                  │
//! │      read packet → append → read back → send → close         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Packet    │          │  Log Store  │
//!   │   Reader    │          │  (append)   │
//!   └─────────────┘          └─────────────┘
//!
//!   Lifecycle: SIGINT/SIGTERM → unwind → close sockets,
//!              unlink log, close syslog, exit
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod logging;

pub mod lifecycle;
pub mod network;
pub mod protocol;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use error::{PacketLogError, Result};
pub use lifecycle::{Lifecycle, ShutdownSignal};
pub use network::Server;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of packetlog
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
