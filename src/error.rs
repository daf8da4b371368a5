//! Error types for packetlog
//!
//! Provides a unified error type for all operations.

use std::io;

use thiserror::Error;

/// Result type alias using PacketLogError
pub type Result<T> = std::result::Result<T, PacketLogError>;

/// Unified error type for packetlog operations
#[derive(Debug, Error)]
pub enum PacketLogError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A system call failed; `op` names the call so the log line reads
    /// `"bind : Address already in use (os error 98)"`.
    #[error("{op} : {source}")]
    Os {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    // -------------------------------------------------------------------------
    // Log Store Errors
    // -------------------------------------------------------------------------
    #[error("write data file : short write ({written} of {expected} bytes)")]
    ShortWrite { expected: usize, written: usize },

    // -------------------------------------------------------------------------
    // Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Signal setup failed: {0}")]
    Signal(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    /// A termination signal arrived while a call was blocked.
    #[error("Shutdown requested")]
    Shutdown,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PacketLogError {
    /// Adapter for `map_err` that tags an `io::Error` with the failing call
    pub fn os(op: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Os { op, source }
    }

    /// The underlying I/O error, if any
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::Io(e) | Self::Os { source: e, .. } => Some(e),
            _ => None,
        }
    }

    /// True if the peer went away (reset, aborted, broken pipe)
    pub fn is_peer_disconnect(&self) -> bool {
        matches!(
            self.io_error().map(io::Error::kind),
            Some(
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            )
        )
    }
}

/// Errors a blocking call reports when it was woken without failing:
/// EINTR from a signal, or a socket timeout used to poll for shutdown.
pub(crate) fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
