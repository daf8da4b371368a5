//! Log Store Module
//!
//! The single append-only file holding every packet received so far.
//!
//! ## Responsibilities
//! - Append packets exactly as received (trailing newline included)
//! - Read the whole file back from offset 0, one chunk at a time
//! - Remove the file during shutdown
//!
//! ## File Format
//! ```text
//! ┌──────────────────────┬──────────────────────┬─────┐
//! │ packet 1 ... '\n'    │ packet 2 ... '\n'    │ ... │
//! └──────────────────────┴──────────────────────┴─────┘
//! ```
//!
//! There is no header, index or checksum. The file is opened with
//! `O_APPEND`, so writes land at the end regardless of the read offset.
//!
//! Sessions are strictly sequential, so no locking is done here. Serving
//! clients concurrently would need append + read-back to run as a single
//! critical section per session.

mod log;

pub use log::{LogChunks, LogStore};
