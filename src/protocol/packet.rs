//! Packet accumulation
//!
//! Reads fixed-size chunks from a connection until one contains a newline.

use std::io::Read;

use bytes::{Bytes, BytesMut};

use crate::error::{is_transient, PacketLogError, Result};
use crate::lifecycle::ShutdownSignal;

/// Default recv chunk size (bytes)
pub const DEFAULT_CHUNK_SIZE: usize = 512;

const NEWLINE: u8 = b'\n';

/// One complete packet as received, newline included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    data: Bytes,
}

impl Packet {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Result of reading from one connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A chunk containing a newline arrived
    Complete(Packet),

    /// The peer closed first; `discarded` bytes were received and dropped
    Closed { discarded: usize },
}

/// Accumulates bytes from a stream until a newline is observed
#[derive(Debug, Clone, Copy)]
pub struct PacketReader {
    chunk_size: usize,
}

impl Default for PacketReader {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl PacketReader {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Read one packet
    ///
    /// Stops at the first chunk that contains a newline; the packet is
    /// everything received up to the end of that chunk, so bytes after the
    /// newline in the same chunk are kept. A read that wakes without data
    /// (EINTR, socket timeout) retries unless shutdown was requested, in
    /// which case `Err(Shutdown)` is returned. The flag is also checked after
    /// every read that returns data, so a client trickling bytes without a
    /// newline cannot hold off shutdown. There is no overall timeout.
    pub fn read_packet<R: Read>(
        &self,
        source: &mut R,
        shutdown: &ShutdownSignal,
    ) -> Result<ReadOutcome> {
        let mut chunk = vec![0u8; self.chunk_size];
        let mut buf = BytesMut::with_capacity(self.chunk_size);

        loop {
            let received = match source.read(&mut chunk) {
                Ok(0) => {
                    return Ok(ReadOutcome::Closed {
                        discarded: buf.len(),
                    })
                }
                Ok(n) => &chunk[..n],
                Err(e) if is_transient(&e) => {
                    shutdown.check()?;
                    continue;
                }
                Err(e) => return Err(PacketLogError::os("recv")(e)),
            };

            shutdown.check()?;
            buf.extend_from_slice(received);

            if received.contains(&NEWLINE) {
                return Ok(ReadOutcome::Complete(Packet::new(buf.freeze())));
            }
        }
    }
}
