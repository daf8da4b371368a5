//! Session Handler
//!
//! Serves one accepted connection: one packet in, the whole log out.

use std::io::Write;
use std::net::TcpStream;
use std::time::Duration;

use crate::config::Config;
use crate::error::{is_transient, PacketLogError, Result};
use crate::lifecycle::ShutdownSignal;
use crate::protocol::{PacketReader, ReadOutcome};
use crate::store::LogStore;

/// What a finished session did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Packet appended, log echoed
    Echoed { packet_len: usize, echoed: u64 },

    /// Peer closed before a newline; nothing stored or sent
    ClosedEarly { discarded: usize },
}

/// Handles a single client connection
pub struct Session<'a> {
    /// Client socket, closed when the session is dropped
    stream: TcpStream,

    /// Peer address for logging
    peer: String,

    config: &'a Config,

    shutdown: &'a ShutdownSignal,
}

impl<'a> Session<'a> {
    /// Wrap an accepted stream
    ///
    /// Read and write timeouts are set to the shutdown poll interval so
    /// blocked calls wake periodically; an expired timeout is retried, not
    /// treated as an error.
    pub fn new(
        stream: TcpStream,
        peer: String,
        config: &'a Config,
        shutdown: &'a ShutdownSignal,
    ) -> Result<Self> {
        let poll = Some(Duration::from_millis(config.shutdown_poll_ms));
        stream
            .set_read_timeout(poll)
            .map_err(PacketLogError::os("setsockopt"))?;
        stream
            .set_write_timeout(poll)
            .map_err(PacketLogError::os("setsockopt"))?;

        Ok(Self {
            stream,
            peer,
            config,
            shutdown,
        })
    }

    /// Run the session to completion
    ///
    /// 1. Open the log file (created if missing)
    /// 2. Read one packet; stop here if the peer closed first
    /// 3. Append the packet
    /// 4. Stream the log from offset 0 back to the client
    ///
    /// The connection and log handle are closed when this returns.
    pub fn serve(mut self) -> Result<SessionOutcome> {
        let mut store = LogStore::open(&self.config.data_file, self.config.sync_strategy)?;

        let reader = PacketReader::new(self.config.chunk_size);
        let packet = match reader.read_packet(&mut self.stream, self.shutdown)? {
            ReadOutcome::Complete(packet) => packet,
            ReadOutcome::Closed { discarded } => {
                tracing::debug!(
                    "{} closed before newline, dropped {} bytes",
                    self.peer,
                    discarded
                );
                return Ok(SessionOutcome::ClosedEarly { discarded });
            }
        };

        store.append(packet.as_bytes())?;
        tracing::trace!("Appended {} bytes from {}", packet.len(), self.peer);

        let mut echoed = 0u64;
        let mut chunks = store.chunks(self.config.chunk_size)?;
        while let Some(chunk) = chunks.next_chunk()? {
            send_all(&mut self.stream, chunk, self.shutdown)?;
            echoed += chunk.len() as u64;
        }

        Ok(SessionOutcome::Echoed {
            packet_len: packet.len(),
            echoed,
        })
    }
}

/// Send a whole buffer, looping on partial sends
fn send_all(stream: &mut TcpStream, mut buf: &[u8], shutdown: &ShutdownSignal) -> Result<()> {
    while !buf.is_empty() {
        match stream.write(buf) {
            Ok(0) => {
                return Err(PacketLogError::Os {
                    op: "send",
                    source: std::io::ErrorKind::WriteZero.into(),
                })
            }
            Ok(n) => {
                buf = &buf[n..];
                shutdown.check()?;
            }
            Err(e) if is_transient(&e) => shutdown.check()?,
            Err(e) => return Err(PacketLogError::os("send")(e)),
        }
    }
    Ok(())
}
