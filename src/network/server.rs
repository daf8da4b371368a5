//! TCP Server
//!
//! Owns the listening socket and serves accepted connections one at a time.

use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use crate::config::{Config, ErrorPolicy};
use crate::error::{is_transient, PacketLogError, Result};
use crate::lifecycle::ShutdownSignal;

use super::session::{Session, SessionOutcome};

/// TCP server for packetlog
///
/// Strictly sequential: a connection is served to completion before the
/// next one is accepted, so a client that never sends a newline holds up
/// everyone else.
pub struct Server {
    config: Config,

    /// Bound, listening socket
    listener: Socket,

    /// Address actually bound (resolves port 0)
    local_addr: SocketAddr,

    shutdown: ShutdownSignal,
}

impl Server {
    /// Create, configure, bind and listen
    ///
    /// `SO_REUSEADDR` is set so a restart right after a crash can rebind.
    /// The listener gets a receive timeout of `shutdown_poll_ms`, which makes
    /// accept return periodically to look at the shutdown flag.
    pub fn bind(config: Config, shutdown: ShutdownSignal) -> Result<Self> {
        let addr = config.listen_addr;

        let listener = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
            .map_err(PacketLogError::os("socket"))?;
        listener
            .set_reuse_address(true)
            .map_err(PacketLogError::os("setsockopt"))?;
        listener
            .bind(&addr.into())
            .map_err(PacketLogError::os("bind"))?;
        listener
            .listen(config.backlog.min(i32::MAX as u32) as i32)
            .map_err(PacketLogError::os("listen"))?;
        listener
            .set_read_timeout(Some(Duration::from_millis(config.shutdown_poll_ms)))
            .map_err(PacketLogError::os("setsockopt"))?;

        let local_addr = listener
            .local_addr()
            .map_err(PacketLogError::os("getsockname"))?
            .as_socket()
            .unwrap_or(addr);

        tracing::info!("Listening on {}", local_addr);

        Ok(Self {
            config,
            listener,
            local_addr,
            shutdown,
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept loop (blocking)
    ///
    /// Returns `Ok(())` once shutdown is requested. Returns an error for a
    /// failed accept, or, under [`ErrorPolicy::Fatal`], for any session
    /// I/O error. Under [`ErrorPolicy::Isolate`] session errors are logged
    /// and the loop keeps going.
    pub fn run(&mut self) -> Result<()> {
        loop {
            if self.shutdown.is_requested() {
                return Ok(());
            }

            let (stream, peer) = match self.accept() {
                Ok(Some(accepted)) => accepted,
                Ok(None) => continue,
                Err(e) => return Err(e),
            };

            tracing::info!("Accepted connection from {}", peer);

            let result = Session::new(stream, peer.clone(), &self.config, &self.shutdown)
                .and_then(Session::serve);

            match result {
                Ok(SessionOutcome::Echoed { packet_len, echoed }) => {
                    tracing::debug!("{}: stored {} bytes, echoed {}", peer, packet_len, echoed);
                }
                Ok(SessionOutcome::ClosedEarly { .. }) => {}
                Err(PacketLogError::Shutdown) => {
                    tracing::info!("Closed connection from {}", peer);
                    return Ok(());
                }
                Err(e) => self.session_failed(&peer, e)?,
            }

            tracing::info!("Closed connection from {}", peer);
        }
    }

    /// Accept one connection; `None` when the call woke without one
    fn accept(&self) -> Result<Option<(TcpStream, String)>> {
        match self.listener.accept() {
            Ok((socket, addr)) => Ok(Some((socket.into(), peer_string(&addr)))),
            Err(e) if is_transient(&e) => Ok(None),
            Err(e) => Err(PacketLogError::os("accept")(e)),
        }
    }

    fn session_failed(&self, peer: &str, err: PacketLogError) -> Result<()> {
        match self.config.error_policy {
            ErrorPolicy::Fatal => {
                tracing::info!("Closed connection from {}", peer);
                Err(err)
            }
            ErrorPolicy::Isolate if err.is_peer_disconnect() => {
                tracing::debug!("{} disconnected: {}", peer, err);
                Ok(())
            }
            ErrorPolicy::Isolate => {
                tracing::warn!("Session with {} aborted: {}", peer, err);
                Ok(())
            }
        }
    }
}

fn peer_string(addr: &SockAddr) -> String {
    addr.as_socket()
        .map(|a| a.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
