//! Client
//!
//! Sends one packet and collects the echoed log.

use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};

use crate::error::{PacketLogError, Result};

/// Send `payload` as one packet and return the server's response
///
/// A trailing newline is added if missing. The write side is shut down
/// after sending and the response is read until the server closes.
pub fn send_packet(addr: impl ToSocketAddrs, payload: &[u8]) -> Result<Vec<u8>> {
    let mut stream = TcpStream::connect(addr).map_err(PacketLogError::os("connect"))?;
    stream
        .set_nodelay(true)
        .map_err(PacketLogError::os("setsockopt"))?;

    stream.write_all(payload).map_err(PacketLogError::os("send"))?;
    if !payload.ends_with(b"\n") {
        stream.write_all(b"\n").map_err(PacketLogError::os("send"))?;
    }
    stream
        .shutdown(Shutdown::Write)
        .map_err(PacketLogError::os("shutdown"))?;

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .map_err(PacketLogError::os("recv"))?;
    Ok(response)
}
