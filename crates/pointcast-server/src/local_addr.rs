//! LAN-reachable address detection.
//!
//! Screens show visitors a "connect your phone" address, so the relay must
//! advertise an IP that phones on the same network can actually reach — the
//! bind address (`0.0.0.0`) is useless for that.
//!
//! Detection uses the routing-table trick: `connect` on a UDP socket
//! performs no handshake and sends no packets, it only asks the kernel to
//! pick the source address it would route from.  Reading `local_addr` back
//! yields the outbound interface's IP.  The probe target just has to be a
//! routable public address; nothing is ever transmitted to it.

use std::io;
use std::net::{IpAddr, UdpSocket};

/// Probe target for route selection.  Never actually contacted.
const PROBE_ADDR: &str = "8.8.8.8:80";

/// Returns the IP of the interface this host would use for outbound
/// traffic — the best available guess for "the address phones can reach".
///
/// # Errors
///
/// Returns an error if no UDP socket can be created or the host has no
/// route at all (e.g. completely offline).  Callers fall back to loopback
/// and log the degradation.
pub fn detect_local_ip() -> io::Result<IpAddr> {
    let socket = UdpSocket::bind(("0.0.0.0", 0))?;
    socket.connect(PROBE_ADDR)?;
    Ok(socket.local_addr()?.ip())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
