//! Socket setup and local address discovery
//!
//! Listener sockets are built with socket2 so options can be set before
//! `bind`, then handed to tokio.

use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::{TcpListener, TcpStream, UdpSocket, lookup_host};
use tracing::debug;

use crate::constants::listener::BACKLOG;

/// Public address used only to select the outbound interface; nothing is sent
const ROUTE_PROBE_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 80);

/// Bind a TCP listener with `SO_REUSEADDR`
///
/// Allows an immediate restart while old connections sit in `TIME_WAIT`.
pub fn bind_tcp_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(BACKLOG)?;
    TcpListener::from_std(socket.into())
}

/// UDP socket on an ephemeral port with `SO_BROADCAST` enabled
pub async fn bind_broadcast_socket() -> io::Result<UdpSocket> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
    socket.set_broadcast(true)?;
    Ok(socket)
}

/// Ephemeral-port wildcard address in the same family as `peer`
#[must_use]
pub fn unspecified_for(peer: &SocketAddr) -> SocketAddr {
    match peer {
        SocketAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
        SocketAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
    }
}

/// Resolve `host:port`, preferring an IPv4 address
///
/// LAN clients and the relay's own UDP sockets are IPv4, so an IPv6 result
/// is only used when nothing else is available.
pub async fn resolve(host: &str, port: u16) -> io::Result<SocketAddr> {
    let addrs: Vec<SocketAddr> = lookup_host((host, port)).await?.collect();
    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{host}:{port} resolved to no addresses"),
            )
        })
}

/// Disable Nagle on a relayed gameplay connection
///
/// Game traffic is many small packets where latency matters more than
/// throughput. Failure is logged and otherwise ignored.
pub fn set_low_latency(stream: &TcpStream) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Failed to set TCP_NODELAY: {}", e);
    }
}

/// IPv4 address of the interface that routes to the internet
///
/// Uses a connected UDP socket, which picks a route without sending any
/// packet. Returns `None` when there is no usable route.
#[must_use]
pub fn local_ipv4() -> Option<Ipv4Addr> {
    let socket = std::net::UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect(ROUTE_PROBE_ADDR).ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if !ip.is_unspecified() => Some(ip),
        _ => None,
    }
}

/// Directed broadcast address of the /24 containing `ip`
///
/// # Examples
/// ```
/// use std::net::Ipv4Addr;
/// use troxy::network::broadcast_for;
///
/// assert_eq!(broadcast_for(Ipv4Addr::new(192, 168, 1, 42)), Ipv4Addr::new(192, 168, 1, 255));
/// ```
#[must_use]
pub fn broadcast_for(ip: Ipv4Addr) -> Ipv4Addr {
    let [a, b, c, _] = ip.octets();
    Ipv4Addr::new(a, b, c, 255)
}

/// Broadcast address for announcements when none is configured
///
/// Falls back to the limited broadcast address when no local IPv4 address
/// can be found.
#[must_use]
pub fn detect_broadcast_ip() -> Ipv4Addr {
    match local_ipv4() {
        Some(ip) => {
            let broadcast = broadcast_for(ip);
            debug!("Local IP {}, broadcasting to {}", ip, broadcast);
            broadcast
        }
        None => {
            debug!("No local IPv4 address found, broadcasting to {}", Ipv4Addr::BROADCAST);
            Ipv4Addr::BROADCAST
        }
    }
}
