//! Terraria LAN wire formats
//!
//! Pure encoding and recognition functions; nothing in here touches a socket.
//!
//! - [`build_discovery_packet`] / [`is_discovery_packet`]: the discovery
//!   datagram LAN clients broadcast and the reply that advertises a server
//! - [`STATUS_REQUEST`] / [`parse_status_response`]: the UDP status query
//!   used by the health monitor

mod constants;
mod discovery;
mod status;

pub use constants::{
    DISCOVERY_FOOTER, DISCOVERY_HEADER, DISCOVERY_UNKNOWN, FULL_NAME_MAX, SHORT_NAME_MAX,
    STATUS_REQUEST, STATUS_RESPONSE_KIND, UNKNOWN_SERVER_NAME,
};
pub use discovery::{build_discovery_packet, is_discovery_packet};
pub use status::{ServerInfo, StatusParseError, parse_status_response};
