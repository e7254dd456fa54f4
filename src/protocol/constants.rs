//! Fixed byte sequences of the Terraria LAN discovery and status formats

/// First four bytes of every discovery datagram
pub const DISCOVERY_HEADER: [u8; 4] = [0xf2, 0x03, 0x00, 0x00];

/// Constant field following the header; its meaning is unknown
pub const DISCOVERY_UNKNOWN: [u8; 4] = [0x61, 0x1e, 0x00, 0x00];

/// Trailer appended after the full name
pub const DISCOVERY_FOOTER: [u8; 10] = [0x68, 0x10, 0x01, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00];

/// Maximum bytes of the advertised name used for the short name field
pub const SHORT_NAME_MAX: usize = 8;

/// Maximum bytes of the advertised name used for the full name field
pub const FULL_NAME_MAX: usize = 16;

/// Status request sent to the upstream server over UDP
pub const STATUS_REQUEST: [u8; 3] = [0x03, 0x00, 0x01];

/// Byte index carrying the packet kind in a status response
pub const STATUS_KIND_OFFSET: usize = 2;

/// Packet kind identifying a status response
pub const STATUS_RESPONSE_KIND: u8 = 0x03;

/// Placeholder name used when the upstream does not report one
pub const UNKNOWN_SERVER_NAME: &str = "Unknown";
