//! Discovery packet encoding and recognition

use super::constants::{
    DISCOVERY_FOOTER, DISCOVERY_HEADER, DISCOVERY_UNKNOWN, FULL_NAME_MAX, SHORT_NAME_MAX,
};

/// Build the discovery reply advertising `name`
///
/// Layout: header, unknown constant, `len(short)`, short name, `len(full)`,
/// full name, footer. The short name is the first [`SHORT_NAME_MAX`] bytes of
/// `name` and the full name the first [`FULL_NAME_MAX`] bytes. Truncation is
/// byte-wise, so a multi-byte UTF-8 character may be cut; clients read the
/// field as single-byte characters anyway.
///
/// # Examples
/// ```
/// use troxy::protocol::build_discovery_packet;
///
/// let packet = build_discovery_packet("TerrariaProxy");
/// assert_eq!(&packet[..4], &[0xf2, 0x03, 0x00, 0x00]);
/// assert_eq!(packet[8], 8); // short name length
/// assert_eq!(&packet[9..17], b"Terraria");
/// assert_eq!(packet[17], 13); // full name length
/// ```
#[must_use]
pub fn build_discovery_packet(name: &str) -> Vec<u8> {
    let bytes = name.as_bytes();
    let short = &bytes[..bytes.len().min(SHORT_NAME_MAX)];
    let full = &bytes[..bytes.len().min(FULL_NAME_MAX)];

    let mut packet = Vec::with_capacity(
        DISCOVERY_HEADER.len()
            + DISCOVERY_UNKNOWN.len()
            + 2
            + short.len()
            + full.len()
            + DISCOVERY_FOOTER.len(),
    );
    packet.extend_from_slice(&DISCOVERY_HEADER);
    packet.extend_from_slice(&DISCOVERY_UNKNOWN);
    // Both caps are far below u8::MAX
    packet.push(short.len() as u8);
    packet.extend_from_slice(short);
    packet.push(full.len() as u8);
    packet.extend_from_slice(full);
    packet.extend_from_slice(&DISCOVERY_FOOTER);
    packet
}

/// Returns true if `buf` starts with the discovery header
///
/// Anything after the header is ignored.
#[inline]
#[must_use]
pub fn is_discovery_packet(buf: &[u8]) -> bool {
    buf.starts_with(&DISCOVERY_HEADER)
}
