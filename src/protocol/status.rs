//! Status response parsing

use serde::Deserialize;
use thiserror::Error;

use super::constants::{STATUS_KIND_OFFSET, STATUS_RESPONSE_KIND, UNKNOWN_SERVER_NAME};

/// Why a datagram was not accepted as a status response
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum StatusParseError {
    /// Too short to carry a header plus payload
    #[error("status response too short ({len} bytes)")]
    TooShort { len: usize },

    /// Packet kind byte is not a status response
    #[error("not a status response (kind byte {kind:#04x})")]
    NotStatusResponse { kind: u8 },
}

/// Name and player counts reported by the upstream server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub player_count: u32,
    pub max_players: u32,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: UNKNOWN_SERVER_NAME.to_string(),
            player_count: 0,
            max_players: 0,
        }
    }
}

/// JSON body of a status response; absent keys take their defaults
#[derive(Debug, Deserialize)]
struct StatusBody {
    #[serde(default = "unknown_name")]
    name: String,
    #[serde(default)]
    playercount: u32,
    #[serde(default)]
    maxplayers: u32,
}

fn unknown_name() -> String {
    UNKNOWN_SERVER_NAME.to_string()
}

impl From<StatusBody> for ServerInfo {
    fn from(body: StatusBody) -> Self {
        Self {
            name: body.name,
            player_count: body.playercount,
            max_players: body.maxplayers,
        }
    }
}

/// Parse a status response datagram
///
/// Rejects the datagram only when it is too short or its kind byte is wrong.
/// The payload after the 3-byte header is decoded as lossy UTF-8 and parsed
/// as JSON; malformed JSON, a non-object value or a field of the wrong type
/// all yield [`ServerInfo::default`] rather than an error, since the upstream
/// is outside our control.
///
/// # Examples
/// ```
/// use troxy::protocol::parse_status_response;
///
/// let buf = b"\x00\x00\x03{\"name\":\"Foo\",\"playercount\":2,\"maxplayers\":8}";
/// let info = parse_status_response(buf).unwrap();
/// assert_eq!((info.name.as_str(), info.player_count, info.max_players), ("Foo", 2, 8));
///
/// // Garbage after a valid header is not an error
/// let info = parse_status_response(b"\x00\x00\x03{oops").unwrap();
/// assert_eq!(info.name, "Unknown");
///
/// // A different packet kind is
/// assert!(parse_status_response(b"\x00\x00\x07{}").is_err());
/// ```
pub fn parse_status_response(buf: &[u8]) -> Result<ServerInfo, StatusParseError> {
    if buf.len() <= STATUS_KIND_OFFSET + 1 {
        return Err(StatusParseError::TooShort { len: buf.len() });
    }

    let kind = buf[STATUS_KIND_OFFSET];
    if kind != STATUS_RESPONSE_KIND {
        return Err(StatusParseError::NotStatusResponse { kind });
    }

    let payload = String::from_utf8_lossy(&buf[STATUS_KIND_OFFSET + 1..]);
    Ok(serde_json::from_str::<StatusBody>(&payload)
        .map(ServerInfo::from)
        .unwrap_or_default())
}
