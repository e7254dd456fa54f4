use std::fmt;
use std::sync::{Arc, RwLock};

use crate::protocol::ServerInfo;

/// Outcome of the most recent reachability probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reachability {
    /// No probe has completed yet
    #[default]
    Unknown,
    /// The upstream accepted a TCP connection
    Online,
    /// The upstream refused or timed out the TCP connection
    Offline,
}

impl Reachability {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Online => "Online",
            Self::Offline => "Offline",
        }
    }
}

impl fmt::Display for Reachability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the upstream server's health
///
/// Always replaced as a whole, so a reader never sees the name from one
/// cycle paired with the player counts of another.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerStatus {
    pub reachability: Reachability,
    pub info: ServerInfo,
}

impl ServerStatus {
    /// Upstream refused the connection: default name and counts
    #[must_use]
    pub fn offline() -> Self {
        Self {
            reachability: Reachability::Offline,
            info: ServerInfo::default(),
        }
    }

    /// Upstream accepted the connection and reported `info`
    #[must_use]
    pub fn online(info: ServerInfo) -> Self {
        Self {
            reachability: Reachability::Online,
            info,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_reachable(&self) -> bool {
        self.reachability == Reachability::Online
    }

    #[inline]
    #[must_use]
    pub fn status_text(&self) -> &'static str {
        self.reachability.as_str()
    }
}

/// Status line logged after every check cycle
impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reachability {
            Reachability::Online => write!(
                f,
                "Server status: Online | Name: {} | Players: {}/{}",
                self.info.name, self.info.player_count, self.info.max_players
            ),
            other => write!(f, "Server status: {other}"),
        }
    }
}

/// Shared handle to the current [`ServerStatus`]
///
/// Cloning the handle shares the same record. The lock is never held across
/// an `.await`; readers clone a snapshot and release it immediately.
#[derive(Debug, Clone, Default)]
pub struct HealthState {
    inner: Arc<RwLock<ServerStatus>>,
}

impl HealthState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consistent copy of the current record
    #[must_use]
    pub fn snapshot(&self) -> ServerStatus {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Whether the last probe found the upstream reachable
    #[must_use]
    pub fn is_reachable(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .is_reachable()
    }

    /// Replace the whole record in one write
    ///
    /// Only the health monitor calls this in a running relay.
    pub fn replace(&self, status: ServerStatus) {
        *self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = status;
    }
}
