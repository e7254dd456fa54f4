//! Constants used throughout the relay
//!
//! Wire-format bytes live in [`crate::protocol`]; this module holds buffer
//! sizes and the fixed timeouts that are not exposed as configuration.

use std::time::Duration;

/// Buffer size constants
pub mod buffer {
    /// Largest payload a single UDP datagram can carry over IPv4
    ///
    /// Forwarded datagrams are relayed verbatim, so the receive buffer must
    /// never truncate them.
    pub const UDP_DATAGRAM: usize = 65_507;

    /// Read chunk for each direction of a relayed TCP connection (16KB)
    pub const TCP_CHUNK: usize = 16 * 1024;

    /// Receive buffer for a single status response datagram
    pub const STATUS_RESPONSE: usize = 1024;
}

/// Timeout constants
pub mod timeout {
    use super::Duration;

    /// How long a UDP forwarding exchange waits for the upstream reply
    pub const UDP_REPLY: Duration = Duration::from_secs(1);

    /// Connect timeout for the upstream half of a relayed TCP connection
    pub const UPSTREAM_CONNECT: Duration = Duration::from_secs(10);

    /// Pause after a failed accept before polling the listener again
    pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

    /// Stand-in for "never" when a deadline would overflow `Instant`
    pub const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

    /// Longest interval or timeout accepted from configuration
    pub const MAX_CONFIGURED: Duration = Duration::from_secs(24 * 60 * 60);
}

/// TCP listener constants
pub mod listener {
    /// Pending-connection backlog for the gameplay listener
    pub const BACKLOG: i32 = 128;
}
