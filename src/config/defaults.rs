//! Default values for configuration fields
//!
//! Used by serde for keys absent from the config file.

use std::time::Duration;

/// Default pause between discovery broadcasts
#[inline]
pub fn broadcast_interval() -> Duration {
    Duration::from_secs(5)
}

/// Default idle timeout for relayed TCP connections
#[inline]
pub fn tcp_idle_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Default health check interval
#[inline]
pub fn health_check_interval() -> Duration {
    Duration::from_secs(10)
}

/// Default health check timeout
#[inline]
pub fn health_check_timeout() -> Duration {
    Duration::from_secs(2)
}
