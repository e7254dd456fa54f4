//! Configuration validation
//!
//! Ports and names are already checked by their types. This covers the
//! remaining semantic constraints before the relay starts.

use anyhow::Result;
use std::time::Duration;

use super::types::Config;
use crate::constants::timeout::MAX_CONFIGURED;

impl Config {
    /// Validate configuration for correctness
    ///
    /// Zero intervals and timeouts are rejected, as is anything longer than
    /// a day. Settings that work but are
    /// probably mistakes only produce a warning.
    pub fn validate(&self) -> Result<()> {
        let durations = [
            ("advertise.interval", self.advertise.interval),
            ("tcp.idle_timeout", self.tcp.idle_timeout),
            ("health_check.interval", self.health_check.interval),
            ("health_check.timeout", self.health_check.timeout),
        ];
        for (key, value) in durations {
            if value == Duration::ZERO {
                anyhow::bail!("{key} must be at least 1 second");
            }
            if value > MAX_CONFIGURED {
                anyhow::bail!(
                    "{key} must be at most {} seconds, got {}",
                    MAX_CONFIGURED.as_secs(),
                    value.as_secs()
                );
            }
        }

        if self.listen.discovery_port == self.listen.game_port {
            tracing::warn!(
                "listen.discovery_port and listen.game_port are both {}; \
                 only one UDP forwarder will be able to bind",
                self.listen.game_port
            );
        }

        if self.health_check.timeout >= self.health_check.interval {
            tracing::warn!(
                "health_check.timeout ({:?}) is not shorter than health_check.interval ({:?}); \
                 a slow upstream will delay every cycle",
                self.health_check.timeout,
                self.health_check.interval
            );
        }

        if is_loopback_host(self.upstream.host.as_str())
            && self.upstream.port == self.listen.game_port
        {
            tracing::warn!(
                "Upstream {} looks like this relay's own game port; traffic may loop",
                self.upstream
            );
        }

        Ok(())
    }
}

fn is_loopback_host(host: &str) -> bool {
    host.eq_ignore_ascii_case("localhost")
        || host
            .parse::<std::net::IpAddr>()
            .is_ok_and(|ip| ip.is_loopback())
}
