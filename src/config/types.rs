//! Configuration type definitions

use crate::types::{DisplayName, HostName, Port, duration_serde};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Main relay configuration
///
/// Immutable once the relay has started.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Remote game server
    pub upstream: UpstreamConfig,
    /// What LAN clients are told about this relay
    #[serde(default)]
    pub advertise: AdvertiseConfig,
    /// Local listening sockets
    #[serde(default)]
    pub listen: ListenConfig,
    /// TCP session settings
    #[serde(default)]
    pub tcp: TcpConfig,
    /// Upstream health probing
    #[serde(default)]
    pub health_check: HealthCheckConfig,
}

impl Config {
    /// Config with every optional section at its default
    #[must_use]
    pub fn for_upstream(host: HostName) -> Self {
        Self {
            upstream: UpstreamConfig {
                host,
                port: Port::default(),
            },
            advertise: AdvertiseConfig::default(),
            listen: ListenConfig::default(),
            tcp: TcpConfig::default(),
            health_check: HealthCheckConfig::default(),
        }
    }
}

/// The single remote game server this instance relays to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpstreamConfig {
    /// DNS name or IP literal
    pub host: HostName,
    /// Gameplay port on the upstream (default: 7777)
    #[serde(default)]
    pub port: Port,
}

impl UpstreamConfig {
    /// Target accepted by tokio's connect and lookup functions
    ///
    /// Resolved again on every use.
    #[must_use]
    pub fn target(&self) -> (&str, u16) {
        (self.host.as_str(), self.port.get())
    }
}

impl fmt::Display for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Discovery advertisement settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdvertiseConfig {
    /// Name shown in the client's server list (default: "TerrariaProxy")
    #[serde(default)]
    pub name: DisplayName,
    /// Directed broadcast address for announcements
    ///
    /// Detected from the local IPv4 address at startup when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broadcast_ip: Option<Ipv4Addr>,
    /// Pause between announcements
    #[serde(
        with = "duration_serde",
        default = "super::defaults::broadcast_interval"
    )]
    pub interval: Duration,
}

impl Default for AdvertiseConfig {
    fn default() -> Self {
        Self {
            name: DisplayName::default(),
            broadcast_ip: None,
            interval: super::defaults::broadcast_interval(),
        }
    }
}

/// Local listening addresses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ListenConfig {
    /// Address every listener binds to (default: 0.0.0.0)
    pub host: IpAddr,
    /// UDP port answering discovery requests (default: 8888)
    pub discovery_port: Port,
    /// UDP and TCP gameplay port (default: 7777)
    pub game_port: Port,
}

impl ListenConfig {
    #[must_use]
    pub fn discovery_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.discovery_port.get())
    }

    #[must_use]
    pub fn game_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.game_port.get())
    }
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            discovery_port: Port::DISCOVERY,
            game_port: Port::GAME,
        }
    }
}

/// Relayed TCP session settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TcpConfig {
    /// Close a relayed connection after this long without traffic
    #[serde(
        with = "duration_serde",
        default = "super::defaults::tcp_idle_timeout"
    )]
    pub idle_timeout: Duration,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            idle_timeout: super::defaults::tcp_idle_timeout(),
        }
    }
}

/// Health check configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthCheckConfig {
    /// Interval between health checks
    #[serde(
        with = "duration_serde",
        default = "super::defaults::health_check_interval"
    )]
    pub interval: Duration,
    /// Timeout for the TCP connect and for the status reply
    #[serde(
        with = "duration_serde",
        default = "super::defaults::health_check_timeout"
    )]
    pub timeout: Duration,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval: super::defaults::health_check_interval(),
            timeout: super::defaults::health_check_timeout(),
        }
    }
}
