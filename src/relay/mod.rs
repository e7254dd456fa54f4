//! Relay orchestration
//!
//! [`Relay`] owns the configuration and the shared health state, binds every
//! listener and spawns one task per component. A listener that fails to bind
//! is logged and skipped; everything else keeps running.

pub mod broadcast;
pub mod tcp;
pub mod udp;

pub use broadcast::BroadcastAnnouncer;
pub use tcp::TcpRelay;
pub use udp::UdpForwarder;

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::Config;
use crate::connection_error::RelayError;
use crate::health::{HealthMonitor, HealthState};
use crate::network;
use crate::protocol::build_discovery_packet;

/// Labels used in logs and bind errors
const DISCOVERY_UDP: &str = "discovery UDP";
const GAME_UDP: &str = "game UDP";

/// The relay and everything it shares between tasks
pub struct Relay {
    config: Arc<Config>,
    discovery_packet: Arc<[u8]>,
    broadcast_ip: Ipv4Addr,
    health: HealthState,
}

impl Relay {
    /// Build the discovery packet and fresh health state from `config`
    ///
    /// The broadcast address is detected here when the config leaves it unset.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let broadcast_ip = config
            .advertise
            .broadcast_ip
            .unwrap_or_else(network::detect_broadcast_ip);
        let discovery_packet = build_discovery_packet(config.advertise.name.as_str()).into();

        Self {
            config: Arc::new(config),
            discovery_packet,
            broadcast_ip,
            health: HealthState::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn health(&self) -> &HealthState {
        &self.health
    }

    #[must_use]
    pub fn discovery_packet(&self) -> &[u8] {
        &self.discovery_packet
    }

    /// Where announcements are sent
    #[must_use]
    pub fn broadcast_target(&self) -> SocketAddr {
        SocketAddr::from((self.broadcast_ip, self.config.listen.discovery_port.get()))
    }

    /// Run one health check, then start every component
    ///
    /// Returns once all tasks are spawned. Components whose socket could not
    /// be bound are absent from the returned handles.
    pub async fn start(&self) -> RelayHandles {
        let config = &self.config;
        info!(
            "Relaying to {} as '{}'",
            config.upstream, config.advertise.name
        );

        let monitor = HealthMonitor::new(
            config.upstream.clone(),
            config.health_check.clone(),
            self.health.clone(),
        );
        monitor.check_now().await;
        let monitor = monitor.spawn();

        let announcer = match BroadcastAnnouncer::bind(
            self.broadcast_target(),
            Arc::clone(&self.discovery_packet),
            config.advertise.interval,
        )
        .await
        {
            Ok(announcer) => Some(tokio::spawn(async move {
                if let Err(e) = announcer.run().await {
                    e.log("Broadcast announcer stopped");
                }
            })),
            Err(e) => {
                disabled(&e, "broadcasting");
                None
            }
        };

        let discovery = self
            .spawn_udp(DISCOVERY_UDP, config.listen.discovery_addr())
            .await;
        let game_udp = self.spawn_udp(GAME_UDP, config.listen.game_addr()).await;

        let tcp = match TcpRelay::bind(
            config.listen.game_addr(),
            config.upstream.clone(),
            self.health.clone(),
            config.tcp.idle_timeout,
        ) {
            Ok(relay) => spawn_listener(relay.local_addr(), relay.run(), "TCP forwarding"),
            Err(e) => {
                disabled(&e, "TCP forwarding");
                None
            }
        };

        RelayHandles {
            monitor,
            announcer,
            discovery,
            game_udp,
            tcp,
        }
    }

    async fn spawn_udp(
        &self,
        label: &'static str,
        addr: SocketAddr,
    ) -> Option<(SocketAddr, JoinHandle<()>)> {
        let forwarder = UdpForwarder::bind(
            label,
            addr,
            self.config.upstream.clone(),
            Arc::clone(&self.discovery_packet),
            self.health.clone(),
        )
        .await;

        match forwarder {
            Ok(forwarder) => spawn_listener(forwarder.local_addr(), forwarder.run(), label),
            Err(e) => {
                disabled(&e, label);
                None
            }
        }
    }
}

fn disabled(e: &RelayError, what: &str) {
    error!("{}; {} disabled", e, what);
}

/// Spawn a bound listener's task, or disable it if its address is unknown
fn spawn_listener<F>(
    local: io::Result<SocketAddr>,
    task: F,
    what: &str,
) -> Option<(SocketAddr, JoinHandle<()>)>
where
    F: Future<Output = ()> + Send + 'static,
{
    match local {
        Ok(addr) => Some((addr, tokio::spawn(task))),
        Err(e) => {
            disabled(&RelayError::from(e), what);
            None
        }
    }
}

/// Handles to the spawned relay tasks
///
/// Each listener entry carries the address it actually bound, which
/// differs from the configured one when port 0 was requested.
pub struct RelayHandles {
    pub monitor: JoinHandle<()>,
    pub announcer: Option<JoinHandle<()>>,
    pub discovery: Option<(SocketAddr, JoinHandle<()>)>,
    pub game_udp: Option<(SocketAddr, JoinHandle<()>)>,
    pub tcp: Option<(SocketAddr, JoinHandle<()>)>,
}

impl RelayHandles {
    #[must_use]
    pub fn discovery_addr(&self) -> Option<SocketAddr> {
        self.discovery.as_ref().map(|(addr, _)| *addr)
    }

    #[must_use]
    pub fn game_udp_addr(&self) -> Option<SocketAddr> {
        self.game_udp.as_ref().map(|(addr, _)| *addr)
    }

    #[must_use]
    pub fn tcp_addr(&self) -> Option<SocketAddr> {
        self.tcp.as_ref().map(|(addr, _)| *addr)
    }

    /// Stop every task; their sockets close as the tasks drop
    pub fn abort_all(&self) {
        self.monitor.abort();
        let listeners = [&self.discovery, &self.game_udp, &self.tcp];
        for (_, handle) in listeners.into_iter().flatten() {
            handle.abort();
        }
        if let Some(handle) = &self.announcer {
            handle.abort();
        }
    }
}
