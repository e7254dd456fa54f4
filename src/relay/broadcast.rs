//! Periodic discovery announcements on the local network

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time;
use tracing::{debug, info};

use crate::connection_error::RelayError;
use crate::network;

/// Sends the discovery packet to the LAN broadcast address on a fixed interval
pub struct BroadcastAnnouncer {
    socket: UdpSocket,
    target: SocketAddr,
    packet: Arc<[u8]>,
    interval: Duration,
}

impl BroadcastAnnouncer {
    /// Open a broadcast-enabled socket on an ephemeral port
    ///
    /// # Errors
    /// [`RelayError::Bind`] if the socket cannot be created.
    pub async fn bind(
        target: SocketAddr,
        packet: Arc<[u8]>,
        interval: Duration,
    ) -> Result<Self, RelayError> {
        let socket = network::bind_broadcast_socket()
            .await
            .map_err(|source| RelayError::Bind {
                label: "broadcast announcer",
                addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
                source,
            })?;

        Ok(Self {
            socket,
            target,
            packet,
            interval,
        })
    }

    /// Announce forever, sending once immediately and then every interval
    ///
    /// # Errors
    /// Only returns, with [`RelayError::Broadcast`], when a send fails.
    pub async fn run(self) -> Result<(), RelayError> {
        info!(
            "Broadcasting discovery to {} every {:?}",
            self.target, self.interval
        );

        loop {
            self.socket
                .send_to(&self.packet, self.target)
                .await
                .map_err(|source| RelayError::Broadcast {
                    target: self.target,
                    source,
                })?;
            debug!("Sent discovery broadcast to {}", self.target);
            time::sleep(self.interval).await;
        }
    }
}
