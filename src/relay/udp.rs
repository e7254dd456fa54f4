//! UDP discovery responder and gameplay forwarder
//!
//! One [`UdpForwarder`] serves each UDP port. Discovery requests are
//! answered locally; everything else is relayed to the upstream one
//! request/reply exchange at a time.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::config::UpstreamConfig;
use crate::connection_error::RelayError;
use crate::constants::buffer::UDP_DATAGRAM;
use crate::constants::timeout::UDP_REPLY;
use crate::health::HealthState;
use crate::network;
use crate::protocol::is_discovery_packet;

/// Answers discovery requests and forwards other datagrams upstream
pub struct UdpForwarder {
    label: &'static str,
    socket: UdpSocket,
    outbound: UdpSocket,
    upstream: UpstreamConfig,
    discovery_reply: Arc<[u8]>,
    health: HealthState,
}

impl UdpForwarder {
    /// Bind the listening socket plus an outbound socket on an ephemeral port
    ///
    /// # Errors
    /// [`RelayError::Bind`] if either socket cannot be bound.
    pub async fn bind(
        label: &'static str,
        listen_addr: SocketAddr,
        upstream: UpstreamConfig,
        discovery_reply: Arc<[u8]>,
        health: HealthState,
    ) -> Result<Self, RelayError> {
        let socket = UdpSocket::bind(listen_addr)
            .await
            .map_err(|source| RelayError::Bind {
                label,
                addr: listen_addr,
                source,
            })?;

        let outbound_addr = network::unspecified_for(&listen_addr);
        let outbound = UdpSocket::bind(outbound_addr)
            .await
            .map_err(|source| RelayError::Bind {
                label,
                addr: outbound_addr,
                source,
            })?;

        Ok(Self {
            label,
            socket,
            outbound,
            upstream,
            discovery_reply,
            health,
        })
    }

    /// Address of the listening socket
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Serve datagrams forever
    ///
    /// Errors end only the exchange they occur in.
    pub async fn run(self) {
        if let Ok(addr) = self.socket.local_addr() {
            info!("{} listening on {}", self.label, addr);
        }

        let mut buf = vec![0u8; UDP_DATAGRAM];
        let mut reply_buf = vec![0u8; UDP_DATAGRAM];

        loop {
            let (n, from) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    // ICMP errors from earlier replies surface here on some platforms
                    debug!("{} receive error: {}", self.label, e);
                    continue;
                }
            };

            if let Err(e) = self.handle_datagram(&buf[..n], from, &mut reply_buf).await {
                e.log(&format!("{} exchange for {}", self.label, from));
            }
        }
    }

    async fn handle_datagram(
        &self,
        data: &[u8],
        from: SocketAddr,
        reply_buf: &mut [u8],
    ) -> Result<(), RelayError> {
        if is_discovery_packet(data) {
            debug!("{}: discovery request from {}", self.label, from);
            self.socket.send_to(&self.discovery_reply, from).await?;
            return Ok(());
        }

        if !self.health.is_reachable() {
            debug!(
                "{}: upstream unreachable, dropping {} bytes from {}",
                self.label,
                data.len(),
                from
            );
            return Ok(());
        }

        self.discard_stale_replies(reply_buf);

        let (host, port) = self.upstream.target();
        let target = network::resolve(host, port).await?;
        self.outbound.send_to(data, target).await?;

        match timeout(UDP_REPLY, self.outbound.recv_from(reply_buf)).await {
            Ok(Ok((n, _))) => {
                self.socket.send_to(&reply_buf[..n], from).await?;
                debug!(
                    "{}: relayed {} bytes to {} and {} bytes back to {}",
                    self.label,
                    data.len(),
                    target,
                    n,
                    from
                );
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                debug!(
                    "{}: no reply from {} within {:?} for {}",
                    self.label, target, UDP_REPLY, from
                );
            }
        }
        Ok(())
    }

    /// Drop replies that arrived after their exchange timed out
    fn discard_stale_replies(&self, scratch: &mut [u8]) {
        while let Ok((n, _)) = self.outbound.try_recv_from(scratch) {
            debug!("{}: discarding late {} byte reply", self.label, n);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::ServerStatus;
    use crate::protocol::{DISCOVERY_HEADER, ServerInfo, build_discovery_packet};
    use crate::types::{HostName, Port};
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(2);

    fn upstream(port: u16) -> UpstreamConfig {
        UpstreamConfig {
            host: HostName::new("127.0.0.1".to_string()).unwrap(),
            port: Port::new(port).unwrap(),
        }
    }

    fn reachable() -> HealthState {
        let state = HealthState::new();
        state.replace(ServerStatus::online(ServerInfo::default()));
        state
    }

    async fn start(upstream_port: u16, health: HealthState) -> SocketAddr {
        let forwarder = UdpForwarder::bind(
            "test UDP",
            "127.0.0.1:0".parse().unwrap(),
            upstream(upstream_port),
            build_discovery_packet("Relay").into(),
            health,
        )
        .await
        .unwrap();
        let addr = forwarder.local_addr().unwrap();
        tokio::spawn(forwarder.run());
        addr
    }

    #[tokio::test]
    async fn test_discovery_answered_locally_even_when_unreachable() {
        let addr = start(9, HealthState::new()).await;
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        client.send_to(&DISCOVERY_HEADER, addr).await.unwrap();
        let mut buf = [0u8; 256];
        let (n, from) = timeout(WAIT, client.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(from, addr);
        assert_eq!(&buf[..n], build_discovery_packet("Relay").as_slice());
    }

    #[tokio::test]
    async fn test_datagram_relayed_and_reply_returned() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let server_port = server.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut buf = [0u8; 256];
            let (n, from) = server.recv_from(&mut buf).await.unwrap();
            let mut reply = b"ack:".to_vec();
            reply.extend_from_slice(&buf[..n]);
            server.send_to(&reply, from).await.unwrap();
        });

        let addr = start(server_port, reachable()).await;
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(b"ping", addr).await.unwrap();

        let mut buf = [0u8; 256];
        let (n, _) = timeout(WAIT, client.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..n], b"ack:ping");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_drops_without_sending() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let server_port = server.local_addr().unwrap().port();

        let addr = start(server_port, HealthState::new()).await;
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(b"ping", addr).await.unwrap();

        let mut buf = [0u8; 64];
        assert!(
            timeout(Duration::from_millis(300), server.recv_from(&mut buf))
                .await
                .is_err(),
            "upstream must see no traffic"
        );
        assert!(
            timeout(Duration::from_millis(100), client.recv_from(&mut buf))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_bind_conflict_reports_label() {
        let taken = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap();

        let result = UdpForwarder::bind(
            "discovery UDP",
            addr,
            upstream(7777),
            build_discovery_packet("x").into(),
            HealthState::new(),
        )
        .await;

        match result {
            Err(RelayError::Bind { label, addr: a, .. }) => {
                assert_eq!(label, "discovery UDP");
                assert_eq!(a, addr);
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("second bind on {addr} should fail"),
        }
    }
}
