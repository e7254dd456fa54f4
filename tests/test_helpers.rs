//! Test helpers for integration tests
//!
//! A mock upstream game server (TCP echo plus a UDP status responder on the
//! same port) and small utilities for loopback sockets.

#![allow(dead_code)]

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use troxy::config::{Config, UpstreamConfig};
use troxy::health::{HealthState, ServerStatus};
use troxy::protocol::{STATUS_REQUEST, ServerInfo};
use troxy::types::{HostName, Port};

/// Upper bound for any single wait in a test
pub const WAIT: Duration = Duration::from_secs(3);

/// Prefix the mock upstream adds to echoed gameplay datagrams
pub const UDP_ECHO_PREFIX: &[u8] = b"echo:";

/// A fake game server listening on loopback
pub struct MockUpstream {
    pub port: u16,
    /// Non-status datagrams received over UDP
    pub udp_received: Arc<AtomicUsize>,
    /// TCP connections accepted
    pub tcp_accepted: Arc<AtomicUsize>,
    handles: Vec<JoinHandle<()>>,
}

impl MockUpstream {
    pub fn upstream_config(&self) -> UpstreamConfig {
        UpstreamConfig {
            host: loopback_host(),
            port: Port::new(self.port).unwrap(),
        }
    }

    pub fn udp_count(&self) -> usize {
        self.udp_received.load(Ordering::SeqCst)
    }

    pub fn tcp_count(&self) -> usize {
        self.tcp_accepted.load(Ordering::SeqCst)
    }

    /// Stop serving; later probes see a closed port
    pub fn shutdown(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub fn loopback_host() -> HostName {
    HostName::new("127.0.0.1".to_string()).unwrap()
}

/// TCP listener and UDP socket bound to the same loopback port
pub async fn bind_tcp_udp_pair() -> (TcpListener, UdpSocket) {
    loop {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        if let Ok(udp) = UdpSocket::bind((Ipv4Addr::LOCALHOST, port)).await {
            return (listener, udp);
        }
    }
}

/// A port that was free for both TCP and UDP a moment ago
pub async fn unused_port() -> u16 {
    let (listener, _udp) = bind_tcp_udp_pair().await;
    listener.local_addr().unwrap().port()
}

/// Spawn a mock upstream reporting `name` with the given player counts
///
/// TCP connections are echoed. UDP status requests get a status response;
/// any other datagram is echoed back with [`UDP_ECHO_PREFIX`].
pub async fn spawn_mock_upstream(name: &str, players: u32, max_players: u32) -> MockUpstream {
    let (listener, udp) = bind_tcp_udp_pair().await;
    let port = listener.local_addr().unwrap().port();
    let udp_received = Arc::new(AtomicUsize::new(0));
    let tcp_accepted = Arc::new(AtomicUsize::new(0));

    let accepted = Arc::clone(&tcp_accepted);
    let tcp = tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            accepted.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                loop {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            if stream.write_all(&buf[..n]).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            });
        }
    });

    let status = format!(
        r#"{{"name":"{name}","playercount":{players},"maxplayers":{max_players}}}"#
    );
    let mut status_reply = vec![0x00, 0x00, 0x03];
    status_reply.extend_from_slice(status.as_bytes());

    let received = Arc::clone(&udp_received);
    let udp_task = tokio::spawn(async move {
        let mut buf = vec![0u8; 65_536];
        loop {
            let Ok((n, from)) = udp.recv_from(&mut buf).await else {
                continue;
            };
            if buf[..n] == STATUS_REQUEST {
                let _ = udp.send_to(&status_reply, from).await;
            } else {
                received.fetch_add(1, Ordering::SeqCst);
                let mut reply = UDP_ECHO_PREFIX.to_vec();
                reply.extend_from_slice(&buf[..n]);
                let _ = udp.send_to(&reply, from).await;
            }
        }
    });

    MockUpstream {
        port,
        udp_received,
        tcp_accepted,
        handles: vec![tcp, udp_task],
    }
}

/// Health state already marked reachable
pub fn online_state() -> HealthState {
    let state = HealthState::new();
    state.replace(ServerStatus::online(ServerInfo::default()));
    state
}

/// Relay config on loopback with short timers
pub fn test_config(upstream_port: u16, discovery_port: u16, game_port: u16) -> Config {
    let mut config = Config::for_upstream(loopback_host());
    config.upstream.port = Port::new(upstream_port).unwrap();
    config.listen.host = Ipv4Addr::LOCALHOST.into();
    config.listen.discovery_port = Port::new(discovery_port).unwrap();
    config.listen.game_port = Port::new(game_port).unwrap();
    config.advertise.broadcast_ip = Some(Ipv4Addr::LOCALHOST);
    config.advertise.interval = Duration::from_secs(1);
    config.health_check.interval = Duration::from_secs(1);
    config.health_check.timeout = Duration::from_millis(500);
    config.tcp.idle_timeout = Duration::from_secs(2);
    config
}

/// Receive one datagram, or `None` if nothing arrives within `limit`
pub async fn recv_within(
    socket: &UdpSocket,
    buf: &mut [u8],
    limit: Duration,
) -> Option<(usize, SocketAddr)> {
    timeout(limit, socket.recv_from(buf)).await.ok()?.ok()
}
