//! TCP gameplay relay
//!
//! Accepts client connections and pairs each one with a fresh upstream
//! connection for as long as both sides keep talking.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{self, Instant, timeout};
use tracing::{debug, info, warn};

use crate::config::UpstreamConfig;
use crate::connection_error::RelayError;
use crate::constants::timeout::{ACCEPT_BACKOFF, UPSTREAM_CONNECT};
use crate::health::HealthState;
use crate::network;
use crate::session::{bidirectional_forward, log_session_end};

/// Accepts gameplay connections and relays them to the upstream
pub struct TcpRelay {
    listener: TcpListener,
    upstream: Arc<UpstreamConfig>,
    health: HealthState,
    idle_timeout: Duration,
}

impl TcpRelay {
    /// Bind the gameplay listener with `SO_REUSEADDR`
    ///
    /// # Errors
    /// [`RelayError::Bind`] if the address is unavailable.
    pub fn bind(
        listen_addr: SocketAddr,
        upstream: UpstreamConfig,
        health: HealthState,
        idle_timeout: Duration,
    ) -> Result<Self, RelayError> {
        let listener =
            network::bind_tcp_listener(listen_addr).map_err(|source| RelayError::Bind {
                label: "game TCP",
                addr: listen_addr,
                source,
            })?;

        Ok(Self {
            listener,
            upstream: Arc::new(upstream),
            health,
            idle_timeout,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever, one task per client
    pub async fn run(self) {
        if let Ok(addr) = self.listener.local_addr() {
            info!("TCP relay listening on {} -> {}", addr, self.upstream);
        }

        loop {
            match self.listener.accept().await {
                Ok((client, addr)) => {
                    let upstream = Arc::clone(&self.upstream);
                    let health = self.health.clone();
                    let idle_timeout = self.idle_timeout;
                    tokio::spawn(async move {
                        handle_client(client, addr, &upstream, &health, idle_timeout).await;
                    });
                }
                Err(e) => {
                    warn!("Failed to accept TCP connection: {}", e);
                    time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}

/// Relay one client until either side closes or the connection goes idle
///
/// Both sockets are dropped on return, closing them.
async fn handle_client(
    mut client: TcpStream,
    addr: SocketAddr,
    upstream: &UpstreamConfig,
    health: &HealthState,
    idle_timeout: Duration,
) {
    if !health.is_reachable() {
        debug!("Upstream unreachable, closing client {}", addr);
        return;
    }

    let mut upstream_stream = match connect_upstream(upstream).await {
        Ok(stream) => stream,
        Err(e) => {
            e.log(&format!("Closing client {addr}"));
            return;
        }
    };

    network::set_low_latency(&client);
    network::set_low_latency(&upstream_stream);
    info!("Client {} connected, relaying to {}", addr, upstream);

    let started = Instant::now();
    let result = bidirectional_forward(&mut client, &mut upstream_stream, idle_timeout).await;
    log_session_end(addr, &result, started.elapsed());
}

/// Open the upstream half of a relayed connection
///
/// # Errors
/// [`RelayError::UpstreamConnect`] or [`RelayError::UpstreamTimeout`].
pub async fn connect_upstream(upstream: &UpstreamConfig) -> Result<TcpStream, RelayError> {
    let (host, port) = upstream.target();
    match timeout(UPSTREAM_CONNECT, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(source)) => Err(RelayError::UpstreamConnect {
            host: host.to_string(),
            port,
            source,
        }),
        Err(_) => Err(RelayError::UpstreamTimeout {
            host: host.to_string(),
            port,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::ServerStatus;
    use crate::protocol::ServerInfo;
    use crate::types::{HostName, Port};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn upstream(port: u16) -> UpstreamConfig {
        UpstreamConfig {
            host: HostName::new("127.0.0.1".to_string()).unwrap(),
            port: Port::new(port).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_connect_upstream_refused() {
        let port = {
            let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
            l.local_addr().unwrap().port()
        };
        let err = connect_upstream(&upstream(port)).await.unwrap_err();
        assert!(matches!(err, RelayError::UpstreamConnect { port: p, .. } if p == port));
        assert_eq!(err.log_level(), tracing::Level::WARN);
    }

    #[tokio::test]
    async fn test_unreachable_state_closes_client() {
        let relay = TcpRelay::bind(
            "127.0.0.1:0".parse().unwrap(),
            upstream(9),
            HealthState::new(),
            Duration::from_secs(5),
        )
        .unwrap();
        let addr = relay.local_addr().unwrap();
        tokio::spawn(relay.run());

        let mut client = TcpStream::connect(addr).await.unwrap();
        let mut buf = [0u8; 8];
        let n = time::timeout(Duration::from_secs(2), client.read(&mut buf))
            .await
            .unwrap()
            .unwrap_or(0);
        assert_eq!(n, 0);
    }

    #[tokio::test]
    async fn test_relays_to_upstream() {
        let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server_port = server.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut conn, _) = server.accept().await.unwrap();
            let mut buf = [0u8; 4];
            conn.read_exact(&mut buf).await.unwrap();
            conn.write_all(&buf).await.unwrap();
        });

        let health = HealthState::new();
        health.replace(ServerStatus::online(ServerInfo::default()));
        let relay = TcpRelay::bind(
            "127.0.0.1:0".parse().unwrap(),
            upstream(server_port),
            health,
            Duration::from_secs(5),
        )
        .unwrap();
        let addr = relay.local_addr().unwrap();
        tokio::spawn(relay.run());

        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(b"game").await.unwrap();
        let mut buf = [0u8; 4];
        time::timeout(Duration::from_secs(2), client.read_exact(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf, b"game");
    }
}
