//! The two halves of an upstream health check

use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;

use crate::config::UpstreamConfig;
use crate::constants::buffer::STATUS_RESPONSE;
use crate::network;
use crate::protocol::{STATUS_REQUEST, ServerInfo, StatusParseError, parse_status_response};

/// Why a probe step failed
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connect failed: {0}")]
    Connect(#[source] io::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("status request failed: {0}")]
    Io(#[source] io::Error),

    #[error(transparent)]
    Parse(#[from] StatusParseError),
}

/// Open and immediately close a TCP connection to the upstream
pub async fn check_tcp_reachable(
    upstream: &UpstreamConfig,
    limit: Duration,
) -> Result<(), ProbeError> {
    match timeout(limit, TcpStream::connect(upstream.target())).await {
        Ok(Ok(_stream)) => Ok(()),
        Ok(Err(e)) => Err(ProbeError::Connect(e)),
        Err(_) => Err(ProbeError::Timeout(limit)),
    }
}

/// Send one status request from a fresh socket and parse the first reply
///
/// `limit` bounds the wait for the reply.
pub async fn query_status(
    upstream: &UpstreamConfig,
    limit: Duration,
) -> Result<ServerInfo, ProbeError> {
    let (host, port) = upstream.target();
    let target = network::resolve(host, port).await.map_err(ProbeError::Io)?;

    let socket = UdpSocket::bind(network::unspecified_for(&target))
        .await
        .map_err(ProbeError::Io)?;
    socket
        .send_to(&STATUS_REQUEST, target)
        .await
        .map_err(ProbeError::Io)?;

    let mut buf = [0u8; STATUS_RESPONSE];
    let (n, _) = timeout(limit, socket.recv_from(&mut buf))
        .await
        .map_err(|_| ProbeError::Timeout(limit))?
        .map_err(ProbeError::Io)?;

    Ok(parse_status_response(&buf[..n])?)
}
