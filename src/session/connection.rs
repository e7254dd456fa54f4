//! Bidirectional byte relay between a client and the upstream
//!
//! Handles copying in both directions, the idle deadline, and logging of
//! how each relayed connection ended.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use crate::constants::buffer::TCP_CHUNK;
use crate::constants::timeout::FAR_FUTURE;
use crate::formatting::{format_bytes, format_duration};

/// Why a relayed connection ended
#[derive(Debug)]
pub enum ForwardOutcome {
    /// Client sent EOF
    ClientClosed,
    /// Upstream sent EOF
    UpstreamClosed,
    /// No bytes moved in either direction for the idle timeout
    IdleTimeout,
    /// Reading from or writing to the client failed
    ClientError(io::Error),
    /// Reading from or writing to the upstream failed
    UpstreamError(io::Error),
}

/// Outcome plus byte totals for one relayed connection
#[derive(Debug)]
pub struct ForwardResult {
    pub outcome: ForwardOutcome,
    pub client_to_upstream: u64,
    pub upstream_to_client: u64,
}

/// Copy bytes both ways until one side closes, fails or goes idle
///
/// Both directions are pumped concurrently inside the calling task, so a
/// peer that stops reading cannot stall traffic the other way. Each chunk
/// read from one side is written in full before the next read on that side,
/// which preserves byte order per direction. Any transfer pushes the idle
/// deadline to `now + idle_timeout`.
///
/// The streams are left open; the caller drops them to close both ends.
pub async fn bidirectional_forward<C, U>(
    client: &mut C,
    upstream: &mut U,
    idle_timeout: Duration,
) -> ForwardResult
where
    C: AsyncRead + AsyncWrite + Unpin,
    U: AsyncRead + AsyncWrite + Unpin,
{
    let (mut client_read, mut client_write) = tokio::io::split(client);
    let (mut upstream_read, mut upstream_write) = tokio::io::split(upstream);

    let activity = Activity::new();
    let c2u = AtomicU64::new(0);
    let u2c = AtomicU64::new(0);

    let outcome = tokio::select! {
        result = pump(&mut client_read, &mut upstream_write, &c2u, &activity) => match result {
            Ok(()) => ForwardOutcome::ClientClosed,
            Err(PumpError::Read(e)) => ForwardOutcome::ClientError(e),
            Err(PumpError::Write(e)) => ForwardOutcome::UpstreamError(e),
        },
        result = pump(&mut upstream_read, &mut client_write, &u2c, &activity) => match result {
            Ok(()) => ForwardOutcome::UpstreamClosed,
            Err(PumpError::Read(e)) => ForwardOutcome::UpstreamError(e),
            Err(PumpError::Write(e)) => ForwardOutcome::ClientError(e),
        },
        () = activity.idle_for(idle_timeout) => ForwardOutcome::IdleTimeout,
    };

    ForwardResult {
        outcome,
        client_to_upstream: c2u.load(Ordering::Relaxed),
        upstream_to_client: u2c.load(Ordering::Relaxed),
    }
}

enum PumpError {
    Read(io::Error),
    Write(io::Error),
}

/// Copy one direction until EOF or an error
async fn pump<R, W>(
    reader: &mut R,
    writer: &mut W,
    bytes: &AtomicU64,
    activity: &Activity,
) -> Result<(), PumpError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; TCP_CHUNK];
    loop {
        let n = reader.read(&mut buf).await.map_err(PumpError::Read)?;
        if n == 0 {
            return Ok(());
        }
        writer.write_all(&buf[..n]).await.map_err(PumpError::Write)?;
        bytes.fetch_add(n as u64, Ordering::Relaxed);
        activity.touch();
    }
}

/// Last-transfer clock shared by both pumps, in milliseconds since start
struct Activity {
    start: Instant,
    last_ms: AtomicU64,
}

impl Activity {
    fn new() -> Self {
        Self {
            start: Instant::now(),
            last_ms: AtomicU64::new(0),
        }
    }

    fn touch(&self) {
        let ms = u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.last_ms.store(ms, Ordering::Relaxed);
    }

    fn deadline(&self, idle_timeout: Duration) -> Instant {
        let last = Duration::from_millis(self.last_ms.load(Ordering::Relaxed));
        self.start
            .checked_add(last.saturating_add(idle_timeout))
            .unwrap_or_else(|| self.start + FAR_FUTURE)
    }

    /// Resolves once no transfer has happened for `idle_timeout`
    async fn idle_for(&self, idle_timeout: Duration) {
        loop {
            let deadline = self.deadline(idle_timeout);
            time::sleep_until(deadline).await;
            if Instant::now() >= self.deadline(idle_timeout) {
                return;
            }
        }
    }
}

/// Log how a relayed connection ended
///
/// Clean closes and idle timeouts are routine; I/O errors other than a
/// reset peer are worth a warning.
pub fn log_session_end(client_addr: SocketAddr, result: &ForwardResult, elapsed: Duration) {
    let totals = format!(
        "↑{} ↓{} in {}",
        format_bytes(result.client_to_upstream),
        format_bytes(result.upstream_to_client),
        format_duration(elapsed)
    );

    match &result.outcome {
        ForwardOutcome::ClientClosed => {
            info!("Client {} disconnected | {}", client_addr, totals);
        }
        ForwardOutcome::UpstreamClosed => {
            info!("Upstream closed connection for {} | {}", client_addr, totals);
        }
        ForwardOutcome::IdleTimeout => {
            info!("Client {} idle, closing | {}", client_addr, totals);
        }
        ForwardOutcome::ClientError(e) | ForwardOutcome::UpstreamError(e)
            if is_peer_reset(e) =>
        {
            debug!("Connection for {} reset: {} | {}", client_addr, e, totals);
        }
        ForwardOutcome::ClientError(e) => {
            warn!("Error relaying from client {}: {} | {}", client_addr, e, totals);
        }
        ForwardOutcome::UpstreamError(e) => {
            warn!("Error relaying from upstream for {}: {} | {}", client_addr, e, totals);
        }
    }
}

fn is_peer_reset(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof
    )
}
