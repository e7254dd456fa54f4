//! Error types for the relay's sockets and upstream connections

use std::io;
use std::net::SocketAddr;
use thiserror::Error;
use tracing::Level;

/// Errors raised by the relay tasks
///
/// None of these stop the process. A bind error disables one listener; the
/// rest end a single exchange, connection or announcer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RelayError {
    /// A listening socket could not be bound
    #[error("Failed to bind {label} on {addr}: {source}")]
    Bind {
        label: &'static str,
        addr: SocketAddr,
        source: io::Error,
    },

    /// TCP connection to the upstream failed
    #[error("Failed to connect to upstream {host}:{port}: {source}")]
    UpstreamConnect {
        host: String,
        port: u16,
        source: io::Error,
    },

    /// TCP connection to the upstream did not complete in time
    #[error("Timed out connecting to upstream {host}:{port}")]
    UpstreamTimeout { host: String, port: u16 },

    /// Sending a discovery broadcast failed
    #[error("Failed to send broadcast to {target}: {source}")]
    Broadcast { target: SocketAddr, source: io::Error },

    /// I/O error while relaying
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl RelayError {
    /// Check if this is a peer hanging up mid-transfer
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            Self::Io(e) if matches!(
                e.kind(),
                io::ErrorKind::BrokenPipe
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
            )
        )
    }

    /// Get the appropriate log level for this error
    #[must_use]
    pub fn log_level(&self) -> Level {
        match self {
            // A listener is now disabled for the process lifetime
            Self::Bind { .. } | Self::Broadcast { .. } => Level::ERROR,
            Self::UpstreamConnect { .. } | Self::UpstreamTimeout { .. } => Level::WARN,
            _ if self.is_disconnect() => Level::DEBUG,
            Self::Io(_) => Level::WARN,
        }
    }

    /// Log at [`log_level`](Self::log_level), prefixed with `context`
    pub fn log(&self, context: &str) {
        match self.log_level() {
            Level::ERROR => tracing::error!("{}: {}", context, self),
            Level::WARN => tracing::warn!("{}: {}", context, self),
            _ => tracing::debug!("{}: {}", context, self),
        }
    }
}
