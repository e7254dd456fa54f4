//! Tokio runtime configuration and startup helpers for the binary
//!
//! Provides:
//! - Testable runtime configuration and builder logic
//! - Configuration loading with a startup summary
//! - Shutdown signal handling

use anyhow::Result;
use tracing::{info, warn};

use crate::config::{Config, ConfigOverrides, ConfigSource, load_config_with_fallback};

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    worker_threads: usize,
}

impl RuntimeConfig {
    /// Create runtime config from an optional thread count
    ///
    /// `None` means 1 thread. `Some(0)` means one per available CPU.
    /// A single thread selects the current-thread runtime.
    #[must_use]
    pub fn from_args(threads: Option<usize>) -> Self {
        let worker_threads = match threads {
            None => 1,
            Some(0) => available_cpus(),
            Some(n) => n,
        };
        Self { worker_threads }
    }

    #[must_use]
    pub const fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    #[must_use]
    pub const fn is_single_threaded(&self) -> bool {
        self.worker_threads == 1
    }

    /// Build the tokio runtime
    ///
    /// # Errors
    /// Returns error if runtime creation fails
    pub fn build_runtime(self) -> Result<tokio::runtime::Runtime> {
        let rt = if self.is_single_threaded() {
            info!("Starting relay with single-threaded runtime");
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?
        } else {
            info!(
                "Starting relay with {} worker threads (detected {} CPUs)",
                self.worker_threads,
                available_cpus()
            );
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(self.worker_threads)
                .enable_all()
                .build()?
        };
        Ok(rt)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from_args(None)
    }
}

fn available_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1)
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM on Unix)
///
/// A handler that cannot be installed is logged and never fires; the other
/// one still works.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

/// Load configuration and log a summary of it
///
/// # Errors
/// Returns error if configuration loading fails
pub fn load_and_log_config(
    config_path: &str,
    overrides: &ConfigOverrides,
) -> Result<(Config, ConfigSource)> {
    let (config, source) = load_config_with_fallback(config_path, overrides)?;

    info!("Loaded configuration from {}", source.description());
    info!("  Upstream: {}", config.upstream);
    info!("  Advertised name: {}", config.advertise.name);
    info!(
        "  Listening on {} (discovery UDP {}, game UDP+TCP {})",
        config.listen.host, config.listen.discovery_port, config.listen.game_port
    );

    Ok((config, source))
}
