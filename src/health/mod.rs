//! Upstream health monitoring
//!
//! A single [`HealthMonitor`] task probes the upstream on a fixed interval
//! and publishes the result through [`HealthState`], which every relay task
//! reads before forwarding.

mod probe;
mod types;

pub use probe::{ProbeError, check_tcp_reachable, query_status};
pub use types::{HealthState, Reachability, ServerStatus};

use crate::config::{HealthCheckConfig, UpstreamConfig};
use crate::constants::timeout::FAR_FUTURE;
use crate::protocol::ServerInfo;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Periodically probes the upstream server
pub struct HealthMonitor {
    upstream: UpstreamConfig,
    config: HealthCheckConfig,
    state: HealthState,
}

impl HealthMonitor {
    /// Create a monitor that publishes into `state`
    pub fn new(upstream: UpstreamConfig, config: HealthCheckConfig, state: HealthState) -> Self {
        Self {
            upstream,
            config,
            state,
        }
    }

    /// Handle to the state this monitor writes
    #[must_use]
    pub fn state(&self) -> &HealthState {
        &self.state
    }

    /// Run one check cycle, publish and log the result
    ///
    /// A refused or timed-out TCP connect marks the upstream offline and
    /// skips the status query. Once the connect succeeds the upstream is
    /// online even if the status query then fails; only the name and player
    /// counts fall back to their defaults.
    pub async fn check_now(&self) -> ServerStatus {
        let status = self.probe().await;
        self.state.replace(status.clone());
        info!("{}", status);
        status
    }

    async fn probe(&self) -> ServerStatus {
        if let Err(e) = check_tcp_reachable(&self.upstream, self.config.timeout).await {
            debug!("Upstream {} unreachable: {}", self.upstream, e);
            return ServerStatus::offline();
        }

        match query_status(&self.upstream, self.config.timeout).await {
            Ok(info) => ServerStatus::online(info),
            Err(e) => {
                debug!("Status query to {} failed: {}", self.upstream, e);
                ServerStatus::online(ServerInfo::default())
            }
        }
    }

    /// Start the periodic check task
    ///
    /// The first scheduled cycle runs one interval from now; callers run
    /// [`check_now`](Self::check_now) first so the state is populated
    /// before any other task reads it.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let period = self.config.interval;
            let now = Instant::now();
            let first = now.checked_add(period).unwrap_or(now + FAR_FUTURE);
            let mut interval = time::interval_at(first, period);
            // A slow probe pushes the schedule back instead of bunching cycles
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;
                self.check_now().await;
            }
        })
    }
}
