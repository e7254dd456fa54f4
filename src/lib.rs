//! # troxy
//!
//! Makes a remote Terraria server appear in the LAN server list.
//!
//! The relay answers discovery requests locally, announces itself on the
//! local broadcast address, and forwards gameplay traffic (UDP and TCP) to
//! the configured upstream while a background task keeps track of whether
//! that upstream is reachable.
//!
//! ## Module Organization
//!
//! - **protocol**: Discovery packet encoding and status response parsing
//! - **health**: Upstream probing and the shared health state
//! - **relay**: UDP forwarders, broadcast announcer, TCP relay, orchestration
//! - **session**: Per-connection bidirectional TCP copy
//! - **config**: TOML configuration, defaults, overrides and validation
//! - **types**: Validated newtypes (ports, host and display names)
//! - **network**: Socket setup and broadcast address detection

pub mod args;
pub mod config;
pub mod connection_error;
pub mod constants;
pub mod formatting;
pub mod health;
pub mod logging;
pub mod network;
pub mod protocol;
pub mod relay;
pub mod runtime;
pub mod session;
pub mod types;

pub use config::{Config, ConfigOverrides, ConfigSource, load_config, load_config_with_fallback};
pub use connection_error::RelayError;
pub use health::{HealthMonitor, HealthState, ServerStatus};
pub use relay::{Relay, RelayHandles};
