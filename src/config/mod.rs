//! Configuration module
//!
//! Configuration types, defaults, loading and validation for the relay.

mod defaults;
mod loading;
mod types;
mod validation;

pub use loading::{
    ConfigOverrides, ConfigSource, create_default_config, load_config, load_config_with_fallback,
    parse_config,
};
pub use types::{
    AdvertiseConfig, Config, HealthCheckConfig, ListenConfig, TcpConfig, UpstreamConfig,
};

pub use defaults::{
    broadcast_interval, health_check_interval, health_check_timeout, tcp_idle_timeout,
};
