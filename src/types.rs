//! Validated types shared by configuration and the relay tasks

pub mod config;
pub mod validated;

pub use config::{Port, duration_serde};
pub use validated::{DisplayName, HostName, ValidationError};
