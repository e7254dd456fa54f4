//! Per-connection session handling for relayed TCP gameplay traffic

mod connection;

pub use connection::{ForwardOutcome, ForwardResult, bidirectional_forward, log_session_end};
