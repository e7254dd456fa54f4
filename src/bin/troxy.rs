use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use troxy::args::Args;
use troxy::config::create_default_config;
use troxy::runtime::{RuntimeConfig, load_and_log_config, shutdown_signal};
use troxy::{Config, Relay};

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(path) = &args.write_config {
        let sample = toml::to_string_pretty(&create_default_config())
            .context("Failed to serialize sample configuration")?;
        std::fs::write(path, sample)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote sample configuration to {}", path.display());
        return Ok(());
    }

    let _log_guard = troxy::logging::init_logging(args.log_file.as_deref());

    let (config, _source) = load_and_log_config(&args.config, &args.overrides())?;

    let rt = RuntimeConfig::from_args(args.threads).build_runtime()?;
    rt.block_on(run_relay(config))
}

async fn run_relay(config: Config) -> Result<()> {
    let relay = Relay::new(config);
    info!("Announcing to {}", relay.broadcast_target());

    let handles = relay.start().await;

    shutdown_signal().await;
    info!("Shutdown signal received, stopping relay");
    handles.abort_all();

    Ok(())
}
