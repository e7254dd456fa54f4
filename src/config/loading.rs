//! Configuration loading from files and command-line overrides
//!
//! The config file is optional. Values given on the command line (or through
//! the matching `TROXY_*` environment variables, which clap folds into the
//! same arguments) are layered over whatever the file provides, so a complete
//! configuration can come from the file, the overrides, or a mix of both.

use anyhow::{Context, Result};
use std::net::Ipv4Addr;
use std::path::Path;
use toml::{Table, Value};

use super::types::Config;
use crate::types::{DisplayName, HostName, Port};

/// Values that take precedence over the config file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub host: Option<HostName>,
    pub port: Option<Port>,
    pub name: Option<DisplayName>,
    pub broadcast_ip: Option<Ipv4Addr>,
}

impl ConfigOverrides {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Write each present override into its `[section] key` slot
    fn apply_to(&self, table: &mut Table) {
        if let Some(host) = &self.host {
            set_key(table, "upstream", "host", Value::String(host.to_string()));
        }
        if let Some(port) = self.port {
            set_key(table, "upstream", "port", Value::Integer(port.get().into()));
        }
        if let Some(name) = &self.name {
            set_key(table, "advertise", "name", Value::String(name.to_string()));
        }
        if let Some(ip) = self.broadcast_ip {
            set_key(table, "advertise", "broadcast_ip", Value::String(ip.to_string()));
        }
    }
}

fn set_key(table: &mut Table, section: &str, key: &str, value: Value) {
    let entry = table
        .entry(section)
        .or_insert(Value::Table(Table::new()));
    if !entry.is_table() {
        *entry = Value::Table(Table::new());
    }
    if let Value::Table(section) = entry {
        section.insert(key.to_string(), value);
    }
}

fn has_upstream_host(table: &Table) -> bool {
    table
        .get("upstream")
        .and_then(Value::as_table)
        .is_some_and(|upstream| upstream.contains_key("host"))
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Config file, possibly with overrides layered on top
    File { path: String, overridden: bool },
    /// No config file; overrides plus defaults only
    Overrides,
}

impl ConfigSource {
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::File {
                path,
                overridden: false,
            } => format!("config file '{path}'"),
            Self::File {
                path,
                overridden: true,
            } => format!("config file '{path}' with command-line overrides"),
            Self::Overrides => "command-line arguments and defaults".to_string(),
        }
    }
}

/// Parse a config document and layer `overrides` over it
///
/// # Errors
/// Fails on malformed TOML, on a missing upstream host, or on any value
/// that does not validate.
pub fn parse_config(content: &str, overrides: &ConfigOverrides) -> Result<Config> {
    let mut table: Table = toml::from_str(content).context("Failed to parse TOML")?;
    build_config(&mut table, overrides)
}

fn build_config(table: &mut Table, overrides: &ConfigOverrides) -> Result<Config> {
    overrides.apply_to(table);

    if !has_upstream_host(table) {
        anyhow::bail!(
            "No upstream host configured: set upstream.host in the config file, \
             pass --host, or set TROXY_UPSTREAM_HOST"
        );
    }

    let config: Config = Value::Table(std::mem::take(table))
        .try_into()
        .context("Invalid configuration")?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a TOML file, then apply overrides
///
/// # Errors
/// Fails if the file cannot be read or does not form a valid configuration.
pub fn load_config(config_path: &str, overrides: &ConfigOverrides) -> Result<Config> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file '{config_path}'"))?;

    parse_config(&content, overrides)
        .with_context(|| format!("Failed to load config file '{config_path}'"))
}

/// Load the config file if it exists, otherwise build from overrides alone
///
/// A missing file is only an error when the overrides do not name an
/// upstream host.
///
/// # Errors
/// Propagates read, parse and validation failures.
pub fn load_config_with_fallback(
    config_path: &str,
    overrides: &ConfigOverrides,
) -> Result<(Config, ConfigSource)> {
    if Path::new(config_path).exists() {
        let config = load_config(config_path, overrides)?;
        return Ok((
            config,
            ConfigSource::File {
                path: config_path.to_string(),
                overridden: !overrides.is_empty(),
            },
        ));
    }

    tracing::debug!(
        "Config file '{}' not found, using command-line arguments",
        config_path
    );
    let config = build_config(&mut Table::new(), overrides).with_context(|| {
        format!("Config file '{config_path}' not found and no upstream host given")
    })?;
    Ok((config, ConfigSource::Overrides))
}

/// Sample configuration written by `troxy --write-config`
#[must_use]
pub fn create_default_config() -> Config {
    Config::for_upstream(
        HostName::new("play.example.com".to_string()).expect("sample host is non-empty"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn overrides_with_host(host: &str) -> ConfigOverrides {
        ConfigOverrides {
            host: Some(HostName::new(host.to_string()).unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_minimal() {
        let config = parse_config("[upstream]\nhost = \"a.example\"\n", &ConfigOverrides::default())
            .unwrap();
        assert_eq!(config.upstream.host.as_str(), "a.example");
    }

    #[test]
    fn test_overrides_win_over_file() {
        let content = r#"
            [upstream]
            host = "file.example"
            port = 7000

            [advertise]
            name = "From File"
            interval = 9
        "#;
        let overrides = ConfigOverrides {
            host: Some(HostName::new("cli.example".to_string()).unwrap()),
            port: Some(Port::new(7100).unwrap()),
            name: Some(DisplayName::new("From CLI".to_string()).unwrap()),
            broadcast_ip: Some(Ipv4Addr::new(10, 1, 2, 255)),
        };
        let config = parse_config(content, &overrides).unwrap();

        assert_eq!(config.upstream.host.as_str(), "cli.example");
        assert_eq!(config.upstream.port.get(), 7100);
        assert_eq!(config.advertise.name.as_str(), "From CLI");
        assert_eq!(
            config.advertise.broadcast_ip,
            Some(Ipv4Addr::new(10, 1, 2, 255))
        );
        // Untouched keys keep their file values
        assert_eq!(config.advertise.interval, Duration::from_secs(9));
    }

    #[test]
    fn test_override_supplies_missing_host() {
        let content = "[listen]\ngame_port = 7800\n";
        let config = parse_config(content, &overrides_with_host("cli.example")).unwrap();
        assert_eq!(config.upstream.host.as_str(), "cli.example");
        assert_eq!(config.listen.game_port.get(), 7800);
    }

    #[test]
    fn test_missing_host_everywhere_is_error() {
        let err = parse_config("", &ConfigOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("No upstream host"));
    }

    #[test]
    fn test_override_replaces_non_table_section() {
        let config = parse_config("upstream = 5\n", &overrides_with_host("h")).unwrap();
        assert_eq!(config.upstream.host.as_str(), "h");
    }

    #[test]
    fn test_malformed_toml_is_error() {
        assert!(parse_config("[upstream\nhost=", &overrides_with_host("h")).is_err());
    }

    #[test]
    fn test_fallback_without_file_uses_overrides() {
        let (config, source) = load_config_with_fallback(
            "/nonexistent/troxy.toml",
            &overrides_with_host("cli.example"),
        )
        .unwrap();
        assert_eq!(source, ConfigSource::Overrides);
        assert_eq!(config.upstream.host.as_str(), "cli.example");
        assert_eq!(config.advertise.name.as_str(), "TerrariaProxy");
    }

    #[test]
    fn test_fallback_without_file_or_host_is_error() {
        let result =
            load_config_with_fallback("/nonexistent/troxy.toml", &ConfigOverrides::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_source_description() {
        let source = ConfigSource::File {
            path: "troxy.toml".to_string(),
            overridden: false,
        };
        assert_eq!(source.description(), "config file 'troxy.toml'");

        let source = ConfigSource::File {
            path: "troxy.toml".to_string(),
            overridden: true,
        };
        assert!(source.description().contains("overrides"));
        assert!(ConfigSource::Overrides.description().contains("defaults"));
    }

    #[test]
    fn test_overrides_is_empty() {
        assert!(ConfigOverrides::default().is_empty());
        assert!(!overrides_with_host("h").is_empty());
    }

    #[test]
    fn test_default_config_round_trips() {
        let config = create_default_config();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = parse_config(&text, &ConfigOverrides::default()).unwrap();
        assert_eq!(parsed, config);
    }
}
