//! Configuration loading and typed config structures for the Agent Monitor.
//!
//! Configuration comes from an optional YAML file (`agent-monitor.yaml`
//! by default, or the path in `AGENT_MONITOR_CONFIG`) layered under
//! environment variable overrides. Every field has a default, so running
//! with no file at all is the normal case.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default config file consulted when `AGENT_MONITOR_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "agent-monitor.yaml";

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "AGENT_MONITOR_CONFIG";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override held a value of the wrong type.
    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidEnv {
        /// The environment variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
        /// Why the value did not parse.
        reason: String,
    },

    /// A setting is out of its allowed range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level monitor configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MonitorConfig {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerSection,

    /// Ring buffer settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Live stream settings.
    #[serde(default)]
    pub stream: StreamConfig,

    /// Dashboard document settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MonitorConfig {
    /// Load configuration the way the binary does.
    ///
    /// Reads the file named by `AGENT_MONITOR_CONFIG`, or
    /// [`DEFAULT_CONFIG_FILE`] if that exists, then applies environment
    /// overrides and validates the result.
    pub fn load() -> Result<Self, ConfigError> {
        let lookup = |name: &str| std::env::var(name).ok();
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file at the given path.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply environment-style overrides.
    ///
    /// `lookup` maps a variable name to its value. Recognized names:
    /// `HOST`, `PORT`, `MAX_EVENTS`, `SNAPSHOT_LIMIT`,
    /// `SUBSCRIBER_QUEUE_CAPACITY`, `HEARTBEAT_INTERVAL_MS`,
    /// `DASHBOARD_PATH`, `LOG_LEVEL`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = parse_env(&lookup, "PORT")? {
            self.server.port = port;
        }
        if let Some(max) = parse_env(&lookup, "MAX_EVENTS")? {
            self.store.max_events = max;
        }
        if let Some(limit) = parse_env(&lookup, "SNAPSHOT_LIMIT")? {
            self.store.snapshot_limit = limit;
        }
        if let Some(capacity) = parse_env(&lookup, "SUBSCRIBER_QUEUE_CAPACITY")? {
            self.stream.subscriber_queue_capacity = capacity;
        }
        if let Some(interval) = parse_env(&lookup, "HEARTBEAT_INTERVAL_MS")? {
            self.stream.heartbeat_interval_ms = interval;
        }
        if let Some(path) = lookup("DASHBOARD_PATH") {
            self.dashboard.path = Some(PathBuf::from(path));
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Reject settings that would make the server unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.max_events == 0 {
            return Err(ConfigError::Invalid(String::from(
                "store.max_events must be at least 1",
            )));
        }
        if self.store.snapshot_limit == 0 {
            return Err(ConfigError::Invalid(String::from(
                "store.snapshot_limit must be at least 1",
            )));
        }
        if self.stream.subscriber_queue_capacity == 0 {
            return Err(ConfigError::Invalid(String::from(
                "stream.subscriber_queue_capacity must be at least 1",
            )));
        }
        if self.stream.heartbeat_interval_ms == 0 {
            return Err(ConfigError::Invalid(String::from(
                "stream.heartbeat_interval_ms must be at least 1",
            )));
        }
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(String::from(
                "server.max_body_bytes must be at least 1",
            )));
        }
        Ok(())
    }
}

fn parse_env<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    lookup(name)
        .map(|value| {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|e| ConfigError::InvalidEnv {
                name,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSection {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted ingest body.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Ring buffer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Capacity of the event ring buffer (`MAX_EVENTS`).
    #[serde(default = "default_max_events")]
    pub max_events: usize,

    /// Default number of events returned by the snapshot endpoint.
    #[serde(default = "default_snapshot_limit")]
    pub snapshot_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_events: default_max_events(),
            snapshot_limit: default_snapshot_limit(),
        }
    }
}

/// Live stream configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StreamConfig {
    /// Events a subscriber may have queued before it is disconnected.
    #[serde(default = "default_subscriber_queue_capacity")]
    pub subscriber_queue_capacity: usize,

    /// Idle interval after which a keep-alive comment is written.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            subscriber_queue_capacity: default_subscriber_queue_capacity(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
        }
    }
}

/// Dashboard document configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DashboardConfig {
    /// Serve this HTML file at `/` instead of the built-in page.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    7778
}

const fn default_max_body_bytes() -> usize {
    1024 * 1024
}

const fn default_max_events() -> usize {
    1000
}

const fn default_snapshot_limit() -> usize {
    200
}

const fn default_subscriber_queue_capacity() -> usize {
    200
}

const fn default_heartbeat_interval_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    String::from("info")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = MonitorConfig::default();
        assert_eq!(config.server.port, 7778);
        assert_eq!(config.store.max_events, 1000);
        assert_eq!(config.store.snapshot_limit, 200);
        assert_eq!(config.stream.subscriber_queue_capacity, 200);
        assert!(config.dashboard.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_partial_yaml_keeps_defaults() {
        let yaml = r"
server:
  port: 9000
store:
  max_events: 50
";
        let config = MonitorConfig::parse(yaml).unwrap_or_default();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.store.max_events, 50);
        assert_eq!(config.store.snapshot_limit, 200);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn empty_yaml_is_default() {
        let parsed = MonitorConfig::parse("  \n");
        assert!(matches!(parsed, Ok(config) if config == MonitorConfig::default()));
    }

    #[test]
    fn example_file_parses_to_defaults() {
        let parsed = MonitorConfig::parse(include_str!("../../../agent-monitor.example.yaml"));
        assert!(matches!(parsed, Ok(config) if config == MonitorConfig::default()));
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        let result = MonitorConfig::parse("server: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn env_overrides_win() {
        let mut config = MonitorConfig::default();
        let result = config.apply_overrides(env(&[
            ("PORT", "8123"),
            ("MAX_EVENTS", "3"),
            ("DASHBOARD_PATH", "/srv/index.html"),
            ("LOG_LEVEL", "debug"),
        ]));
        assert!(result.is_ok());
        assert_eq!(config.server.port, 8123);
        assert_eq!(config.store.max_events, 3);
        assert_eq!(config.dashboard.path, Some(PathBuf::from("/srv/index.html")));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn bad_env_value_is_reported() {
        let mut config = MonitorConfig::default();
        let result = config.apply_overrides(env(&[("PORT", "seventy")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEnv { name: "PORT", .. })
        ));
    }

    #[test]
    fn zero_capacity_is_invalid() {
        let mut config = MonitorConfig::default();
        config.store.max_events = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = MonitorConfig::default();
        config.stream.subscriber_queue_capacity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
