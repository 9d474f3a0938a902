use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LOG_ROOT: &str = "/logs";
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8006";
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_BURST_SIZE: usize = 4;
/// Upper bound on `generator.burst_size`; one burst is written in a single append.
pub const MAX_BURST_SIZE: usize = 1000;
pub const DEFAULT_COMPONENT: &str = "demo-app";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

impl Config {
    /// Path of the file the generator writes and the forwarder tails.
    pub fn app_log_path(&self) -> PathBuf {
        self.paths
            .app_log
            .clone()
            .unwrap_or_else(|| self.paths.log_root.join("app").join("app.log"))
    }

    /// Path of the file ingested records are appended to.
    pub fn received_log_path(&self) -> PathBuf {
        self.paths
            .received_log
            .clone()
            .unwrap_or_else(|| self.paths.log_root.join("received").join("ingest.log"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_log_root")]
    pub log_root: PathBuf,
    #[serde(default)]
    pub app_log: Option<PathBuf>,
    #[serde(default)]
    pub received_log: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_root: default_log_root(),
            app_log: None,
            received_log: None,
        }
    }
}

fn default_log_root() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_ROOT)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_heartbeat_enabled")]
    pub heartbeat_enabled: bool,
    #[serde(default = "default_heartbeat_interval", with = "humantime_serde")]
    pub heartbeat_interval: Duration,
    #[serde(default = "default_burst_size")]
    pub burst_size: usize,
    #[serde(default = "default_component")]
    pub component: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            heartbeat_enabled: default_heartbeat_enabled(),
            heartbeat_interval: default_heartbeat_interval(),
            burst_size: default_burst_size(),
            component: default_component(),
        }
    }
}

fn default_heartbeat_enabled() -> bool {
    true
}

fn default_heartbeat_interval() -> Duration {
    DEFAULT_HEARTBEAT_INTERVAL
}

fn default_burst_size() -> usize {
    DEFAULT_BURST_SIZE
}

fn default_component() -> String {
    DEFAULT_COMPONENT.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_setup() {
        let config = Config::default();
        assert_eq!(config.web.listen, "0.0.0.0:8006");
        assert_eq!(config.generator.burst_size, 4);
        assert_eq!(config.generator.heartbeat_interval, Duration::from_secs(5));
        assert_eq!(config.app_log_path(), PathBuf::from("/logs/app/app.log"));
        assert_eq!(
            config.received_log_path(),
            PathBuf::from("/logs/received/ingest.log")
        );
    }

    #[test]
    fn test_explicit_paths_override_log_root() {
        let mut config = Config::default();
        config.paths.log_root = PathBuf::from("/var/demo");
        assert_eq!(config.app_log_path(), PathBuf::from("/var/demo/app/app.log"));

        config.paths.app_log = Some(PathBuf::from("/tmp/a.log"));
        assert_eq!(config.app_log_path(), PathBuf::from("/tmp/a.log"));
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = "generator:\n  heartbeat_interval: 250ms\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            config.generator.heartbeat_interval,
            Duration::from_millis(250)
        );
        assert_eq!(config.generator.burst_size, 4);
        assert!(config.generator.heartbeat_enabled);
        assert_eq!(config.ingest.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    }
}
