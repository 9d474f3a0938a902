use super::types::*;
use crate::config::{expand_env_vars, expand_tilde};
use regex::Regex;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("invalid value for {var}: {reason}")]
    EnvOverride { var: &'static str, reason: String },

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub const ENV_LOG_ROOT: &str = "LOG_ROOT";
pub const ENV_APP_LOG_PATH: &str = "APP_LOG_PATH";
pub const ENV_RECEIVED_LOG_PATH: &str = "RECEIVED_LOG_PATH";
pub const ENV_PORT: &str = "PORT";
pub const ENV_HEARTBEAT_INTERVAL: &str = "HEARTBEAT_INTERVAL";
pub const ENV_BURST_SIZE: &str = "BURST_SIZE";

/// Load the configuration.
///
/// With no path the built-in defaults are used. Environment overrides are
/// applied last in both cases, then the result is validated.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    expand_paths(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Parse a YAML config string, without environment overrides.
pub fn parse_config_str(yaml: &str) -> Result<Config, ConfigError> {
    let yaml = expand_env_vars(yaml);
    check_unexpanded_vars(&yaml)?;

    if yaml.trim().is_empty() {
        return Ok(Config::default());
    }

    Ok(serde_yaml::from_str(&yaml)?)
}

fn read_config_file(path: &Path) -> Result<Config, ConfigError> {
    let yaml_string = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config_str(&yaml_string).map_err(|e| match e {
        ConfigError::YamlParse(err) => ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("in file '{}': {}", path.display(), err),
        )),
        other => other,
    })
}

/// Report `$env{VAR}` references left over after expansion. Full-line YAML
/// comments are skipped.
fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    let re = Regex::new(r"\$env\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
    let mut unexpanded: Vec<&str> = yaml_string
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .flat_map(|line| re.captures_iter(line))
        .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
        .collect();

    if unexpanded.is_empty() {
        return Ok(());
    }

    unexpanded.sort_unstable();
    unexpanded.dedup();

    Err(ConfigError::Validation(format!(
        "environment variables are not set: {}",
        unexpanded.join(", ")
    )))
}

/// Apply the recognized environment overrides on top of `config`.
///
/// `lookup` returns the raw value of a variable, if set.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(root) = lookup(ENV_LOG_ROOT) {
        config.paths.log_root = PathBuf::from(root);
    }

    if let Some(path) = lookup(ENV_APP_LOG_PATH) {
        config.paths.app_log = Some(PathBuf::from(path));
    }

    if let Some(path) = lookup(ENV_RECEIVED_LOG_PATH) {
        config.paths.received_log = Some(PathBuf::from(path));
    }

    if let Some(port) = lookup(ENV_PORT) {
        let port: u16 = port.trim().parse().map_err(|_| ConfigError::EnvOverride {
            var: ENV_PORT,
            reason: format!("'{}' is not a port number", port),
        })?;
        config.web.listen = with_port(&config.web.listen, port);
    }

    if let Some(interval) = lookup(ENV_HEARTBEAT_INTERVAL) {
        config.generator.heartbeat_interval =
            parse_interval(&interval).map_err(|reason| ConfigError::EnvOverride {
                var: ENV_HEARTBEAT_INTERVAL,
                reason,
            })?;
    }

    if let Some(size) = lookup(ENV_BURST_SIZE) {
        config.generator.burst_size =
            size.trim().parse().map_err(|_| ConfigError::EnvOverride {
                var: ENV_BURST_SIZE,
                reason: format!("'{}' is not a non-negative integer", size),
            })?;
    }

    Ok(())
}

/// Replace the port of a `host:port` listen string, keeping the host.
fn with_port(listen: &str, port: u16) -> String {
    match listen.parse::<SocketAddr>() {
        Ok(mut addr) => {
            addr.set_port(port);
            addr.to_string()
        }
        Err(_) => {
            let host = listen
                .rsplit_once(':')
                .map(|(host, _)| host)
                .unwrap_or("0.0.0.0");
            format!("{}:{}", host, port)
        }
    }
}

/// Accepts humantime durations ("5s", "250ms") or bare seconds ("5", "0.5").
fn parse_interval(raw: &str) -> Result<Duration, String> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<f64>() {
        if secs.is_finite() && secs >= 0.0 {
            if let Ok(interval) = Duration::try_from_secs_f64(secs) {
                return Ok(interval);
            }
        }
        return Err(format!("'{}' is not a valid number of seconds", raw));
    }
    humantime::parse_duration(raw).map_err(|e| format!("'{}': {}", raw, e))
}

fn expand_paths(config: &mut Config) {
    config.paths.log_root = expand_tilde(&config.paths.log_root);
    if let Some(path) = config.paths.app_log.as_mut() {
        *path = expand_tilde(path);
    }
    if let Some(path) = config.paths.received_log.as_mut() {
        *path = expand_tilde(path);
    }
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.web.listen.parse::<SocketAddr>().is_err() {
        errors.push(format!(
            "web.listen: '{}' is not a valid socket address",
            config.web.listen
        ));
    }

    if config.generator.heartbeat_interval.is_zero() {
        errors.push("generator.heartbeat_interval must be greater than zero".to_string());
    }

    if config.generator.burst_size == 0 {
        errors.push("generator.burst_size must be at least 1".to_string());
    } else if config.generator.burst_size > MAX_BURST_SIZE {
        errors.push(format!(
            "generator.burst_size must be at most {} (got {})",
            MAX_BURST_SIZE, config.generator.burst_size
        ));
    }

    if config.ingest.max_body_bytes == 0 {
        errors.push("ingest.max_body_bytes must be greater than zero".to_string());
    }

    if config.app_log_path() == config.received_log_path() {
        errors.push(format!(
            "app log and received log must be different files (both are '{}')",
            config.app_log_path().display()
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}
