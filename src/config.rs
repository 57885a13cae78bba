//! Configuration loading and constants.
//!
//! The library itself only needs the listening port, which comes from the `port`
//! environment variable (default 3000). The binary additionally accepts an
//! optional TOML file for host, port and logging format. `AppConfig` is the root
//! configuration struct.

use const_format::formatcp;
use serde::Deserialize;
use std::path::Path;

// =============================================================================
// Health Endpoint
// =============================================================================

/// Path answered by both the standalone server and the middleware
pub const HEALTH_PATH: &str = "/health";

/// Name used in the startup log line
pub const PRODUCT_NAME: &str = "Health check drop-in";

// =============================================================================
// Listener Defaults
// =============================================================================

/// Environment variable holding the standalone server port
pub const PORT_ENV_VAR: &str = "port";

/// Port used when `port` is unset or not numeric
pub const DEFAULT_PORT: u16 = 3000;

/// Listen on all interfaces by default
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Upper bound on connection draining after a shutdown request
pub const SHUTDOWN_GRACE_SECS: u64 = 10;

// =============================================================================
// Logging Defaults
// =============================================================================

const CRATE_TARGET: &str = "health_dropin";

/// Default log filter when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = formatcp!("{}=info", CRATE_TARGET);

/// Default log format (text or json)
pub const DEFAULT_LOG_FORMAT: &str = "text";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP listener configuration
    #[serde(default)]
    pub http: HttpServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "HttpServerConfig::default_host")]
    pub host: String,
    #[serde(default = "HttpServerConfig::default_port")]
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

impl HttpServerConfig {
    fn default_host() -> String {
        DEFAULT_HOST.to_string()
    }

    fn default_port() -> u16 {
        DEFAULT_PORT
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "text" (human-readable, default) or "json" (structured)
    #[serde(default = "LoggingConfig::default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_LOG_FORMAT.to_string(),
        }
    }
}

impl LoggingConfig {
    fn default_format() -> String {
        DEFAULT_LOG_FORMAT.to_string()
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

/// Resolve the listening port from the raw value of the `port` variable.
///
/// Anything that is not a valid `u16` falls back to [`DEFAULT_PORT`].
pub fn resolve_port(raw: Option<&str>) -> u16 {
    match raw.map(str::trim) {
        None | Some("") => DEFAULT_PORT,
        Some(value) => value.parse().unwrap_or_else(|_| {
            tracing::warn!(
                value = %value,
                default = DEFAULT_PORT,
                "Ignoring non-numeric {} environment variable", PORT_ENV_VAR
            );
            DEFAULT_PORT
        }),
    }
}

/// Read and resolve the `port` environment variable.
pub fn port_from_env() -> u16 {
    resolve_port(std::env::var(PORT_ENV_VAR).ok().as_deref())
}

impl AppConfig {
    /// Defaults with the `port` environment variable applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.http.port = port_from_env();
        config
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, then let a set `port` environment variable override it.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        if std::env::var_os(PORT_ENV_VAR).is_some() {
            config.http.port = port_from_env();
        }
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.http.host.trim().is_empty() {
            return Err(ConfigError::Validation(
                "http.host must not be empty".to_string(),
            ));
        }
        if !matches!(self.logging.format.to_ascii_lowercase().as_str(), "text" | "json") {
            return Err(ConfigError::Validation(format!(
                "logging.format must be \"text\" or \"json\", got \"{}\"",
                self.logging.format
            )));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_resolve_port_defaults_when_unset() {
        assert_eq!(resolve_port(None), 3000);
    }

    #[test]
    fn test_resolve_port_numeric() {
        assert_eq!(resolve_port(Some("8080")), 8080);
        assert_eq!(resolve_port(Some(" 9090 ")), 9090);
    }

    #[test]
    fn test_resolve_port_falls_back_on_garbage() {
        assert_eq!(resolve_port(Some("")), DEFAULT_PORT);
        assert_eq!(resolve_port(Some("http")), DEFAULT_PORT);
        assert_eq!(resolve_port(Some("70000")), DEFAULT_PORT);
        assert_eq!(resolve_port(Some("-1")), DEFAULT_PORT);
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.http.host, "0.0.0.0");
        assert_eq!(config.http.port, 3000);
        assert!(!config.logging.is_json());
    }

    #[test]
    fn test_default_log_filter() {
        assert_eq!(DEFAULT_LOG_FILTER, "health_dropin=info");
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"
[http]
host = "127.0.0.1"
port = 8081

[logging]
format = "json"
"#,
        );
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.http.host, "127.0.0.1");
        assert_eq!(config.http.port, 8081);
        assert!(config.logging.is_json());
    }

    #[test]
    fn test_load_empty_config_uses_defaults() {
        let file = write_config("");
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.http.port, DEFAULT_PORT);
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn test_load_rejects_unknown_log_format() {
        let file = write_config("[logging]\nformat = \"xml\"\n");
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let file = write_config("[http\nport = ");
        let err = AppConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load("/nonexistent/health-dropin.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
