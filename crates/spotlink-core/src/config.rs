//! Spotlink Configuration Management
//!
//! Handles configuration from environment variables, config files,
//! and command-line arguments with sensible defaults for development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Entity linker endpoint
    pub linker: LinkerConfig,

    /// Retry policy around the linker call
    pub retry: RetryConfig,

    /// Annotation behaviour toggles
    pub annotation: AnnotationConfig,

    /// HTTP service configuration
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env()?;
        Ok(self)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        // Linker
        if let Ok(url) = std::env::var("SPOTLIGHT_URL") {
            self.linker.endpoint = url;
        }
        if let Some(confidence) = env_parse("SPOTLIGHT_CONFIDENCE")? {
            self.linker.confidence = confidence;
        }
        if let Some(timeout) = env_parse("LINKER_TIMEOUT_SECS")? {
            self.linker.timeout_secs = timeout;
        }

        // Retry
        if let Some(attempts) = env_parse("LINKER_MAX_ATTEMPTS")? {
            self.retry.max_attempts = attempts;
        }
        if let Some(ms) = env_parse("LINKER_INITIAL_BACKOFF_MS")? {
            self.retry.initial_backoff_ms = ms;
        }
        if let Some(ms) = env_parse("LINKER_MAX_BACKOFF_MS")? {
            self.retry.max_backoff_ms = ms;
        }

        // Annotation
        if let Some(flag) = env_flag("SEMI_TRUECASE")? {
            self.annotation.semi_truecase = flag;
        }
        if let Some(flag) = env_flag("EXTRACT_RELATIONS")? {
            self.annotation.extract_relations = flag;
        }

        // Server
        if let Ok(host) = std::env::var("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_parse("API_PORT")? {
            self.server.port = port;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(flag) = env_flag("LOG_JSON")? {
            self.logging.json_format = flag;
        }

        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

fn env_flag(key: &str) -> Result<Option<bool>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => parse_flag(&value)
            .map(Some)
            .ok_or_else(|| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// DBpedia Spotlight endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkerConfig {
    /// Base URL of the Spotlight REST service (without `/annotate`)
    pub endpoint: String,

    /// Disambiguation confidence threshold passed to Spotlight
    pub confidence: f32,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.dbpedia-spotlight.org/en".to_string(),
            confidence: 0.5,
            timeout_secs: 30,
        }
    }
}

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Delay before the second attempt
    pub initial_backoff_ms: u64,

    /// Upper bound for any single delay
    pub max_backoff_ms: u64,

    /// Growth factor between consecutive delays
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 200,
            max_backoff_ms: 5_000,
            multiplier: 2.0,
        }
    }
}

/// Annotation behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    /// Lowercase the text except upstream entities before linking, and
    /// require every linked entity to match an upstream entity span
    pub semi_truecase: bool,

    /// Derive relations from an upstream dependency layer
    pub extract_relations: bool,

    /// Identifier written into every view this app produces
    pub app_identifier: String,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            semi_truecase: false,
            extract_relations: false,
            app_identifier: "https://apps.clams.ai/dbpedia_spotlight".to_string(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.retry.max_attempts, 5);
        assert!(!config.annotation.semi_truecase);
        assert!(config.linker.endpoint.starts_with("https://"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [annotation]
            semi_truecase = true

            [retry]
            max_attempts = 2
            "#,
        )
        .unwrap();

        assert!(config.annotation.semi_truecase);
        assert!(!config.annotation.extract_relations);
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.initial_backoff_ms, 200);
        assert_eq!(config.linker.confidence, 0.5);
    }

    #[test]
    fn test_from_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = \"not a number\"").unwrap();

        let err = AppConfig::from_file(file.path()).unwrap_err();
        match err {
            ConfigError::ParseError { path, .. } => assert_eq!(path, file.path()),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_file_reads_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[linker]\nendpoint = \"http://localhost:2222/rest\"\n\n[server]\nport = 8080"
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.linker.endpoint, "http://localhost:2222/rest");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
