//! Logger configuration, validation and fallback to defaults

use crate::{level::LogLevel, Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Upper bound for `server.retry_attempts`
pub const MAX_RETRY_ATTEMPTS: u32 = 5;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/logs";
pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 30_000;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 1_000;
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 1_000;
pub const DEFAULT_SAMPLING_RATE: f64 = 1.0;

/// Main logger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Minimum severity processed at all
    pub level: LogLevel,

    /// Global kill switch
    pub enabled: bool,

    /// Deployment classification stamped on every entry
    pub environment: Environment,

    /// Active sinks
    pub destinations: BTreeSet<Destination>,

    pub console: ConsoleConfig,

    pub server: ServerConfig,

    pub filters: FilterConfig,

    pub performance: PerformanceConfig,

    pub privacy: PrivacyConfig,
}

/// Console sink configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enabled: bool,

    /// ANSI colors, honoured only when stdout is a terminal
    pub colors: bool,

    /// Prefix each line with the entry timestamp
    pub timestamps: bool,

    /// Console-specific minimum level, applied after the global one
    pub level: LogLevel,
}

/// Remote collector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    /// Collector URL receiving `{"logs": [...]}`
    pub endpoint: String,

    /// Buffer capacity that triggers a flush
    pub batch_size: usize,

    /// Interval that triggers a flush (in milliseconds)
    pub flush_interval_ms: u64,

    /// Retry budget handed to the HTTP layer, capped at [`MAX_RETRY_ATTEMPTS`]
    pub retry_attempts: u32,

    /// Request timeout (in milliseconds)
    pub timeout_ms: u64,

    /// Extra request headers
    pub headers: BTreeMap<String, String>,
}

/// Entry filters applied before an entry is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Messages longer than this are truncated with an ellipsis
    pub max_message_length: usize,

    /// If non-empty, only entries tagged with one of these pass
    pub include_tags: Vec<String>,

    pub exclude_tags: Vec<String>,

    /// If non-empty, only messages matching one of these regexes pass
    pub include_patterns: Vec<String>,

    pub exclude_patterns: Vec<String>,
}

/// Performance settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Record pipeline counters through the `metrics` facade
    pub enable_metrics: bool,

    /// Capacity of the in-memory history kept for analysis and export
    pub max_buffer_size: usize,

    pub enable_sampling: bool,

    /// Probability (0.0 to 1.0) that a sampled entry is kept
    pub sampling_rate: f64,
}

/// Privacy and redaction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacyConfig {
    /// Master switch: mask sensitive fields before any sink sees an entry
    pub mask_sensitive_data: bool,

    /// Context keys whose values are masked (case-insensitive, whole words of the key)
    pub sensitive_fields: Vec<String>,

    /// Regexes whose matches are replaced with the redaction marker
    pub mask_patterns: Vec<String>,

    /// Apply `mask_patterns` to context strings and messages
    pub enable_redaction: bool,
}

/// Deployment environment classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
    Test,
}

impl Environment {
    pub fn is_development(self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
            Environment::Test => "test",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" => Some(Environment::Development),
            "staging" => Some(Environment::Staging),
            "production" | "prod" => Some(Environment::Production),
            "test" => Some(Environment::Test),
            _ => None,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output sinks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Console,
    Server,
}

/// An invalid value that was replaced by its default while loading or normalizing
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    /// Dotted path of the offending key, e.g. `server.batch_size`
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            enabled: true,
            environment: Environment::Development,
            destinations: [Destination::Console, Destination::Server]
                .into_iter()
                .collect(),
            console: ConsoleConfig::default(),
            server: ServerConfig::default(),
            filters: FilterConfig::default(),
            performance: PerformanceConfig::default(),
            privacy: PrivacyConfig::default(),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            colors: true,
            timestamps: true,
            level: LogLevel::Debug,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            headers: BTreeMap::new(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
            include_tags: Vec::new(),
            exclude_tags: Vec::new(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            enable_metrics: true,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            enable_sampling: false,
            sampling_rate: DEFAULT_SAMPLING_RATE,
        }
    }
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        Self {
            mask_sensitive_data: true,
            sensitive_fields: vec![
                "password".to_string(),
                "token".to_string(),
                "secret".to_string(),
                "apiKey".to_string(),
                "creditCard".to_string(),
                "ssn".to_string(),
            ],
            mask_patterns: vec![
                // Email addresses
                r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}".to_string(),
                // Card-like 16 digit sequences
                r"\b\d{4}[\s\-]?\d{4}[\s\-]?\d{4}[\s\-]?\d{4}\b".to_string(),
                // Social security numbers
                r"\b\d{3}-\d{2}-\d{4}\b".to_string(),
            ],
            enable_redaction: true,
        }
    }
}

impl ServerConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl LoggerConfig {
    /// Console output is active
    pub fn console_active(&self) -> bool {
        self.destinations.contains(&Destination::Console) && self.console.enabled
    }

    /// Server delivery (and therefore buffering) is active
    pub fn server_active(&self) -> bool {
        self.destinations.contains(&Destination::Server) && self.server.enabled
    }

    /// Load configuration from file or create default, then apply env overrides.
    /// Values that do not fit their field keep the default and are logged.
    pub async fn load(config_path: Option<&Path>) -> Result<Self> {
        let (config, issues) = Self::load_with_issues(config_path).await?;
        for issue in &issues {
            tracing::warn!(
                telemetry.event = "config_value_replaced",
                field = %issue.field,
                issue = %issue.message,
                "Invalid configuration value replaced by default"
            );
        }
        Ok(config)
    }

    /// Like [`LoggerConfig::load`], returning the replaced values to the caller
    pub async fn load_with_issues(config_path: Option<&Path>) -> Result<(Self, Vec<ConfigIssue>)> {
        let config_file = match config_path {
            Some(path) => path.to_path_buf(),
            None => Self::default_config_path()?,
        };

        let (mut config, issues) = if config_file.exists() {
            let content = tokio::fs::read_to_string(&config_file).await?;
            Self::from_toml_lenient(&content)?
        } else {
            (Self::default(), Vec::new())
        };

        config.load_env_overrides();
        Ok((config, issues))
    }

    /// Parse a TOML document key by key on top of the defaults.
    ///
    /// Only a syntax error fails. A value of the wrong type, or an unknown
    /// enum variant, keeps the default for that key and yields a
    /// [`ConfigIssue`]; every other key in the file still applies.
    pub fn from_toml_lenient(content: &str) -> Result<(Self, Vec<ConfigIssue>)> {
        let file: toml::Table = content.parse().map_err(|e| Error::Config {
            message: format!("Failed to parse logger config: {}", e),
        })?;

        let mut merged = match toml::Value::try_from(Self::default()) {
            Ok(toml::Value::Table(table)) => table,
            Ok(_) => {
                return Err(Error::Config {
                    message: "Default logger config is not a table".to_string(),
                })
            }
            Err(e) => {
                return Err(Error::Config {
                    message: format!("Failed to serialize logger config: {}", e),
                })
            }
        };

        let mut leaves = Vec::new();
        collect_leaves(&merged, file, &mut Vec::new(), &mut leaves);

        let mut issues = Vec::new();
        for (path, value) in leaves {
            let previous = replace_at(&mut merged, &path, Some(value));
            if let Err(e) = toml::Value::Table(merged.clone()).try_into::<Self>() {
                replace_at(&mut merged, &path, previous);
                issues.push(ConfigIssue {
                    field: path.join("."),
                    message: e.message().to_string(),
                });
            }
        }

        let config = toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| Error::Config {
                message: format!("Failed to parse logger config: {}", e),
            })?;
        Ok((config, issues))
    }

    /// Save configuration to file
    pub async fn save(&self, config_path: Option<&Path>) -> Result<()> {
        let config_file = match config_path {
            Some(path) => path.to_path_buf(),
            None => Self::default_config_path()?,
        };

        if let Some(parent) = config_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| Error::Config {
            message: format!("Failed to serialize logger config: {}", e),
        })?;

        tokio::fs::write(&config_file, content).await?;
        Ok(())
    }

    /// Load environment variable overrides
    pub fn load_env_overrides(&mut self) {
        if let Ok(enabled) = std::env::var("LANTERN_ENABLED") {
            self.enabled = enabled.parse().unwrap_or(self.enabled);
        }

        if let Ok(level) = std::env::var("LANTERN_LOG_LEVEL") {
            match level.parse() {
                Ok(level) => self.level = level,
                Err(e) => tracing::warn!(
                    telemetry.event = "config_env_ignored",
                    variable = "LANTERN_LOG_LEVEL",
                    error = %e,
                    "Ignoring invalid environment override"
                ),
            }
        }

        if let Ok(env) = std::env::var("LANTERN_ENV") {
            if let Some(env) = Environment::parse(&env) {
                self.environment = env;
            }
        }

        if let Ok(endpoint) = std::env::var("LANTERN_SERVER_ENDPOINT") {
            self.server.endpoint = endpoint;
        }

        if let Ok(rate) = std::env::var("LANTERN_SAMPLING_RATE") {
            if let Ok(rate) = rate.parse::<f64>() {
                self.performance.enable_sampling = true;
                self.performance.sampling_rate = rate;
            }
        }

        if let Ok(enabled) = std::env::var("LANTERN_REDACTION") {
            self.privacy.enable_redaction =
                enabled.parse().unwrap_or(self.privacy.enable_redaction);
        }
    }

    /// Get default configuration file path
    pub fn default_config_path() -> Result<PathBuf> {
        let project_dirs =
            ProjectDirs::from("com", "lantern", "lantern").ok_or_else(|| Error::Config {
                message: "Could not determine config directory".to_string(),
            })?;

        Ok(project_dirs.config_dir().join("logger.toml"))
    }

    /// Strict validation: the first invalid value is an error
    pub fn validate(&self) -> Result<()> {
        match self.collect_issues().into_iter().next() {
            Some(issue) => Err(Error::Config {
                message: issue.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Replace every invalid value with its documented default
    pub fn normalized(mut self) -> (Self, Vec<ConfigIssue>) {
        let issues = self.collect_issues();
        if issues.is_empty() {
            return (self, issues);
        }

        let server = &mut self.server;
        if server.endpoint.trim().is_empty() {
            server.endpoint = DEFAULT_ENDPOINT.to_string();
        }
        if server.batch_size == 0 {
            server.batch_size = DEFAULT_BATCH_SIZE;
        }
        if server.flush_interval_ms == 0 {
            server.flush_interval_ms = DEFAULT_FLUSH_INTERVAL_MS;
        }
        server.retry_attempts = server.retry_attempts.min(MAX_RETRY_ATTEMPTS);
        if server.timeout_ms == 0 {
            server.timeout_ms = DEFAULT_TIMEOUT_MS;
        }

        if self.filters.max_message_length == 0 {
            self.filters.max_message_length = DEFAULT_MAX_MESSAGE_LENGTH;
        }
        self.filters.include_patterns.retain(|p| regex::Regex::new(p).is_ok());
        self.filters.exclude_patterns.retain(|p| regex::Regex::new(p).is_ok());
        self.privacy.mask_patterns.retain(|p| regex::Regex::new(p).is_ok());

        let perf = &mut self.performance;
        if perf.max_buffer_size == 0 {
            perf.max_buffer_size = DEFAULT_MAX_BUFFER_SIZE;
        }
        if !(0.0..=1.0).contains(&perf.sampling_rate) {
            perf.sampling_rate = DEFAULT_SAMPLING_RATE;
        }

        (self, issues)
    }

    fn collect_issues(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let mut issue = |field: &str, message: String| {
            issues.push(ConfigIssue {
                field: field.to_string(),
                message,
            });
        };

        if self.server.endpoint.trim().is_empty() {
            issue("server.endpoint", "must not be empty".to_string());
        }
        if self.server.batch_size == 0 {
            issue("server.batch_size", "must be greater than 0".to_string());
        }
        if self.server.flush_interval_ms == 0 {
            issue(
                "server.flush_interval_ms",
                "must be greater than 0".to_string(),
            );
        }
        if self.server.retry_attempts > MAX_RETRY_ATTEMPTS {
            issue(
                "server.retry_attempts",
                format!("must be at most {}", MAX_RETRY_ATTEMPTS),
            );
        }
        if self.server.timeout_ms == 0 {
            issue("server.timeout_ms", "must be greater than 0".to_string());
        }
        if self.filters.max_message_length == 0 {
            issue(
                "filters.max_message_length",
                "must be greater than 0".to_string(),
            );
        }
        if self.performance.max_buffer_size == 0 {
            issue(
                "performance.max_buffer_size",
                "must be greater than 0".to_string(),
            );
        }
        if !(0.0..=1.0).contains(&self.performance.sampling_rate) {
            issue(
                "performance.sampling_rate",
                format!(
                    "{} is outside 0.0..=1.0",
                    self.performance.sampling_rate
                ),
            );
        }

        let patterns = [
            ("filters.include_patterns", &self.filters.include_patterns),
            ("filters.exclude_patterns", &self.filters.exclude_patterns),
            ("privacy.mask_patterns", &self.privacy.mask_patterns),
        ];
        for (field, list) in patterns {
            for pattern in list {
                if let Err(e) = regex::Regex::new(pattern) {
                    issue(field, format!("invalid pattern '{}': {}", pattern, e));
                }
            }
        }

        issues
    }
}

/// Split a parsed file into its leaf values. A key recurses only where both
/// the file and the defaults hold a table.
fn collect_leaves(
    defaults: &toml::Table,
    file: toml::Table,
    path: &mut Vec<String>,
    leaves: &mut Vec<(Vec<String>, toml::Value)>,
) {
    for (key, value) in file {
        path.push(key.clone());
        match (defaults.get(&key), value) {
            (Some(toml::Value::Table(nested)), toml::Value::Table(table)) => {
                collect_leaves(nested, table, path, leaves)
            }
            (_, value) => leaves.push((path.clone(), value)),
        }
        path.pop();
    }
}

/// Set (or with `None`, remove) the value at `path`, returning what was there
fn replace_at(
    table: &mut toml::Table,
    path: &[String],
    value: Option<toml::Value>,
) -> Option<toml::Value> {
    let (last, parents) = path.split_last()?;
    let mut current = table;
    for key in parents {
        current = current.get_mut(key)?.as_table_mut()?;
    }
    match value {
        Some(value) => current.insert(last.clone(), value),
        None => current.remove(last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_serialization() {
        let config = LoggerConfig::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: LoggerConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: LoggerConfig = toml::from_str(
            r#"
            level = "warn"
            destinations = ["console"]

            [server]
            batch_size = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.level, LogLevel::Warn);
        assert!(!config.server_active());
        assert_eq!(config.server.batch_size, 5);
        assert_eq!(config.server.flush_interval_ms, DEFAULT_FLUSH_INTERVAL_MS);
        assert!(config.privacy.mask_sensitive_data);
    }

    #[tokio::test]
    #[serial]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("logger.toml");

        let mut original = LoggerConfig::default();
        original.environment = Environment::Staging;
        original
            .server
            .headers
            .insert("x-app".to_string(), "games".to_string());
        original.save(Some(&config_path)).await.unwrap();

        let loaded = LoggerConfig::load(Some(&config_path)).await.unwrap();
        assert_eq!(original, loaded);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var("LANTERN_LOG_LEVEL", "ERROR");
        std::env::set_var("LANTERN_ENV", "production");
        std::env::set_var("LANTERN_SAMPLING_RATE", "0.25");

        let mut config = LoggerConfig::default();
        config.load_env_overrides();

        assert_eq!(config.level, LogLevel::Error);
        assert_eq!(config.environment, Environment::Production);
        assert!(config.performance.enable_sampling);
        assert_eq!(config.performance.sampling_rate, 0.25);

        std::env::remove_var("LANTERN_LOG_LEVEL");
        std::env::remove_var("LANTERN_ENV");
        std::env::remove_var("LANTERN_SAMPLING_RATE");
    }

    #[test]
    #[serial]
    fn test_invalid_env_level_keeps_current_value() {
        std::env::set_var("LANTERN_LOG_LEVEL", "verbose");

        let mut config = LoggerConfig::default();
        config.load_env_overrides();
        assert_eq!(config.level, LogLevel::Info);

        std::env::remove_var("LANTERN_LOG_LEVEL");
    }

    #[tokio::test]
    #[serial]
    async fn test_load_keeps_valid_values_around_a_bad_one() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("logger.toml");
        std::fs::write(&config_path, "level = \"verbose\"\n[server]\nbatch_size = 5\n").unwrap();

        let (config, issues) = LoggerConfig::load_with_issues(Some(&config_path))
            .await
            .unwrap();

        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.server.batch_size, 5);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "level");
        assert!(issues[0].message.contains("verbose"));

        let loaded = LoggerConfig::load(Some(&config_path)).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_lenient_parse_reports_each_bad_key() {
        let (config, issues) = LoggerConfig::from_toml_lenient(
            r#"
            environment = "qa"
            destinations = ["console"]

            [server]
            batch_size = "many"
            endpoint = "https://collector.example/logs"

            [server.headers]
            x-app = "games"
            x-build = 42

            [privacy]
            mask_sensitive_data = false
            "#,
        )
        .unwrap();

        let fields: Vec<&str> = issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["environment", "server.batch_size", "server.headers.x-build"]);

        assert_eq!(config.environment, Environment::Development);
        assert!(!config.server_active());
        assert_eq!(config.server.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.server.endpoint, "https://collector.example/logs");
        assert_eq!(config.server.headers.len(), 1);
        assert_eq!(config.server.headers["x-app"], "games");
        assert!(!config.privacy.mask_sensitive_data);
    }

    #[test]
    fn test_lenient_parse_replaces_mistyped_section() {
        let (config, issues) = LoggerConfig::from_toml_lenient("server = 5\nlevel = \"warn\"\n").unwrap();

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "server");
        assert_eq!(config.server, ServerConfig::default());
        assert_eq!(config.level, LogLevel::Warn);
    }

    #[test]
    fn test_lenient_parse_rejects_broken_syntax() {
        assert!(LoggerConfig::from_toml_lenient("level = ").is_err());
    }

    #[test]
    fn test_config_validation() {
        let mut config = LoggerConfig::default();
        assert!(config.validate().is_ok());

        config.server.batch_size = 0;
        assert!(config.validate().is_err());

        config.server.batch_size = 10;
        config.privacy.mask_patterns = vec!["[invalid".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_normalized_falls_back_to_defaults() {
        let mut config = LoggerConfig::default();
        config.server.batch_size = 0;
        config.server.retry_attempts = 50;
        config.performance.sampling_rate = 3.0;
        config.filters.max_message_length = 0;
        config.filters.exclude_patterns = vec!["ok".to_string(), "(".to_string()];

        let (normalized, issues) = config.normalized();

        assert_eq!(issues.len(), 5);
        assert_eq!(normalized.server.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(normalized.server.retry_attempts, MAX_RETRY_ATTEMPTS);
        assert_eq!(normalized.performance.sampling_rate, DEFAULT_SAMPLING_RATE);
        assert_eq!(
            normalized.filters.max_message_length,
            DEFAULT_MAX_MESSAGE_LENGTH
        );
        assert_eq!(normalized.filters.exclude_patterns, vec!["ok".to_string()]);
        assert!(normalized.validate().is_ok());
    }

    #[test]
    fn test_nan_sampling_rate_is_invalid() {
        let mut config = LoggerConfig::default();
        config.performance.sampling_rate = f64::NAN;

        let (normalized, issues) = config.normalized();
        assert_eq!(issues.len(), 1);
        assert_eq!(normalized.performance.sampling_rate, DEFAULT_SAMPLING_RATE);
    }

    #[test]
    fn test_destination_switches() {
        let mut config = LoggerConfig::default();
        assert!(config.console_active());
        assert!(config.server_active());

        config.server.enabled = false;
        assert!(!config.server_active());

        config.destinations.remove(&Destination::Console);
        assert!(!config.console_active());
    }
}
