//! Configuration module for couchsink.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::domain::DatabaseName;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for couchsink.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    /// Routing table: topic name -> database name.
    pub topics: BTreeMap<String, String>,
    pub merging: MergingConfig,
    pub converter: ConverterConfig,
    pub logging: LoggingConfig,
}

/// Document store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base address of the store, e.g. `http://localhost:5984`.
    pub url: String,
    /// User name for basic authentication.
    pub username: Option<String>,
    /// Password for basic authentication.
    pub password: Option<String>,
    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

/// Conflict merging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergingConfig {
    /// Merge strategy: `incoming_wins` or `field_union`.
    pub strategy: String,
    /// How many times the conflict fetch phase is retried after the first attempt.
    pub max_conflicting_docs_fetch_retries: u32,
    /// Base delay (ms) of the exponential backoff between fetch retries. 0 disables it.
    pub fetch_retry_backoff_ms: u64,
    /// Upper bound (ms) on a single backoff delay.
    pub fetch_retry_backoff_max_ms: u64,
}

/// Record conversion settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Use a string record key as `_id` when the payload has none.
    pub id_from_key: bool,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Emit JSON log lines instead of human-readable output.
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/couchsink/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("couchsink")
            .join("config.yaml")
    }
}

impl StoreConfig {
    /// Value of the `Authorization` header sent with every request.
    ///
    /// `None` when no credentials are configured.
    pub fn basic_auth(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => {
                let encoded = STANDARD.encode(format!("{user}:{pass}"));
                Some(format!("Basic {encoded}"))
            }
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5984".to_string(),
            username: None,
            password: None,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl Default for MergingConfig {
    fn default() -> Self {
        Self {
            strategy: "field_union".to_string(),
            max_conflicting_docs_fetch_retries: 5,
            fetch_retry_backoff_ms: 50,
            fetch_retry_backoff_max_ms: 5_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"store.url"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `merging.strategy`.
pub const VALID_MERGE_STRATEGIES: &[&str] = &["incoming_wins", "field_union"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- store ---
        if !(self.store.url.starts_with("http://") || self.store.url.starts_with("https://")) {
            errors.push(ValidationError {
                field: "store.url".into(),
                message: format!("must be an http(s) URL, got '{}'", self.store.url),
            });
        }
        if self.store.username.is_some() != self.store.password.is_some() {
            errors.push(ValidationError {
                field: "store.password".into(),
                message: "username and password must be set together".into(),
            });
        }
        if self.store.request_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "store.request_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.store.connect_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "store.connect_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- topics ---
        if self.topics.is_empty() {
            errors.push(ValidationError {
                field: "topics".into(),
                message: "at least one topic to database mapping is required".into(),
            });
        }
        for (topic, database) in &self.topics {
            if topic.is_empty() {
                errors.push(ValidationError {
                    field: "topics".into(),
                    message: "topic names must not be empty".into(),
                });
            }
            if let Err(e) = DatabaseName::new(database.clone()) {
                errors.push(ValidationError {
                    field: format!("topics.{topic}"),
                    message: e.to_string(),
                });
            }
        }

        // --- merging ---
        if !VALID_MERGE_STRATEGIES.contains(&self.merging.strategy.as_str()) {
            errors.push(ValidationError {
                field: "merging.strategy".into(),
                message: format!(
                    "invalid strategy '{}'; valid options: {}",
                    self.merging.strategy,
                    VALID_MERGE_STRATEGIES.join(", ")
                ),
            });
        }
        if self.merging.fetch_retry_backoff_max_ms < self.merging.fetch_retry_backoff_ms {
            errors.push(ValidationError {
                field: "merging.fetch_retry_backoff_max_ms".into(),
                message: format!(
                    "must be at least fetch_retry_backoff_ms ({})",
                    self.merging.fetch_retry_backoff_ms
                ),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust
/// use couchsink_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .store_url("http://couch.internal:5984")
///     .store_credentials("admin", "secret")
///     .topic("orders", "orders")
///     .merging_strategy("incoming_wins")
///     .build_validated()
///     .expect("valid configuration");
/// assert_eq!(config.topics.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- store ---

    pub fn store_url(mut self, url: impl Into<String>) -> Self {
        self.config.store.url = url.into();
        self
    }

    pub fn store_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.config.store.username = Some(username.into());
        self.config.store.password = Some(password.into());
        self
    }

    pub fn store_request_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.store.request_timeout_secs = seconds;
        self
    }

    pub fn store_connect_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.store.connect_timeout_secs = seconds;
        self
    }

    // --- topics ---

    pub fn topic(mut self, topic: impl Into<String>, database: impl Into<String>) -> Self {
        self.config.topics.insert(topic.into(), database.into());
        self
    }

    // --- merging ---

    pub fn merging_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.config.merging.strategy = strategy.into();
        self
    }

    pub fn max_conflicting_docs_fetch_retries(mut self, retries: u32) -> Self {
        self.config.merging.max_conflicting_docs_fetch_retries = retries;
        self
    }

    pub fn fetch_retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.merging.fetch_retry_backoff_ms = ms;
        self
    }

    pub fn fetch_retry_backoff_max_ms(mut self, ms: u64) -> Self {
        self.config.merging.fetch_retry_backoff_max_ms = ms;
        self
    }

    // --- converter ---

    pub fn converter_id_from_key(mut self, enabled: bool) -> Self {
        self.config.converter.id_from_key = enabled;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_json(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
