//! Configuration module for ZoneSync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.
//!
//! Credentials are never part of the file; hosts supply the API token when
//! constructing the remote client.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::newtypes::{SubscriptionId, ZoneName};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for ZoneSync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub zone: ZoneConfig,
    pub fetch: FetchConfig,
    pub upload: UploadConfig,
    pub identity: IdentityConfig,
    pub logging: LoggingConfig,
}

/// Deployment environment of the remote container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Path segment used in request URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

/// Remote store endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Scheme and host of the remote web service.
    pub base_url: String,
    /// Container identifier the app's data lives in.
    pub container: String,
    pub environment: Environment,
    /// Per-request timeout applied by the HTTP transport.
    pub request_timeout_secs: u64,
}

/// What the provisioner does with the subscription when zone creation fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPolicy {
    /// Only register the subscription after the zone was saved.
    #[default]
    RequireZone,
    /// Register the subscription once zone creation is acknowledged, whatever its outcome.
    Always,
}

/// Zone and subscription naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    pub zone_name: String,
    pub subscription_id: String,
    pub subscription_policy: SubscriptionPolicy,
}

impl ZoneConfig {
    /// Validated zone name.
    pub fn zone_name(&self) -> anyhow::Result<ZoneName> {
        Ok(ZoneName::new(self.zone_name.clone())?)
    }

    /// Validated subscription identifier.
    pub fn subscription_id(&self) -> anyhow::Result<SubscriptionId> {
        Ok(SubscriptionId::new(self.subscription_id.clone())?)
    }
}

/// Change feed settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum number of changes requested per page.
    pub results_limit: u32,
}

/// Record upload settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Largest batch callers should hand to a single upload.
    pub max_batch_size: usize,
}

/// Backing store for the cached remote identity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStoreKind {
    #[default]
    Keyring,
    File,
    Memory,
}

/// Identity cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub store: IdentityStoreKind,
    /// Location of the identity file when `store` is `file`.
    pub file_path: PathBuf,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
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
    /// Typically `$XDG_CONFIG_HOME/zonesync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("zonesync")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.apple-cloudkit.com".to_string(),
            container: String::new(),
            environment: Environment::Development,
            request_timeout_secs: 30,
        }
    }
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            zone_name: "SyncZone".to_string(),
            subscription_id: "SyncZoneChanges".to_string(),
            subscription_policy: SubscriptionPolicy::RequireZone,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { results_limit: 200 }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 200,
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        let file_path = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("zonesync")
            .join("identity.json");
        Self {
            store: IdentityStoreKind::Keyring,
            file_path,
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
    /// Dotted path to the offending field, e.g. `"fetch.results_limit"`.
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

/// Upper bound the remote accepts for page sizes and batch sizes.
pub const MAX_REMOTE_BATCH: u32 = 400;

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- remote ---
        match url::Url::parse(&self.remote.base_url) {
            Ok(url) if url.scheme() == "https" || url.scheme() == "http" => {}
            Ok(url) => errors.push(ValidationError {
                field: "remote.base_url".into(),
                message: format!("unsupported scheme: {}", url.scheme()),
            }),
            Err(e) => errors.push(ValidationError {
                field: "remote.base_url".into(),
                message: format!("invalid URL: {e}"),
            }),
        }
        if self.remote.container.trim().is_empty() {
            errors.push(ValidationError {
                field: "remote.container".into(),
                message: "must not be empty".into(),
            });
        }
        if self.remote.request_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "remote.request_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- zone ---
        if let Err(e) = self.zone.zone_name() {
            errors.push(ValidationError {
                field: "zone.zone_name".into(),
                message: e.to_string(),
            });
        }
        if let Err(e) = self.zone.subscription_id() {
            errors.push(ValidationError {
                field: "zone.subscription_id".into(),
                message: e.to_string(),
            });
        }

        // --- fetch / upload ---
        if !(1..=MAX_REMOTE_BATCH).contains(&self.fetch.results_limit) {
            errors.push(ValidationError {
                field: "fetch.results_limit".into(),
                message: format!("must be between 1 and {MAX_REMOTE_BATCH}"),
            });
        }
        if !(1..=MAX_REMOTE_BATCH as usize).contains(&self.upload.max_batch_size) {
            errors.push(ValidationError {
                field: "upload.max_batch_size".into(),
                message: format!("must be between 1 and {MAX_REMOTE_BATCH}"),
            });
        }

        // --- identity ---
        if self.identity.store == IdentityStoreKind::File
            && self.identity.file_path.as_os_str().is_empty()
        {
            errors.push(ValidationError {
                field: "identity.file_path".into(),
                message: "required when identity.store is `file`".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid log level '{}', expected one of: {}",
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
/// Starts from [`Config::default`] and allows overriding individual fields.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder pre-populated with default values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- remote ---

    pub fn remote_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.remote.base_url = url.into();
        self
    }

    pub fn remote_container(mut self, container: impl Into<String>) -> Self {
        self.config.remote.container = container.into();
        self
    }

    pub fn remote_environment(mut self, environment: Environment) -> Self {
        self.config.remote.environment = environment;
        self
    }

    pub fn remote_request_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.remote.request_timeout_secs = seconds;
        self
    }

    // --- zone ---

    pub fn zone_name(mut self, name: impl Into<String>) -> Self {
        self.config.zone.zone_name = name.into();
        self
    }

    pub fn zone_subscription_id(mut self, id: impl Into<String>) -> Self {
        self.config.zone.subscription_id = id.into();
        self
    }

    pub fn zone_subscription_policy(mut self, policy: SubscriptionPolicy) -> Self {
        self.config.zone.subscription_policy = policy;
        self
    }

    // --- fetch / upload ---

    pub fn fetch_results_limit(mut self, n: u32) -> Self {
        self.config.fetch.results_limit = n;
        self
    }

    pub fn upload_max_batch_size(mut self, n: usize) -> Self {
        self.config.upload.max_batch_size = n;
        self
    }

    // --- identity ---

    pub fn identity_store(mut self, store: IdentityStoreKind) -> Self {
        self.config.identity.store = store;
        self
    }

    pub fn identity_file_path(mut self, path: PathBuf) -> Self {
        self.config.identity.file_path = path;
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

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
