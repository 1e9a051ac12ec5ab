//! Configuration management for rEMS-Monitor
//!
//! Handles loading and validating configuration from YAML files.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::admin::TlsOptions;
use crate::collector::{Category, CategorySpec, CollectorSettings, FilterConfig, FilterMode};
use crate::crypto::{self, CryptoError};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error reading the configuration file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Error parsing the configuration file
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// Broker credentials could not be resolved
    #[error("Credential error: {0}")]
    Credential(#[from] CryptoError),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root of every metric path
    #[serde(default = "default_metric_prefix")]
    pub metric_prefix: String,

    /// Seconds between collection cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Upper bound on one category query, in milliseconds
    #[serde(default = "default_category_timeout_ms")]
    pub category_timeout_ms: u64,

    /// Put producer/consumer ids into metric paths
    #[serde(default)]
    pub display_dynamic_ids_in_metric_path: bool,

    /// Name inclusion rule
    #[serde(default)]
    pub filter_mode: FilterMode,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Brokers to collect from
    #[serde(default)]
    pub brokers: Vec<BrokerConfig>,

    /// What to collect per category
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Metrics endpoint path
    #[serde(default = "default_metrics_path")]
    pub path: String,

    /// Server bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

/// Admin connection protocol
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tcp,
    Ssl,
}

impl Protocol {
    /// URL scheme of the admin gateway for this protocol
    pub fn scheme(&self) -> &'static str {
        match self {
            Protocol::Tcp => "http",
            Protocol::Ssl => "https",
        }
    }
}

/// One broker to collect from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Name inserted into metric paths after the global prefix
    #[serde(default)]
    pub display_name: Option<String>,

    /// Explicit admin URL; overrides host/port/protocol
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_broker_port")]
    pub port: u16,

    #[serde(default)]
    pub protocol: Protocol,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default)]
    pub encrypted_password: Option<String>,

    #[serde(default)]
    pub encryption_key: Option<String>,

    /// PEM bundle of trusted CA certificates
    #[serde(default)]
    pub ssl_trusted_certs: Option<PathBuf>,

    /// PEM client certificate and key
    #[serde(default)]
    pub ssl_identity_file: Option<PathBuf>,

    /// Password of an encrypted key in `ssl_identity_file`
    #[serde(default)]
    pub ssl_identity_password: Option<String>,

    #[serde(default)]
    pub ssl_identity_encrypted_password: Option<String>,

    #[serde(default = "default_true")]
    pub ssl_verify_host: bool,

    /// Admin request timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub include_queues: Vec<String>,
    #[serde(default)]
    pub include_topics: Vec<String>,
    #[serde(default)]
    pub include_durables: Vec<String>,
    #[serde(default)]
    pub include_routes: Vec<String>,
    /// Falls back to the queue and topic patterns when unset
    #[serde(default)]
    pub include_producers: Option<Vec<String>>,
    /// Falls back to the queue and topic patterns when unset
    #[serde(default)]
    pub include_consumers: Option<Vec<String>>,

    /// Exclude lists, consulted in `legacy` filter mode when the include list is empty
    #[serde(default)]
    pub exclude_queues: Vec<String>,
    #[serde(default)]
    pub exclude_topics: Vec<String>,
    #[serde(default)]
    pub exclude_durables: Vec<String>,
    #[serde(default)]
    pub exclude_routes: Vec<String>,
}

/// Metrics document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Report temporary destinations
    #[serde(default)]
    pub show_temp: bool,

    /// Report system destinations
    #[serde(default)]
    pub show_system: bool,

    #[serde(default)]
    pub categories: Vec<CategorySpec>,
}

// Default value functions
fn default_metric_prefix() -> String {
    "Custom Metrics|Tibco EMS".to_string()
}

fn default_interval_secs() -> u64 {
    60
}

fn default_category_timeout_ms() -> u64 {
    30_000
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_broker_port() -> u16 {
    7222
}

fn default_timeout() -> u64 {
    5000
}

fn default_port() -> u16 {
    9595
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metric_prefix: default_metric_prefix(),
            interval_secs: default_interval_secs(),
            category_timeout_ms: default_category_timeout_ms(),
            display_dynamic_ids_in_metric_path: false,
            filter_mode: FilterMode::default(),
            server: ServerConfig::default(),
            brokers: Vec::new(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            path: default_metrics_path(),
            bind_address: default_bind_address(),
        }
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            display_name: None,
            url: None,
            host: default_host(),
            port: default_broker_port(),
            protocol: Protocol::default(),
            user: None,
            password: None,
            encrypted_password: None,
            encryption_key: None,
            ssl_trusted_certs: None,
            ssl_identity_file: None,
            ssl_identity_password: None,
            ssl_identity_encrypted_password: None,
            ssl_verify_host: true,
            timeout_ms: default_timeout(),
            include_queues: Vec::new(),
            include_topics: Vec::new(),
            include_durables: Vec::new(),
            include_routes: Vec::new(),
            include_producers: None,
            include_consumers: None,
            exclude_queues: Vec::new(),
            exclude_topics: Vec::new(),
            exclude_durables: Vec::new(),
            exclude_routes: Vec::new(),
        }
    }
}

impl BrokerConfig {
    /// Display name, treating an empty string as unset
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref().filter(|n| !n.is_empty())
    }

    /// Label used in logs and self-metrics
    pub fn label(&self) -> String {
        match self.display_name() {
            Some(name) => name.to_string(),
            None => format!("{}:{}", self.host, self.port),
        }
    }

    /// Admin gateway base URL
    pub fn admin_url(&self) -> String {
        match self.url.as_deref().filter(|u| !u.is_empty()) {
            Some(url) => url.to_string(),
            None => format!("{}://{}:{}", self.protocol.scheme(), self.host, self.port),
        }
    }

    /// Effective admin password
    ///
    /// # Errors
    /// Fails when an encrypted password is configured without a key or
    /// cannot be decrypted
    pub fn resolve_password(&self) -> Result<String, ConfigError> {
        Ok(crypto::resolve_password(
            "password",
            self.password.as_deref(),
            self.encrypted_password.as_deref(),
            self.encryption_key.as_deref(),
        )?)
    }

    /// TLS settings with the identity password resolved
    ///
    /// # Errors
    /// Same conditions as [`BrokerConfig::resolve_password`]
    pub fn tls_options(&self) -> Result<TlsOptions, ConfigError> {
        let identity_password = crypto::resolve_password(
            "ssl_identity_password",
            self.ssl_identity_password.as_deref(),
            self.ssl_identity_encrypted_password.as_deref(),
            self.encryption_key.as_deref(),
        )?;

        Ok(TlsOptions {
            trusted_certs: self.ssl_trusted_certs.clone(),
            identity_file: self.ssl_identity_file.clone(),
            identity_password: Some(identity_password).filter(|p| !p.is_empty()),
            verify_host: self.ssl_verify_host,
        })
    }

    /// Name filters for every filtered category
    pub fn category_filters(
        &self,
        show_system: bool,
        show_temp: bool,
        mode: FilterMode,
    ) -> HashMap<Category, FilterConfig> {
        let destinations: Vec<String> = self
            .include_queues
            .iter()
            .chain(self.include_topics.iter())
            .cloned()
            .collect();
        let destination_excludes: Vec<String> = self
            .exclude_queues
            .iter()
            .chain(self.exclude_topics.iter())
            .cloned()
            .collect();

        let build = |include: &[String], exclude: &[String]| {
            FilterConfig::from_patterns(include, exclude, show_system, show_temp, mode)
        };

        let mut filters = HashMap::new();
        filters.insert(
            Category::Queue,
            build(&self.include_queues, &self.exclude_queues),
        );
        filters.insert(
            Category::Topic,
            build(&self.include_topics, &self.exclude_topics),
        );
        filters.insert(
            Category::Durable,
            build(&self.include_durables, &self.exclude_durables),
        );
        filters.insert(
            Category::Route,
            build(&self.include_routes, &self.exclude_routes),
        );
        filters.insert(
            Category::Producer,
            build(
                self.include_producers.as_deref().unwrap_or(&destinations),
                &destination_excludes,
            ),
        );
        filters.insert(
            Category::Consumer,
            build(
                self.include_consumers.as_deref().unwrap_or(&destinations),
                &destination_excludes,
            ),
        );
        filters
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    ///
    /// # Note
    /// - If the file doesn't exist, returns `ConfigError::ReadError`
    /// - Use `Config::load_or_default()` if you want fallback to defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file, falling back to defaults if not found
    ///
    /// Use this for optional configuration files (e.g., when running without explicit config)
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        Self::load(path)
    }

    /// Coordinator settings derived from this configuration
    pub fn collector_settings(&self) -> CollectorSettings {
        CollectorSettings {
            display_dynamic_ids_in_metric_path: self.display_dynamic_ids_in_metric_path,
            category_timeout: Duration::from_millis(self.category_timeout_ms),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        if !self.server.path.starts_with('/') {
            return Err(ConfigError::ValidationError(
                "Metrics path must start with '/'".to_string(),
            ));
        }

        if matches!(self.server.path.as_str(), "/" | "/health" | "/metrics.json") {
            return Err(ConfigError::ValidationError(format!(
                "Metrics path '{}' conflicts with a built-in endpoint",
                self.server.path
            )));
        }

        if self.interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "interval_secs must be greater than 0".to_string(),
            ));
        }

        if self.category_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "category_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.brokers.len() > 1 {
            let mut seen = HashSet::new();
            for broker in &self.brokers {
                let Some(name) = broker.display_name() else {
                    return Err(ConfigError::ValidationError(
                        "display_name is required when more than one broker is configured"
                            .to_string(),
                    ));
                };
                if !seen.insert(name) {
                    return Err(ConfigError::ValidationError(format!(
                        "Duplicate broker display_name '{}'",
                        name
                    )));
                }
            }
        }

        let mut categories = HashSet::new();
        for spec in &self.metrics.categories {
            if !categories.insert(spec.category) {
                return Err(ConfigError::ValidationError(format!(
                    "Category '{}' is configured more than once",
                    spec.category
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
metric_prefix: "Custom Metrics|EMS"
interval_secs: 30
display_dynamic_ids_in_metric_path: true
server:
  port: 9100
brokers:
  - display_name: EMS-1
    host: ems01
    port: 7243
    protocol: ssl
    user: admin
    password: secret
    include_queues: ["orders.*"]
    include_topics: ["prices"]
  - display_name: EMS-2
    url: "http://gateway:8080/ems2"
metrics:
  show_temp: true
  categories:
    - type: Queue
      metric_prefix: MyQueues
      metrics:
        - attr: PendingMessageCount
          alias: Pending
    - type: Server
      enabled: false
"#;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 9595);
        assert_eq!(config.server.path, "/metrics");
        assert_eq!(config.metric_prefix, "Custom Metrics|Tibco EMS");
        assert_eq!(config.interval_secs, 60);
        assert_eq!(config.filter_mode, FilterMode::IncludeOnly);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_yaml(FULL).unwrap();
        assert_eq!(config.metric_prefix, "Custom Metrics|EMS");
        assert_eq!(config.interval_secs, 30);
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.brokers.len(), 2);
        assert!(config.metrics.show_temp);
        assert!(!config.metrics.show_system);

        let ems1 = &config.brokers[0];
        assert_eq!(ems1.protocol, Protocol::Ssl);
        assert_eq!(ems1.admin_url(), "https://ems01:7243");
        assert_eq!(ems1.resolve_password().unwrap(), "secret");

        let ems2 = &config.brokers[1];
        assert_eq!(ems2.admin_url(), "http://gateway:8080/ems2");
        assert_eq!(ems2.resolve_password().unwrap(), "");

        let categories = &config.metrics.categories;
        assert_eq!(categories[0].category, Category::Queue);
        assert!(!categories[1].enabled);

        let settings = config.collector_settings();
        assert!(settings.display_dynamic_ids_in_metric_path);
        assert_eq!(settings.category_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.path = "metrics".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.path = "/health".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_multiple_brokers_need_unique_names() {
        let mut config = Config::default();
        config.brokers = vec![BrokerConfig::default(), BrokerConfig::default()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("display_name is required"));

        config.brokers[0].display_name = Some("A".to_string());
        config.brokers[1].display_name = Some("A".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate broker display_name 'A'"));

        config.brokers[1].display_name = Some("B".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_single_broker_without_name() {
        let mut config = Config::default();
        config.brokers = vec![BrokerConfig::default()];
        assert!(config.validate().is_ok());
        assert_eq!(config.brokers[0].label(), "localhost:7222");
        assert_eq!(config.brokers[0].admin_url(), "http://localhost:7222");
    }

    #[test]
    fn test_duplicate_category() {
        let yaml = r#"
metrics:
  categories:
    - type: Queue
    - type: Queue
"#;
        let err = Config::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_encrypted_password_without_key() {
        let broker = BrokerConfig {
            encrypted_password: Some("c2VjcmV0c2VjcmV0c2VjcmV0".to_string()),
            ..Default::default()
        };
        let err = broker.resolve_password().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Credential(CryptoError::MissingEncryptionKey { .. })
        ));
    }

    #[test]
    fn test_encrypted_password_with_key() {
        let encrypted = crypto::encrypt_password("s3cret", "key").unwrap();
        let broker = BrokerConfig {
            encrypted_password: Some(encrypted),
            encryption_key: Some("key".to_string()),
            ..Default::default()
        };
        assert_eq!(broker.resolve_password().unwrap(), "s3cret");
    }

    #[test]
    fn test_identity_password_resolution() {
        let yaml = r#"
brokers:
  - display_name: "EMS-TLS"
    ssl_identity_file: "/etc/rems/client.pem"
    ssl_identity_password: "changeit"
"#;
        let config = Config::from_yaml(yaml).unwrap();
        let tls = config.brokers[0].tls_options().unwrap();
        assert_eq!(tls.identity_password.as_deref(), Some("changeit"));

        let encrypted = crypto::encrypt_password("changeit", "key").unwrap();
        let broker = BrokerConfig {
            ssl_identity_encrypted_password: Some(encrypted),
            encryption_key: Some("key".to_string()),
            ..Default::default()
        };
        let tls = broker.tls_options().unwrap();
        assert_eq!(tls.identity_password.as_deref(), Some("changeit"));

        let broker = BrokerConfig {
            ssl_identity_encrypted_password: Some("c2VjcmV0c2VjcmV0c2VjcmV0".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            broker.tls_options().unwrap_err(),
            ConfigError::Credential(CryptoError::MissingEncryptionKey { .. })
        ));

        assert!(BrokerConfig::default().tls_options().unwrap().identity_password.is_none());
    }

    #[test]
    fn test_category_filters() {
        let broker = BrokerConfig {
            include_queues: vec!["orders.*".to_string()],
            include_topics: vec!["prices".to_string()],
            include_consumers: Some(vec![]),
            ..Default::default()
        };
        let filters = broker.category_filters(false, false, FilterMode::IncludeOnly);

        assert!(filters[&Category::Queue].allows(Some("orders.eu")));
        assert!(!filters[&Category::Queue].allows(Some("prices")));
        assert!(filters[&Category::Topic].allows(Some("prices")));
        assert!(!filters[&Category::Route].allows(Some("r1")));

        // producers inherit queue and topic patterns
        assert!(filters[&Category::Producer].allows(Some("orders.eu")));
        assert!(filters[&Category::Producer].allows(Some("prices")));
        // explicit empty list reports nothing
        assert!(!filters[&Category::Consumer].allows(Some("orders.eu")));
    }
}
