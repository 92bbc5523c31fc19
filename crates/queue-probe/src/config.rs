//! # Environment-Based Configuration
//!
//! Connection settings for the queue store and publishing settings for the
//! metrics backend are read from environment variables on every invocation.
//!
//! ## Environment Variables
//!
//! ### Queue Store
//! - `REDIS_HOST` - Queue-store host (required)
//! - `REDIS_PORT` - Queue-store port (default: 6379)
//! - `REDIS_PASSWORD` - AUTH password (optional)
//! - `REDIS_DB` - Logical database index (default: 0)
//! - `REDIS_TLS` - Use a TLS connection (default: true)
//!
//! ### Metrics
//! - `QUEUE_METRICS_NAMESPACE` - Metrics namespace (default: "CustomRedisMetrics")
//! - `QUEUE_METRICS_QUEUES` - Comma-separated `key=MetricName` pairs
//!   (default: "urls=ScraperQueueLength,rag=RAGQueueLength")

use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

use crate::error::{ProbeError, ProbeResult};
use crate::queue::QueueSpec;

pub const DEFAULT_PORT: u16 = 6379;
pub const DEFAULT_DATABASE: u32 = 0;
pub const DEFAULT_NAMESPACE: &str = "CustomRedisMetrics";

pub const ENV_HOST: &str = "REDIS_HOST";
pub const ENV_PORT: &str = "REDIS_PORT";
pub const ENV_PASSWORD: &str = "REDIS_PASSWORD";
pub const ENV_DATABASE: &str = "REDIS_DB";
pub const ENV_TLS: &str = "REDIS_TLS";
pub const ENV_NAMESPACE: &str = "QUEUE_METRICS_NAMESPACE";
pub const ENV_QUEUES: &str = "QUEUE_METRICS_QUEUES";

/// Resolved queue-store connection settings
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    #[serde(serialize_with = "serialize_redacted")]
    pub password: Option<String>,
    pub database: u32,
    pub tls: bool,
}

impl StoreConfig {
    /// `host:port`, used in logs and connection errors
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .field("database", &self.database)
            .field("tls", &self.tls)
            .finish()
    }
}

const REDACTED: &str = "***";

fn serialize_redacted<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(_) => s.serialize_some(REDACTED),
        None => s.serialize_none(),
    }
}

/// Complete, validated probe configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeConfig {
    pub store: StoreConfig,
    pub namespace: String,
    pub queues: Vec<QueueSpec>,
}

/// Builder for `ProbeConfig` with environment variable support
#[derive(Debug, Clone)]
pub struct ProbeConfigBuilder {
    host: Option<String>,
    port: u16,
    password: Option<String>,
    database: u32,
    tls: bool,
    namespace: String,
    queues: Vec<QueueSpec>,
}

impl Default for ProbeConfigBuilder {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_PORT,
            password: None,
            database: DEFAULT_DATABASE,
            tls: true,
            namespace: DEFAULT_NAMESPACE.to_string(),
            queues: QueueSpec::defaults(),
        }
    }
}

impl ProbeConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::Config` if a variable holds an unparsable value.
    pub fn from_env() -> ProbeResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> ProbeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut builder = Self::default();

        if let Some(host) = get(ENV_HOST) {
            builder = builder.host(host.trim());
        }
        if let Some(port) = parse_var::<u16>(ENV_PORT, get(ENV_PORT))? {
            builder = builder.port(port);
        }
        if let Some(password) = get(ENV_PASSWORD) {
            builder = builder.password(password);
        }
        if let Some(database) = parse_var::<u32>(ENV_DATABASE, get(ENV_DATABASE))? {
            builder = builder.database(database);
        }
        if let Some(tls) = parse_bool(ENV_TLS, get(ENV_TLS))? {
            builder = builder.tls(tls);
        }
        if let Some(namespace) = get(ENV_NAMESPACE) {
            builder = builder.namespace(namespace.trim());
        }
        if let Some(queues) = get(ENV_QUEUES) {
            builder = builder.queues(QueueSpec::parse_list(&queues)?);
        }

        Ok(builder)
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn database(mut self, database: u32) -> Self {
        self.database = database;
        self
    }

    #[must_use]
    pub fn tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[must_use]
    pub fn queues(mut self, queues: Vec<QueueSpec>) -> Self {
        self.queues = queues;
        self
    }

    /// Validate configuration and build `ProbeConfig`
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::Config` when the host is missing or the metric
    /// settings are inconsistent.
    pub fn build(self) -> ProbeResult<ProbeConfig> {
        let host = match self.host {
            Some(host) if !host.is_empty() => host,
            _ => return Err(ProbeError::config(format!("{ENV_HOST} not defined"))),
        };

        if self.namespace.is_empty() {
            return Err(ProbeError::config("metrics namespace cannot be empty"));
        }
        validate_queues(&self.queues)?;

        Ok(ProbeConfig {
            store: StoreConfig {
                host,
                port: self.port,
                password: self.password,
                database: self.database,
                tls: self.tls,
            },
            namespace: self.namespace,
            queues: self.queues,
        })
    }
}

fn validate_queues(queues: &[QueueSpec]) -> ProbeResult<()> {
    if queues.is_empty() {
        return Err(ProbeError::config("at least one queue must be monitored"));
    }

    let mut keys = HashSet::new();
    let mut metric_names = HashSet::new();
    for queue in queues {
        if queue.key.is_empty() || queue.metric_name.is_empty() {
            return Err(ProbeError::config(
                "queue key and metric name cannot be empty",
            ));
        }
        if !keys.insert(queue.key.as_str()) {
            return Err(ProbeError::config(format!(
                "queue '{}' is listed more than once",
                queue.key
            )));
        }
        if !metric_names.insert(queue.metric_name.as_str()) {
            return Err(ProbeError::config(format!(
                "metric name '{}' is used by more than one queue",
                queue.metric_name
            )));
        }
    }

    Ok(())
}

// Environment variable helper functions

fn parse_var<T>(key: &str, value: Option<String>) -> ProbeResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match value {
        Some(val) => val.trim().parse::<T>().map(Some).map_err(|e| {
            ProbeError::config(format!("invalid value '{val}' for {key}: {e}"))
        }),
        None => Ok(None),
    }
}

fn parse_bool(key: &str, value: Option<String>) -> ProbeResult<Option<bool>> {
    match value {
        Some(val) => match val.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(ProbeError::config(format!(
                "invalid boolean value '{val}' for {key}, expected true/false/1/0/yes/no/on/off"
            ))),
        },
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_host_only() {
        let config = ProbeConfigBuilder::from_lookup(lookup(&[("REDIS_HOST", "cache.local")]))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.store.host, "cache.local");
        assert_eq!(config.store.port, 6379);
        assert_eq!(config.store.database, 0);
        assert_eq!(config.store.password, None);
        assert!(config.store.tls);
        assert_eq!(config.namespace, "CustomRedisMetrics");
        assert_eq!(config.queues, QueueSpec::defaults());
    }

    #[test]
    fn test_missing_host_is_config_error() {
        let result = ProbeConfigBuilder::from_lookup(lookup(&[("REDIS_PORT", "6380")]))
            .unwrap()
            .build();
        let err = result.unwrap_err();
        assert!(matches!(err, ProbeError::Config(_)));
        assert!(err.to_string().contains("REDIS_HOST not defined"));
    }

    #[test]
    fn test_empty_host_is_treated_as_missing() {
        let result = ProbeConfigBuilder::from_lookup(lookup(&[("REDIS_HOST", "  ")]))
            .unwrap()
            .build();
        assert!(matches!(result, Err(ProbeError::Config(_))));
    }

    #[test]
    fn test_all_variables() {
        let config = ProbeConfigBuilder::from_lookup(lookup(&[
            ("REDIS_HOST", "cache.local"),
            ("REDIS_PORT", "6380"),
            ("REDIS_PASSWORD", "hunter2"),
            ("REDIS_DB", "3"),
            ("REDIS_TLS", "off"),
            ("QUEUE_METRICS_NAMESPACE", "Pipeline"),
            ("QUEUE_METRICS_QUEUES", "jobs=JobQueueLength"),
        ]))
        .unwrap()
        .build()
        .unwrap();

        assert_eq!(config.store.port, 6380);
        assert_eq!(config.store.password.as_deref(), Some("hunter2"));
        assert_eq!(config.store.database, 3);
        assert!(!config.store.tls);
        assert_eq!(config.namespace, "Pipeline");
        assert_eq!(config.queues, vec![QueueSpec::new("jobs", "JobQueueLength")]);
    }

    #[test]
    fn test_invalid_port() {
        let err = ProbeConfigBuilder::from_lookup(lookup(&[
            ("REDIS_HOST", "cache.local"),
            ("REDIS_PORT", "not-a-port"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("REDIS_PORT"));
    }

    #[test]
    fn test_invalid_database_and_tls() {
        assert!(ProbeConfigBuilder::from_lookup(lookup(&[("REDIS_DB", "-1")])).is_err());
        assert!(ProbeConfigBuilder::from_lookup(lookup(&[("REDIS_TLS", "maybe")])).is_err());
    }

    #[test]
    fn test_duplicate_queue_rejected() {
        let result = ProbeConfigBuilder::new()
            .host("cache.local")
            .queues(vec![
                QueueSpec::new("urls", "A"),
                QueueSpec::new("urls", "B"),
            ])
            .build();
        assert!(result.unwrap_err().to_string().contains("more than once"));
    }

    #[test]
    fn test_shared_metric_name_rejected() {
        let result = ProbeConfigBuilder::new()
            .host("cache.local")
            .queues(vec![QueueSpec::new("a", "Len"), QueueSpec::new("b", "Len")])
            .build();
        assert!(result.unwrap_err().to_string().contains("more than one queue"));
    }

    #[test]
    fn test_empty_queue_list_rejected() {
        let result = ProbeConfigBuilder::new().host("h").queues(vec![]).build();
        assert!(matches!(result, Err(ProbeError::Config(_))));
    }

    #[test]
    fn test_password_is_redacted() {
        let config = ProbeConfigBuilder::new()
            .host("cache.local")
            .password("hunter2")
            .build()
            .unwrap();

        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("hunter2"));
    }
}
