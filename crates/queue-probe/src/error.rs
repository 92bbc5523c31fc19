//! Error types for probe invocations

use thiserror::Error;

/// Result type for probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can end a probe invocation
///
/// Every variant is surfaced to the caller after the queue-store connection
/// (if one was opened) has been released.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// A required setting is missing or a value could not be parsed.
    /// Raised before any network activity.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Opening the queue-store connection failed (refused, auth, TLS)
    #[error("Connection to {endpoint} failed: {reason}")]
    Connection { endpoint: String, reason: String },

    /// A queue length query failed
    #[error("Failed to read length of queue '{queue}': {reason}")]
    Read { queue: String, reason: String },

    /// The metrics backend rejected or never received the batch
    #[error("Publish failed: {0}")]
    Publish(String),

    /// Result body could not be serialized
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl ProbeError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        ProbeError::Config(message.into())
    }

    /// Create a read error for the given queue key
    pub fn read(queue: impl Into<String>, reason: impl ToString) -> Self {
        ProbeError::Read {
            queue: queue.into(),
            reason: reason.to_string(),
        }
    }

    /// Short machine-readable name of the error kind, used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::Config(_) => "config",
            ProbeError::Connection { .. } => "connection",
            ProbeError::Read { .. } => "read",
            ProbeError::Publish(_) => "publish",
            ProbeError::Serialization(_) => "serialization",
        }
    }
}

impl From<serde_json::Error> for ProbeError {
    fn from(err: serde_json::Error) -> Self {
        ProbeError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProbeError::read("urls", "connection reset");
        assert_eq!(
            err.to_string(),
            "Failed to read length of queue 'urls': connection reset"
        );

        let err = ProbeError::Connection {
            endpoint: "redis.internal:6379".to_string(),
            reason: "refused".to_string(),
        };
        assert!(err.to_string().contains("redis.internal:6379"));
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(ProbeError::config("REDIS_HOST not defined").kind(), "config");
        assert_eq!(ProbeError::Publish("throttled".into()).kind(), "publish");
    }
}
