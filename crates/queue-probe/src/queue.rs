//! Monitored queue identities and the readings taken from them

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{ProbeError, ProbeResult};

/// Key of the URL-processing (scraper) queue
pub const URLS_QUEUE: &str = "urls";

/// Key of the downstream RAG processing queue
pub const RAG_QUEUE: &str = "rag";

/// A list key in the queue store and the metric it is published under
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueSpec {
    pub key: String,
    pub metric_name: String,
}

impl QueueSpec {
    pub fn new(key: impl Into<String>, metric_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            metric_name: metric_name.into(),
        }
    }

    /// The two work queues of the scraping pipeline
    pub fn defaults() -> Vec<QueueSpec> {
        vec![
            QueueSpec::new(URLS_QUEUE, "ScraperQueueLength"),
            QueueSpec::new(RAG_QUEUE, "RAGQueueLength"),
        ]
    }

    /// Parse a comma-separated `key=MetricName` list.
    ///
    /// Whitespace around entries is ignored; empty entries are skipped.
    pub fn parse_list(input: &str) -> ProbeResult<Vec<QueueSpec>> {
        input
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (key, metric_name) = entry.split_once('=').ok_or_else(|| {
                    ProbeError::config(format!(
                        "invalid queue entry '{entry}', expected key=MetricName"
                    ))
                })?;
                Ok(QueueSpec::new(key.trim(), metric_name.trim()))
            })
            .collect()
    }
}

/// Length of one queue at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueReading {
    pub key: String,
    pub metric_name: String,
    pub length: u64,
    pub observed_at: DateTime<Utc>,
}

impl QueueReading {
    pub fn new(spec: &QueueSpec, length: u64) -> Self {
        Self {
            key: spec.key.clone(),
            metric_name: spec.metric_name.clone(),
            length,
            observed_at: Utc::now(),
        }
    }
}
