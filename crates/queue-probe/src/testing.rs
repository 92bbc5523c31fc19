//! # Mock Backends for Testing
//!
//! In-memory queue store and metrics publisher that record every call, so
//! invocation flows can be checked without Redis or CloudWatch.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

use crate::config::StoreConfig;
use crate::error::{ProbeError, ProbeResult};
use crate::metrics::MetricBatch;
use crate::publish::MetricsPublisher;
use crate::store::{QueueConnection, QueueStore};

/// Call counters shared between a mock store and its connections
#[derive(Debug, Default)]
pub struct StoreCalls {
    pub connects: AtomicUsize,
    pub reads: AtomicUsize,
    pub disconnects: AtomicUsize,
}

impl StoreCalls {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

/// Queue store serving scripted lengths
#[derive(Debug, Clone, Default)]
pub struct MockQueueStore {
    lengths: HashMap<String, Result<u64, String>>,
    connect_error: Option<String>,
    calls: Arc<StoreCalls>,
}

impl MockQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `length` for `key`. Unknown keys read as zero, like `LLEN`.
    pub fn with_length(mut self, key: &str, length: u64) -> Self {
        self.lengths.insert(key.to_string(), Ok(length));
        self
    }

    /// Fail every read of `key`
    pub fn with_read_error(mut self, key: &str, reason: &str) -> Self {
        self.lengths.insert(key.to_string(), Err(reason.to_string()));
        self
    }

    /// Refuse every connection attempt
    pub fn refusing(mut self, reason: &str) -> Self {
        self.connect_error = Some(reason.to_string());
        self
    }

    pub fn calls(&self) -> Arc<StoreCalls> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl QueueStore for MockQueueStore {
    type Connection = MockConnection;

    async fn connect(&self, config: &StoreConfig) -> ProbeResult<MockConnection> {
        self.calls.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.connect_error {
            return Err(ProbeError::Connection {
                endpoint: config.endpoint(),
                reason: reason.clone(),
            });
        }
        Ok(MockConnection {
            lengths: self.lengths.clone(),
            calls: Arc::clone(&self.calls),
        })
    }
}

pub struct MockConnection {
    lengths: HashMap<String, Result<u64, String>>,
    calls: Arc<StoreCalls>,
}

#[async_trait]
impl QueueConnection for MockConnection {
    async fn list_length(&self, key: &str) -> ProbeResult<u64> {
        self.calls.reads.fetch_add(1, Ordering::SeqCst);
        match self.lengths.get(key) {
            Some(Ok(length)) => Ok(*length),
            Some(Err(reason)) => Err(ProbeError::read(key, reason)),
            None => Ok(0),
        }
    }

    async fn disconnect(self) {
        self.calls.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Publisher that keeps every batch it receives
#[derive(Debug, Clone, Default)]
pub struct MockPublisher {
    error: Option<String>,
    published: Arc<Mutex<Vec<MetricBatch>>>,
    attempts: Arc<AtomicUsize>,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every publish with `reason`
    pub fn failing(reason: &str) -> Self {
        Self {
            error: Some(reason.to_string()),
            ..Self::default()
        }
    }

    /// Number of publish calls, successful or not
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Batches accepted so far
    pub async fn published(&self) -> Vec<MetricBatch> {
        self.published.lock().await.clone()
    }
}

#[async_trait]
impl MetricsPublisher for MockPublisher {
    async fn publish(&self, batch: &MetricBatch) -> ProbeResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.error {
            return Err(ProbeError::Publish(reason.clone()));
        }
        self.published.lock().await.push(batch.clone());
        Ok(())
    }
}
