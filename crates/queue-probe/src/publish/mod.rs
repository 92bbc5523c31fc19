//! Metrics backends

use async_trait::async_trait;

use crate::error::ProbeResult;
use crate::metrics::MetricBatch;

#[cfg(feature = "cloudwatch")]
pub mod cloudwatch;
pub mod log;

#[cfg(feature = "cloudwatch")]
pub use cloudwatch::CloudWatchPublisher;
pub use log::LogPublisher;

/// Sends a metric batch to a monitoring backend
#[async_trait]
pub trait MetricsPublisher: Send + Sync {
    /// Publish the whole batch in a single request
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::Publish` on any backend failure, throttling
    /// included. Implementations do not retry.
    async fn publish(&self, batch: &MetricBatch) -> ProbeResult<()>;
}

#[async_trait]
impl<P: MetricsPublisher + ?Sized> MetricsPublisher for Box<P> {
    async fn publish(&self, batch: &MetricBatch) -> ProbeResult<()> {
        (**self).publish(batch).await
    }
}
