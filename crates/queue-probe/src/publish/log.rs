//! Dry-run backend that logs batches instead of sending them

use async_trait::async_trait;
use tracing::info;

use super::MetricsPublisher;
use crate::error::ProbeResult;
use crate::metrics::MetricBatch;

#[derive(Debug, Clone, Default)]
pub struct LogPublisher;

impl LogPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MetricsPublisher for LogPublisher {
    async fn publish(&self, batch: &MetricBatch) -> ProbeResult<()> {
        batch.validate()?;
        let payload = serde_json::to_string(batch)?;
        info!(
            namespace = %batch.namespace,
            data_points = batch.data.len(),
            payload = %payload,
            "Dry run: metric batch not sent"
        );
        Ok(())
    }
}
