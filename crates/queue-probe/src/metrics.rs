//! Metric payload built from queue readings
//!
//! The shapes here mirror CloudWatch `PutMetricData` but stay backend
//! agnostic so any [`MetricsPublisher`](crate::publish::MetricsPublisher)
//! can consume them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{ProbeError, ProbeResult};
use crate::queue::QueueReading;

/// Dimension attached to every queue metric
pub const QUEUE_DIMENSION: &str = "QueueName";

/// Upper bound on data points in a single publish request
pub const MAX_DATA_PER_REQUEST: usize = 1000;

/// Upper bound on dimensions per data point
pub const MAX_DIMENSIONS: usize = 30;

/// Unit of a metric value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetricUnit {
    Count,
}

impl MetricUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricUnit::Count => "Count",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

/// A single timestamped observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDatum {
    pub metric_name: String,
    pub dimensions: Vec<Dimension>,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    pub unit: MetricUnit,
}

impl MetricDatum {
    /// One `Count` datum per reading, labelled with the queue key
    pub fn from_reading(reading: &QueueReading, timestamp: DateTime<Utc>) -> Self {
        Self {
            metric_name: reading.metric_name.clone(),
            dimensions: vec![Dimension {
                name: QUEUE_DIMENSION.to_string(),
                value: reading.key.clone(),
            }],
            value: reading.length as f64,
            timestamp,
            unit: MetricUnit::Count,
        }
    }
}

/// Data points sent together under one namespace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricBatch {
    pub namespace: String,
    pub data: Vec<MetricDatum>,
}

impl MetricBatch {
    /// Build the batch for an invocation. Every datum shares `now`.
    pub fn from_readings(
        namespace: impl Into<String>,
        readings: &[QueueReading],
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            data: readings
                .iter()
                .map(|reading| MetricDatum::from_reading(reading, now))
                .collect(),
        }
    }

    /// Check the batch against backend request limits
    pub fn validate(&self) -> ProbeResult<()> {
        if self.data.is_empty() {
            return Err(ProbeError::Publish("metric batch is empty".to_string()));
        }
        if self.data.len() > MAX_DATA_PER_REQUEST {
            return Err(ProbeError::Publish(format!(
                "metric batch has {} data points (limit: {})",
                self.data.len(),
                MAX_DATA_PER_REQUEST
            )));
        }
        if let Some(datum) = self.data.iter().find(|d| d.dimensions.len() > MAX_DIMENSIONS) {
            return Err(ProbeError::Publish(format!(
                "metric '{}' has {} dimensions (limit: {})",
                datum.metric_name,
                datum.dimensions.len(),
                MAX_DIMENSIONS
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::QueueSpec;

    fn readings(urls: u64, rag: u64) -> Vec<QueueReading> {
        let specs = QueueSpec::defaults();
        vec![
            QueueReading::new(&specs[0], urls),
            QueueReading::new(&specs[1], rag),
        ]
    }

    #[test]
    fn test_batch_from_readings() {
        let now = Utc::now();
        let batch = MetricBatch::from_readings("CustomRedisMetrics", &readings(5, 0), now);

        assert_eq!(batch.namespace, "CustomRedisMetrics");
        assert_eq!(batch.data.len(), 2);

        let urls = &batch.data[0];
        assert_eq!(urls.metric_name, "ScraperQueueLength");
        assert_eq!(urls.value, 5.0);
        assert_eq!(urls.unit, MetricUnit::Count);
        assert_eq!(urls.timestamp, now);
        assert_eq!(
            urls.dimensions,
            vec![Dimension {
                name: "QueueName".to_string(),
                value: "urls".to_string()
            }]
        );

        let rag = &batch.data[1];
        assert_eq!(rag.metric_name, "RAGQueueLength");
        assert_eq!(rag.value, 0.0);
        assert_eq!(rag.dimensions[0].value, "rag");
    }

    #[test]
    fn test_validate_limits() {
        let now = Utc::now();
        assert!(MetricBatch::from_readings("ns", &readings(1, 2), now).validate().is_ok());
        assert!(MetricBatch::from_readings("ns", &[], now).validate().is_err());

        let spec = QueueSpec::new("q", "Q");
        let many: Vec<_> = (0..=MAX_DATA_PER_REQUEST as u64)
            .map(|n| QueueReading::new(&spec, n))
            .collect();
        let err = MetricBatch::from_readings("ns", &many, now).validate().unwrap_err();
        assert!(err.to_string().contains("limit: 1000"));
    }

    #[test]
    fn test_unit_name() {
        assert_eq!(MetricUnit::Count.as_str(), "Count");
    }
}
