//! CloudWatch `PutMetricData` backend

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::retry::RetryConfig;
use aws_sdk_cloudwatch::Client;
use aws_sdk_cloudwatch::error::DisplayErrorContext;
use aws_sdk_cloudwatch::primitives::DateTime as AwsDateTime;
use aws_sdk_cloudwatch::types::{
    Dimension as AwsDimension, MetricDatum as AwsMetricDatum, StandardUnit,
};
use tracing::debug;

use super::MetricsPublisher;
use crate::error::{ProbeError, ProbeResult};
use crate::metrics::{MetricBatch, MetricDatum, MetricUnit};

/// Publishes batches to Amazon CloudWatch
#[derive(Debug, Clone)]
pub struct CloudWatchPublisher {
    client: Client,
}

impl CloudWatchPublisher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the standard AWS configuration chain
    /// (environment, profile, instance/task role).
    ///
    /// The SDK retry layer is limited to a single attempt; a failed publish
    /// surfaces immediately and the next scheduled invocation tries again.
    pub async fn from_env() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .retry_config(RetryConfig::disabled())
            .load()
            .await;
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl MetricsPublisher for CloudWatchPublisher {
    async fn publish(&self, batch: &MetricBatch) -> ProbeResult<()> {
        batch.validate()?;

        let data = batch.data.iter().map(to_aws_datum).collect();

        self.client
            .put_metric_data()
            .namespace(&batch.namespace)
            .set_metric_data(Some(data))
            .send()
            .await
            .map_err(|e| ProbeError::Publish(DisplayErrorContext(&e).to_string()))?;

        debug!(namespace = %batch.namespace, data_points = batch.data.len(), "PutMetricData accepted");
        Ok(())
    }
}

fn to_aws_unit(unit: MetricUnit) -> StandardUnit {
    match unit {
        MetricUnit::Count => StandardUnit::Count,
    }
}

fn to_aws_datum(datum: &MetricDatum) -> AwsMetricDatum {
    let dimensions = datum
        .dimensions
        .iter()
        .map(|d| AwsDimension::builder().name(&d.name).value(&d.value).build())
        .collect();

    AwsMetricDatum::builder()
        .metric_name(&datum.metric_name)
        .set_dimensions(Some(dimensions))
        .value(datum.value)
        .unit(to_aws_unit(datum.unit))
        .timestamp(AwsDateTime::from_millis(datum.timestamp.timestamp_millis()))
        .build()
}
