//! # Queue Probe
//!
//! Scheduled metrics probe for work queues kept in Redis lists.
//!
//! Each invocation reads the current length of every monitored list,
//! republishes the values as `Count` metrics under one namespace, and reports
//! the readings back to the trigger. Nothing is kept between invocations.
//!
//! ## Backends
//!
//! - **[RedisQueueStore]**: Redis lists read with `LLEN` (requires `redis` feature)
//! - **[CloudWatchPublisher]**: Amazon CloudWatch `PutMetricData` (requires `cloudwatch` feature)
//! - **[LogPublisher]**: dry-run backend that logs the batch
//!
//! ## Example
//!
//! ```rust,no_run
//! use queue_probe::{CloudWatchPublisher, ProbeConfigBuilder, QueueProbe, RedisQueueStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let builder = ProbeConfigBuilder::from_env()?;
//!     let publisher = CloudWatchPublisher::from_env().await;
//!     let probe = QueueProbe::from_builder(builder, RedisQueueStore::new(), publisher)?;
//!
//!     let result = probe.run().await?;
//!     println!("{}", result.body);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod metrics;
pub mod probe;
pub mod publish;
pub mod queue;
pub mod store;
pub mod summary;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{ProbeConfig, ProbeConfigBuilder, StoreConfig};
pub use error::{ProbeError, ProbeResult};
pub use metrics::{Dimension, MetricBatch, MetricDatum, MetricUnit};
pub use probe::{ProbePhase, QueueProbe, run_from_env};
pub use publish::{LogPublisher, MetricsPublisher};
pub use queue::{QueueReading, QueueSpec};
pub use store::{QueueConnection, QueueStore, read_all};
pub use summary::{InvocationResult, ProbeSummary};

#[cfg(feature = "cloudwatch")]
pub use publish::CloudWatchPublisher;

#[cfg(feature = "redis")]
pub use store::{RedisQueueConnection, RedisQueueStore};
