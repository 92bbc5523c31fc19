//! The probe-and-report routine
//!
//! One invocation walks `Validating → Connecting → Reading → Publishing →
//! Disconnecting → Done`. Once a connection is open it is always released
//! before the invocation returns, whichever step failed.

use chrono::Utc;
use std::fmt;
use tracing::{error, info};

use crate::config::{ProbeConfig, ProbeConfigBuilder};
use crate::error::ProbeResult;
use crate::metrics::MetricBatch;
use crate::publish::MetricsPublisher;
use crate::store::{QueueConnection, QueueStore, read_all};
use crate::summary::{InvocationResult, ProbeSummary};

/// Step of an invocation, recorded on log events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbePhase {
    Validating,
    Connecting,
    Reading,
    Publishing,
    Disconnecting,
}

impl ProbePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbePhase::Validating => "validating",
            ProbePhase::Connecting => "connecting",
            ProbePhase::Reading => "reading",
            ProbePhase::Publishing => "publishing",
            ProbePhase::Disconnecting => "disconnecting",
        }
    }
}

impl fmt::Display for ProbePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads queue lengths from a store and publishes them as metrics.
///
/// Holds no per-invocation state; every call to [`QueueProbe::run`] opens and
/// closes its own connection.
pub struct QueueProbe<S, P> {
    config: ProbeConfig,
    store: S,
    publisher: P,
}

impl<S, P> QueueProbe<S, P>
where
    S: QueueStore,
    P: MetricsPublisher,
{
    pub fn new(config: ProbeConfig, store: S, publisher: P) -> Self {
        Self {
            config,
            store,
            publisher,
        }
    }

    /// Validate the configuration and assemble a probe.
    ///
    /// Fails with `ProbeError::Config` before the store is touched.
    pub fn from_builder(builder: ProbeConfigBuilder, store: S, publisher: P) -> ProbeResult<Self> {
        let config = builder.build().inspect_err(|e| {
            error!(phase = %ProbePhase::Validating, kind = e.kind(), error = %e, "Invalid probe configuration");
        })?;
        Ok(Self::new(config, store, publisher))
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Handle a trigger event. The payload carries no information and is
    /// ignored.
    pub async fn invoke(&self, _event: &serde_json::Value) -> ProbeResult<InvocationResult> {
        self.run().await
    }

    /// Run one probe-and-report cycle
    pub async fn run(&self) -> ProbeResult<InvocationResult> {
        let store_config = &self.config.store;
        info!(
            phase = %ProbePhase::Connecting,
            endpoint = %store_config.endpoint(),
            db = store_config.database,
            tls = store_config.tls,
            authenticated = store_config.password.is_some(),
            "Connecting to queue store"
        );

        let conn = self.store.connect(store_config).await.inspect_err(|e| {
            error!(phase = %ProbePhase::Connecting, kind = e.kind(), error = %e, "Queue store connection failed");
        })?;

        let outcome = self.read_and_publish(&conn).await;

        info!(phase = %ProbePhase::Disconnecting, "Disconnecting from queue store");
        conn.disconnect().await;

        let summary = outcome?;
        InvocationResult::ok(summary)
    }

    async fn read_and_publish(&self, conn: &S::Connection) -> ProbeResult<ProbeSummary> {
        info!(
            phase = %ProbePhase::Reading,
            queues = self.config.queues.len(),
            "Querying queue lengths"
        );
        let readings = read_all(conn, &self.config.queues).await.inspect_err(|e| {
            error!(phase = %ProbePhase::Reading, kind = e.kind(), error = %e, "Queue length query failed");
        })?;

        for reading in &readings {
            info!(queue = %reading.key, length = reading.length, "Queue length");
        }

        let batch = MetricBatch::from_readings(&self.config.namespace, &readings, Utc::now());
        info!(
            phase = %ProbePhase::Publishing,
            namespace = %batch.namespace,
            data_points = batch.data.len(),
            "Publishing metric batch"
        );
        self.publisher.publish(&batch).await.inspect_err(|e| {
            error!(phase = %ProbePhase::Publishing, kind = e.kind(), error = %e, "Metric publish failed");
        })?;
        info!("Published queue metrics");

        Ok(ProbeSummary::success(readings))
    }
}

/// Convenience wrapper: read the environment, validate, and run once.
pub async fn run_from_env<S, P>(store: S, publisher: P) -> ProbeResult<InvocationResult>
where
    S: QueueStore,
    P: MetricsPublisher,
{
    let builder = ProbeConfigBuilder::from_env().inspect_err(|e| {
        error!(phase = %ProbePhase::Validating, kind = e.kind(), error = %e, "Invalid probe configuration");
    })?;
    QueueProbe::from_builder(builder, store, publisher)?.run().await
}
