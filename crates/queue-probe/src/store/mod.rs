//! Queue-store access
//!
//! An invocation only needs two things from the store: open a connection and ask
//! for the length of a list. Both sit behind traits so the invocation flow can
//! be exercised without a live server.

use async_trait::async_trait;
use futures::future::try_join_all;

use crate::config::StoreConfig;
use crate::error::ProbeResult;
use crate::queue::{QueueReading, QueueSpec};

#[cfg(feature = "redis")]
pub mod redis;

#[cfg(feature = "redis")]
pub use self::redis::{RedisQueueConnection, RedisQueueStore};

/// Opens connections to a queue store
#[async_trait]
pub trait QueueStore: Send + Sync {
    type Connection: QueueConnection;

    /// Open a connection using the resolved settings
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::Connection` if the store is unreachable or rejects
    /// the handshake. No retry is attempted.
    async fn connect(&self, config: &StoreConfig) -> ProbeResult<Self::Connection>;
}

/// An open connection owned by a single invocation
#[async_trait]
pub trait QueueConnection: Send + Sync {
    /// Number of elements stored in the list at `key`.
    /// A missing key has length zero.
    ///
    /// # Errors
    ///
    /// Returns `ProbeError::Read` if the query fails.
    async fn list_length(&self, key: &str) -> ProbeResult<u64>;

    /// Release the connection. Consumes the handle so it runs at most once.
    async fn disconnect(self);
}

/// Read every queue concurrently and wait for all of them.
///
/// Fails with the first error; readings are returned in `queues` order.
pub async fn read_all<C>(conn: &C, queues: &[QueueSpec]) -> ProbeResult<Vec<QueueReading>>
where
    C: QueueConnection + ?Sized,
{
    try_join_all(queues.iter().map(|spec| async move {
        let length = conn.list_length(&spec.key).await?;
        Ok(QueueReading::new(spec, length))
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Barrier;

    struct FixedConnection;

    #[async_trait]
    impl QueueConnection for FixedConnection {
        async fn list_length(&self, key: &str) -> ProbeResult<u64> {
            match key {
                "urls" => Ok(5),
                "rag" => Ok(0),
                other => Err(ProbeError::read(other, "no such queue")),
            }
        }

        async fn disconnect(self) {}
    }

    #[tokio::test]
    async fn test_read_all_keeps_queue_order() {
        let readings = read_all(&FixedConnection, &QueueSpec::defaults())
            .await
            .unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!((readings[0].key.as_str(), readings[0].length), ("urls", 5));
        assert_eq!((readings[1].key.as_str(), readings[1].length), ("rag", 0));
    }

    #[tokio::test]
    async fn test_read_all_fails_when_any_read_fails() {
        let mut queues = QueueSpec::defaults();
        queues.push(QueueSpec::new("missing", "MissingQueueLength"));

        let err = read_all(&FixedConnection, &queues).await.unwrap_err();
        assert!(matches!(err, ProbeError::Read { ref queue, .. } if queue == "missing"));
    }

    /// Every read parks until all expected reads are in flight.
    struct GatedConnection {
        gate: Arc<Barrier>,
    }

    #[async_trait]
    impl QueueConnection for GatedConnection {
        async fn list_length(&self, key: &str) -> ProbeResult<u64> {
            self.gate.wait().await;
            Ok(key.len() as u64)
        }

        async fn disconnect(self) {}
    }

    #[tokio::test]
    async fn test_read_all_issues_reads_concurrently() {
        let queues = QueueSpec::defaults();
        let conn = GatedConnection {
            gate: Arc::new(Barrier::new(queues.len())),
        };

        // Sequential reads would park on the first wait forever
        let readings = tokio::time::timeout(Duration::from_secs(1), read_all(&conn, &queues))
            .await
            .expect("reads did not overlap")
            .unwrap();
        assert_eq!(readings[0].length, 4);
        assert_eq!(readings[1].length, 3);
    }
}
