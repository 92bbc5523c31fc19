//! Redis implementation of the queue store

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, ConnectionInfo, IntoConnectionInfo};
use std::time::{Duration, Instant};
use tracing::debug;

use super::{QueueConnection, QueueStore};
use crate::config::StoreConfig;
use crate::error::{ProbeError, ProbeResult};

/// Connects to a standalone Redis server
#[derive(Debug, Clone, Default)]
pub struct RedisQueueStore;

impl RedisQueueStore {
    pub fn new() -> Self {
        Self
    }

    /// Build connection info from the resolved settings.
    ///
    /// Credentials are set on the parsed info instead of being embedded in
    /// the URL so they never need escaping.
    fn connection_info(config: &StoreConfig) -> ProbeResult<ConnectionInfo> {
        let scheme = if config.tls { "rediss" } else { "redis" };
        let url = format!("{scheme}://{}:{}", config.host, config.port);

        let mut info = url
            .as_str()
            .into_connection_info()
            .map_err(|e| ProbeError::Connection {
                endpoint: config.endpoint(),
                reason: format!("invalid address: {e}"),
            })?;
        info.redis.db = i64::from(config.database);
        info.redis.password = config.password.clone();
        Ok(info)
    }
}

#[async_trait]
impl QueueStore for RedisQueueStore {
    type Connection = RedisQueueConnection;

    async fn connect(&self, config: &StoreConfig) -> ProbeResult<RedisQueueConnection> {
        let endpoint = config.endpoint();
        let connection_error = |reason: String| ProbeError::Connection {
            endpoint: endpoint.clone(),
            reason,
        };

        let client = redis::Client::open(Self::connection_info(config)?)
            .map_err(|e| connection_error(e.to_string()))?;

        // AUTH and SELECT run as part of the handshake
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| connection_error(e.to_string()))?;

        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| connection_error(format!("PING failed: {e}")))?;

        debug!(endpoint = %endpoint, db = config.database, tls = config.tls, "Redis connection established");

        Ok(RedisQueueConnection {
            conn,
            endpoint,
            connected_at: Instant::now(),
        })
    }
}

/// Multiplexed Redis connection. Clones of the inner handle share one socket,
/// so concurrent reads are pipelined over a single link.
pub struct RedisQueueConnection {
    conn: MultiplexedConnection,
    endpoint: String,
    connected_at: Instant,
}

impl RedisQueueConnection {
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn connection_duration(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

#[async_trait]
impl QueueConnection for RedisQueueConnection {
    async fn list_length(&self, key: &str) -> ProbeResult<u64> {
        let mut conn = self.conn.clone();
        conn.llen::<_, u64>(key)
            .await
            .map_err(|e| ProbeError::read(key, e))
    }

    async fn disconnect(self) {
        let held_for = self.connection_duration();
        // Dropping the last handle closes the socket
        drop(self.conn);
        debug!(endpoint = %self.endpoint, held_for = ?held_for, "Redis connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_config(tls: bool) -> StoreConfig {
        StoreConfig {
            host: "cache.internal".to_string(),
            port: 6380,
            password: Some("p@ss/word".to_string()),
            database: 2,
            tls,
        }
    }

    #[test]
    fn test_connection_info_plain() {
        let info = RedisQueueStore::connection_info(&store_config(false)).unwrap();
        assert_eq!(info.redis.db, 2);
        assert_eq!(info.redis.password.as_deref(), Some("p@ss/word"));
        assert!(matches!(
            info.addr,
            redis::ConnectionAddr::Tcp(ref host, 6380) if host == "cache.internal"
        ));
    }

    #[test]
    fn test_connection_info_tls() {
        let info = RedisQueueStore::connection_info(&store_config(true)).unwrap();
        assert!(matches!(
            info.addr,
            redis::ConnectionAddr::TcpTls { ref host, port: 6380, insecure: false, .. }
                if host == "cache.internal"
        ));
    }

    #[tokio::test]
    async fn test_connect_refused_is_connection_error() {
        let config = StoreConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            password: None,
            database: 0,
            tls: false,
        };
        let result = RedisQueueStore::new().connect(&config).await;
        assert!(matches!(result, Err(ProbeError::Connection { .. })));
    }
}
