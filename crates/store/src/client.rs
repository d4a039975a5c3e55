//! Redis backend for the journey store.
//!
//! The client is opened eagerly but the connection is established on first
//! use, so a process can start while Redis is still coming up. A connection
//! that errors at the transport level or times out is discarded, and the
//! store reconnects before the next operation.

use crate::backend::CacheBackend;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use journey_core::config::RedisConfig;
use parking_lot::RwLock;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisResult};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Redis connection holder shared by every request in the process.
pub struct RedisBackend {
    client: redis::Client,
    conn: RwLock<Option<MultiplexedConnection>>,
    connect_timeout: Duration,
    command_timeout: Duration,
}

impl RedisBackend {
    /// Open a client for the first configured node. Does not connect.
    pub fn new(config: &RedisConfig) -> anyhow::Result<Self> {
        let url = config
            .urls
            .first()
            .cloned()
            .unwrap_or_else(|| "redis://localhost:6379".to_string());

        info!(url = %url, "Configuring Redis journey store");

        let client = redis::Client::open(url.as_str())?;

        Ok(Self {
            client,
            conn: RwLock::new(None),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            command_timeout: Duration::from_millis(config.command_timeout_ms),
        })
    }

    fn connection(&self) -> StoreResult<MultiplexedConnection> {
        self.conn.read().clone().ok_or(StoreError::NotConnected)
    }

    fn discard_connection(&self) {
        *self.conn.write() = None;
    }

    async fn run<T, F, Fut>(&self, op: F) -> StoreResult<T>
    where
        F: FnOnce(MultiplexedConnection) -> Fut + Send,
        Fut: Future<Output = RedisResult<T>> + Send,
    {
        let conn = self.connection()?;
        match tokio::time::timeout(self.command_timeout, op(conn)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() {
                    warn!(error = %e, "Redis connection lost");
                    self.discard_connection();
                }
                Err(e.into())
            }
            Err(_) => {
                self.discard_connection();
                Err(StoreError::Timeout(self.command_timeout))
            }
        }
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn is_open(&self) -> bool {
        self.conn.read().is_some()
    }

    async fn connect(&self) -> StoreResult<()> {
        let conn = tokio::time::timeout(
            self.connect_timeout,
            self.client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| StoreError::Timeout(self.connect_timeout))?
        .map_err(|e| StoreError::Connect(e.to_string()))?;

        *self.conn.write() = Some(conn);
        info!("Redis connection established");
        Ok(())
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.run(|mut conn| async move { conn.get::<_, Option<String>>(key).await })
            .await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> StoreResult<()> {
        self.run(|mut conn| async move { conn.set_ex::<_, _, ()>(key, value, ttl_secs).await })
            .await
    }

    async fn del(&self, key: &str) -> StoreResult<()> {
        self.run(|mut conn| async move { conn.del::<_, ()>(key).await })
            .await
    }
}
