use std::time::Duration;

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client as RedisClient,
    aio::{ConnectionManager, ConnectionManagerConfig},
};

use super::{CacheBackend, CacheError};

/// 基于 Redis 的缓存后端。持有一个长连接，断开后由 ConnectionManager 自动重连
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    pub async fn open(url: &str) -> Result<Self, CacheError> {
        let config = ConnectionManagerConfig::new().set_number_of_retries(1);
        let client = RedisClient::open(url)?;
        let connection = client.get_connection_manager_with_config(config).await?;
        tracing::info!("Connected to Redis cache");
        Ok(Self::new(connection))
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        // SETEX 不接受 0 秒
        let seconds = ttl.as_secs().max(1);
        let _: () = conn.set_ex(key, value, seconds).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }
}
