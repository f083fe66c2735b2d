// 缓存模块
// 缓存只是加速手段：读失败按未命中处理，写失败记录日志后继续

pub mod keys;
pub mod memory;
pub mod redis_backend;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

pub use keys::USERS_LIST_KEY;
pub use memory::MemoryCache;
pub use redis_backend::RedisCache;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(#[from] redis::RedisError),
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out")]
    Timeout,
}

/// 远程缓存的最小接口：字符串键，值由调用方负责序列化
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

/// 在后端之上加超时并吸收所有错误，调用方永远看不到缓存故障
#[derive(Clone)]
pub struct CacheLayer {
    backend: Arc<dyn CacheBackend>,
    op_timeout: Duration,
    failed_invalidations: Arc<AtomicU64>,
}

impl CacheLayer {
    pub fn new(backend: Arc<dyn CacheBackend>, op_timeout: Duration) -> Self {
        Self {
            backend,
            op_timeout,
            failed_invalidations: Arc::new(AtomicU64::new(0)),
        }
    }

    async fn run<T, F>(&self, fut: F) -> Result<T, CacheError>
    where
        F: std::future::Future<Output = Result<T, CacheError>>,
    {
        match timeout(self.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout),
        }
    }

    /// 未设置、已过期、不可达都返回 None
    pub async fn get(&self, key: &str) -> Option<String> {
        match self.run(self.backend.get(key)).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Cache read for {} failed, treating as miss: {}", key, e);
                None
            }
        }
    }

    pub async fn set(&self, key: &str, value: &str, ttl: Duration) {
        if let Err(e) = self.run(self.backend.set(key, value, ttl)).await {
            tracing::warn!("Cache population for {} failed: {}", key, e);
        }
    }

    /// 失效失败不会中断请求，但会记入计数器并以 error 级别上报，
    /// 因为它与较长的 TTL 叠加时会让旧数据存活到过期为止
    pub async fn delete(&self, key: &str) -> bool {
        match self.run(self.backend.delete(key)).await {
            Ok(()) => true,
            Err(e) => {
                self.failed_invalidations.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    target: "cache_invalidation",
                    key,
                    "Failed to invalidate cache key, stale data may be served until expiry: {}",
                    e
                );
                false
            }
        }
    }

    pub fn failed_invalidations(&self) -> u64 {
        self.failed_invalidations.load(Ordering::Relaxed)
    }
}
