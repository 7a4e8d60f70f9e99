use std::time::Duration;

use deadpool_redis::Pool;
use deadpool_redis::redis::AsyncCommands;

use crate::domain::cache::{Cache, CacheError};

/// [`Cache`] backed by a pooled Redis connection.
#[derive(Clone)]
pub struct RedisCache {
    pub pool: Pool,
}

impl RedisCache {
    pub fn connect(url: &str) -> anyhow::Result<Self> {
        let pool = deadpool_redis::Config::from_url(url)
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))?;
        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| CacheError(e.into()))?;
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e: deadpool_redis::redis::RedisError| CacheError(e.into()))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| CacheError(e.into()))?;
        let (): () = conn
            .set_ex(key, value, ttl.as_secs().max(1))
            .await
            .map_err(|e: deadpool_redis::redis::RedisError| CacheError(e.into()))?;
        Ok(())
    }
}
