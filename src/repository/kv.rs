use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult};
use std::collections::HashMap;
use std::sync::Arc;

pub type Store = Arc<dyn KvStore>;

/// The small slice of Redis the bot relies on.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> RedisResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> RedisResult<()>;

    async fn del(&self, key: &str) -> RedisResult<()>;

    async fn hset_multiple(&self, key: &str, fields: &[(&str, String)]) -> RedisResult<()>;

    async fn hgetall(&self, key: &str) -> RedisResult<HashMap<String, String>>;

    /// Keys matching a glob pattern such as `reminder:summon:*`.
    async fn keys(&self, pattern: &str) -> RedisResult<Vec<String>>;
}

#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> RedisResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let manager = ConnectionManager::new(client).await?;

        tracing::info!("Connected to Redis");
        Ok(Self { manager })
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> RedisResult<Option<String>> {
        let mut conn = self.manager.clone();
        conn.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> RedisResult<()> {
        let mut conn = self.manager.clone();
        conn.set(key, value).await
    }

    async fn del(&self, key: &str) -> RedisResult<()> {
        let mut conn = self.manager.clone();
        conn.del(key).await
    }

    async fn hset_multiple(&self, key: &str, fields: &[(&str, String)]) -> RedisResult<()> {
        let mut conn = self.manager.clone();
        conn.hset_multiple(key, fields).await
    }

    async fn hgetall(&self, key: &str) -> RedisResult<HashMap<String, String>> {
        let mut conn = self.manager.clone();
        conn.hgetall(key).await
    }

    async fn keys(&self, pattern: &str) -> RedisResult<Vec<String>> {
        let mut conn = self.manager.clone();
        redis::cmd("KEYS").arg(pattern).query_async(&mut conn).await
    }
}
