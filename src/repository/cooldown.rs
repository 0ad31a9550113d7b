use crate::repository::kv::KvStore;
use redis::RedisResult;
use serenity::all::UserId;

/// Per-user command cooldowns stored as the unix time of the last accepted use.
pub struct CooldownRepository;

impl CooldownRepository {
    pub fn key(name: &str, user_id: UserId) -> String {
        format!("cooldown:{}:{}", name, user_id.get())
    }

    /// Returns the seconds left on the cooldown, or 0 after recording `now` as the new use.
    pub async fn check_and_touch(
        store: &dyn KvStore,
        name: &str,
        user_id: UserId,
        cooldown_secs: i64,
        now: i64,
    ) -> RedisResult<i64> {
        let key = Self::key(name, user_id);

        if let Some(last) = store.get(&key).await?.and_then(|v| v.parse::<i64>().ok()) {
            let elapsed = now - last;
            if elapsed < cooldown_secs {
                return Ok(cooldown_secs - elapsed);
            }
        }

        store.set(&key, &now.to_string()).await?;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::kv::memory::MemoryStore;

    #[tokio::test]
    async fn test_cooldown_window() {
        let store = MemoryStore::new();
        let user = UserId::new(42);

        let first = CooldownRepository::check_and_touch(store.as_ref(), "high-tier", user, 300, 1_000)
            .await
            .unwrap();
        assert_eq!(first, 0);
        assert!(store.contains("cooldown:high-tier:42"));

        let blocked = CooldownRepository::check_and_touch(store.as_ref(), "high-tier", user, 300, 1_100)
            .await
            .unwrap();
        assert_eq!(blocked, 200);

        // A blocked attempt does not extend the window.
        let after = CooldownRepository::check_and_touch(store.as_ref(), "high-tier", user, 300, 1_300)
            .await
            .unwrap();
        assert_eq!(after, 0);
    }
}
