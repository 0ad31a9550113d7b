use crate::repository::kv::KvStore;
use redis::RedisResult;
use serenity::all::{ChannelId, UserId};
use std::collections::HashMap;
use std::fmt;

/// Independent families of reminders; one user can have one of each pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, poise::ChoiceParameter)]
pub enum ReminderKind {
    #[name = "Summon"]
    Summon,
    #[name = "Clan summon"]
    Clan,
}

impl ReminderKind {
    pub const ALL: [ReminderKind; 2] = [ReminderKind::Summon, ReminderKind::Clan];

    pub fn as_str(self) -> &'static str {
        match self {
            ReminderKind::Summon => "summon",
            ReminderKind::Clan => "clan",
        }
    }
}

impl fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reminder as persisted in Redis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingReminder {
    pub user_id: UserId,
    pub kind: ReminderKind,
    pub channel_id: ChannelId,
    pub expire_at: i64,
}

impl PendingReminder {
    pub fn key(&self) -> String {
        ReminderRepository::key(self.kind, self.user_id)
    }

    pub fn remaining(&self, now: i64) -> i64 {
        self.expire_at - now
    }

    /// Rebuilds a record from a hash. Ids must be non-zero and `expire_at` present.
    fn from_hash(kind: ReminderKind, user_id: u64, hash: &HashMap<String, String>) -> Option<Self> {
        let expire_at = hash.get("expire_at")?.parse::<i64>().ok()?;
        let channel_id = hash.get("channel_id")?.parse::<u64>().ok()?;
        if user_id == 0 || channel_id == 0 {
            return None;
        }

        Some(Self {
            user_id: UserId::new(user_id),
            kind,
            channel_id: ChannelId::new(channel_id),
            expire_at,
        })
    }
}

/// Result of reading one key under a reminder prefix.
#[derive(Debug)]
pub enum StoredReminder {
    Valid(PendingReminder),
    /// Key exists but the hash is unusable; carries the raw `expire_at` if it parsed.
    Malformed { key: String, expire_at: Option<i64> },
}

pub struct ReminderRepository;

impl ReminderRepository {
    pub fn key(kind: ReminderKind, user_id: UserId) -> String {
        format!("reminder:{}:{}", kind.as_str(), user_id.get())
    }

    fn pattern(kind: ReminderKind) -> String {
        format!("reminder:{}:*", kind.as_str())
    }

    pub async fn save(store: &dyn KvStore, reminder: &PendingReminder) -> RedisResult<()> {
        store
            .hset_multiple(
                &reminder.key(),
                &[
                    ("expire_at", reminder.expire_at.to_string()),
                    ("channel_id", reminder.channel_id.get().to_string()),
                ],
            )
            .await
    }

    pub async fn delete_key(store: &dyn KvStore, key: &str) -> RedisResult<()> {
        store.del(key).await
    }

    /// Reads every record of a kind. Empty hashes (already deleted) are dropped.
    /// Only listing the keys can fail the whole kind; an unreadable key comes
    /// back as [`StoredReminder::Malformed`].
    pub async fn load_all(store: &dyn KvStore, kind: ReminderKind) -> RedisResult<Vec<StoredReminder>> {
        let keys = store.keys(&Self::pattern(kind)).await?;
        let mut records = Vec::with_capacity(keys.len());

        for key in keys {
            let hash = match store.hgetall(&key).await {
                Ok(hash) => hash,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Unreadable reminder record");
                    records.push(StoredReminder::Malformed { key, expire_at: None });
                    continue;
                }
            };
            if hash.is_empty() {
                continue;
            }

            let user_id = key
                .rsplit(':')
                .next()
                .and_then(|id| id.parse::<u64>().ok())
                .unwrap_or(0);

            match PendingReminder::from_hash(kind, user_id, &hash) {
                Some(reminder) => records.push(StoredReminder::Valid(reminder)),
                None => {
                    let expire_at = hash.get("expire_at").and_then(|v| v.parse().ok());
                    records.push(StoredReminder::Malformed { key, expire_at });
                }
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::kv::memory::MemoryStore;

    #[tokio::test]
    async fn test_save_and_load() {
        let store = MemoryStore::new();
        let reminder = PendingReminder {
            user_id: UserId::new(42),
            kind: ReminderKind::Summon,
            channel_id: ChannelId::new(7),
            expire_at: 1800,
        };

        ReminderRepository::save(store.as_ref(), &reminder).await.unwrap();
        assert!(store.contains("reminder:summon:42"));

        let hash = store.hgetall("reminder:summon:42").await.unwrap();
        assert_eq!(hash.get("expire_at").map(String::as_str), Some("1800"));
        assert_eq!(hash.get("channel_id").map(String::as_str), Some("7"));

        let records = ReminderRepository::load_all(store.as_ref(), ReminderKind::Summon)
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert!(matches!(records[0], StoredReminder::Valid(r) if r == reminder));

        let clan = ReminderRepository::load_all(store.as_ref(), ReminderKind::Clan)
            .await
            .unwrap();
        assert!(clan.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_records() {
        let store = MemoryStore::new();
        store
            .hset_multiple("reminder:clan:5", &[("expire_at", "100".to_string())])
            .await
            .unwrap();
        store
            .hset_multiple("reminder:clan:abc", &[("channel_id", "9".to_string())])
            .await
            .unwrap();

        let records = ReminderRepository::load_all(store.as_ref(), ReminderKind::Clan)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| matches!(r, StoredReminder::Malformed { .. })));
        assert!(records.iter().any(
            |r| matches!(r, StoredReminder::Malformed { key, expire_at: Some(100) } if key == "reminder:clan:5")
        ));
    }

    #[tokio::test]
    async fn test_wrong_type_key_is_malformed() {
        let store = MemoryStore::new();
        store.set("reminder:clan:9", "garbage").await.unwrap();
        store
            .hset_multiple(
                "reminder:clan:5",
                &[("expire_at", "100".to_string()), ("channel_id", "7".to_string())],
            )
            .await
            .unwrap();

        let records = ReminderRepository::load_all(store.as_ref(), ReminderKind::Clan)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().any(|r| matches!(r, StoredReminder::Valid(r) if r.user_id == UserId::new(5))));
        assert!(records.iter().any(
            |r| matches!(r, StoredReminder::Malformed { key, expire_at: None } if key == "reminder:clan:9")
        ));
    }
}
