use crate::repository::kv::KvStore;
use crate::repository::reminder::ReminderKind;
use redis::RedisResult;
use serenity::all::{GuildId, UserId};

/// Per-user opt-out flags. A missing key means the reminder is enabled.
pub struct PreferenceRepository;

impl PreferenceRepository {
    pub fn key(guild_id: GuildId, user_id: UserId, kind: ReminderKind) -> String {
        format!(
            "reminder:settings:{}:{}:{}",
            guild_id.get(),
            user_id.get(),
            kind.as_str()
        )
    }

    pub async fn is_enabled(
        store: &dyn KvStore,
        guild_id: GuildId,
        user_id: UserId,
        kind: ReminderKind,
    ) -> RedisResult<bool> {
        let value = store.get(&Self::key(guild_id, user_id, kind)).await?;
        Ok(value.map_or(true, |v| v == "1"))
    }

    pub async fn set_enabled(
        store: &dyn KvStore,
        guild_id: GuildId,
        user_id: UserId,
        kind: ReminderKind,
        enabled: bool,
    ) -> RedisResult<()> {
        store
            .set(
                &Self::key(guild_id, user_id, kind),
                if enabled { "1" } else { "0" },
            )
            .await
    }
}
