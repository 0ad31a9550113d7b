use crate::error::DeliveryError;
use async_trait::async_trait;
use serenity::all::{
    Cache, Channel, ChannelId, CreateAllowedMentions, CreateMessage, GuildId, Http, UserId,
};
use std::sync::Arc;

/// Where reminders are resolved and sent. Lookups return `None` when the
/// member left or the channel was deleted.
#[async_trait]
pub trait ReminderTransport: Send + Sync {
    /// Display name of the member, if they are still in the guild.
    async fn resolve_member(&self, guild_id: GuildId, user_id: UserId) -> Option<String>;

    /// Name of the channel, if it still exists in the guild.
    async fn resolve_channel(&self, guild_id: GuildId, channel_id: ChannelId) -> Option<String>;

    async fn deliver(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
        content: String,
    ) -> Result<(), DeliveryError>;
}

#[derive(Clone)]
pub struct DiscordTransport {
    cache: Arc<Cache>,
    http: Arc<Http>,
}

impl DiscordTransport {
    pub fn new(cache: Arc<Cache>, http: Arc<Http>) -> Self {
        Self { cache, http }
    }
}

#[async_trait]
impl ReminderTransport for DiscordTransport {
    async fn resolve_member(&self, guild_id: GuildId, user_id: UserId) -> Option<String> {
        let cached = self
            .cache
            .guild(guild_id)
            .and_then(|g| g.members.get(&user_id).map(|m| m.display_name().to_string()));
        if cached.is_some() {
            return cached;
        }

        self.http
            .get_member(guild_id, user_id)
            .await
            .ok()
            .map(|m| m.display_name().to_string())
    }

    async fn resolve_channel(&self, guild_id: GuildId, channel_id: ChannelId) -> Option<String> {
        let cached = self
            .cache
            .guild(guild_id)
            .and_then(|g| g.channels.get(&channel_id).map(|c| c.name.clone()));
        if cached.is_some() {
            return cached;
        }

        match self.http.get_channel(channel_id).await {
            Ok(Channel::Guild(channel)) if channel.guild_id == guild_id => Some(channel.name),
            _ => None,
        }
    }

    async fn deliver(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
        content: String,
    ) -> Result<(), DeliveryError> {
        let message = CreateMessage::new()
            .content(content)
            .allowed_mentions(CreateAllowedMentions::new().users(vec![user_id]));

        channel_id.send_message(&self.http, message).await?;
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashSet;

    /// Resolves everyone unless told otherwise and records what it sends.
    #[derive(Default)]
    pub struct FakeTransport {
        missing_members: Mutex<HashSet<UserId>>,
        missing_channels: Mutex<HashSet<ChannelId>>,
        forbidden: Mutex<bool>,
        panicking: Mutex<bool>,
        attempts: Mutex<usize>,
        sent: Mutex<Vec<(ChannelId, UserId, String)>>,
    }

    impl FakeTransport {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn forget_member(&self, user_id: UserId) {
            self.missing_members.lock().insert(user_id);
        }

        pub fn forget_channel(&self, channel_id: ChannelId) {
            self.missing_channels.lock().insert(channel_id);
        }

        pub fn fail_with_forbidden(&self) {
            *self.forbidden.lock() = true;
        }

        pub fn panic_on_deliver(&self) {
            *self.panicking.lock() = true;
        }

        pub fn attempts(&self) -> usize {
            *self.attempts.lock()
        }

        pub fn sent(&self) -> Vec<(ChannelId, UserId, String)> {
            self.sent.lock().clone()
        }
    }

    #[async_trait]
    impl ReminderTransport for FakeTransport {
        async fn resolve_member(&self, _guild_id: GuildId, user_id: UserId) -> Option<String> {
            if self.missing_members.lock().contains(&user_id) {
                return None;
            }
            Some(format!("member-{}", user_id.get()))
        }

        async fn resolve_channel(&self, _guild_id: GuildId, channel_id: ChannelId) -> Option<String> {
            if self.missing_channels.lock().contains(&channel_id) {
                return None;
            }
            Some(format!("channel-{}", channel_id.get()))
        }

        async fn deliver(
            &self,
            channel_id: ChannelId,
            user_id: UserId,
            content: String,
        ) -> Result<(), DeliveryError> {
            *self.attempts.lock() += 1;
            if *self.panicking.lock() {
                panic!("transport exploded");
            }
            if *self.forbidden.lock() {
                return Err(DeliveryError::Forbidden);
            }
            self.sent.lock().push((channel_id, user_id, content));
            Ok(())
        }
    }
}
