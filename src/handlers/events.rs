use crate::commands::Data;
use crate::repository::ReminderKind;
use crate::services::mazoku::{EmbedText, Rarity, Trigger};
use crate::services::reminder::unix_now;
use serenity::all::{
    Context, CreateAllowedMentions, CreateMessage, FullEvent, GuildId, Mentionable, Message,
    MessageUpdateEvent, RoleId, UserId,
};

type Error = Box<dyn std::error::Error + Send + Sync>;

/// Main event handler for Discord events
pub async fn handle_event(ctx: &Context, event: &FullEvent, data: &Data) -> Result<(), Error> {
    match event {
        FullEvent::Message { new_message } => {
            log_mazoku_message(new_message, data);
        }
        FullEvent::MessageUpdate { event, .. } => {
            handle_message_edit(ctx, event, data).await?;
        }
        _ => {}
    }

    Ok(())
}

fn log_mazoku_message(message: &Message, data: &Data) {
    if data.config.mazoku_bot_id == 0 || message.author.id.get() != data.config.mazoku_bot_id {
        return;
    }
    if message.guild_id.map(|g| g.get()) != Some(data.config.guild_id) {
        return;
    }

    tracing::debug!(message_id = message.id.get(), content = %message.content, "Mazoku message");
    for (i, embed) in message.embeds.iter().enumerate() {
        let text = EmbedText::from(embed);
        tracing::debug!(
            index = i,
            title = %text.title,
            description = %text.description,
            footer = %text.footer,
            "Mazoku embed"
        );
    }
}

/// Mazoku edits its embeds in place when a summon is claimed or a clan spell is cast.
async fn handle_message_edit(
    ctx: &Context,
    event: &MessageUpdateEvent,
    data: &Data,
) -> Result<(), Error> {
    let Some(guild_id) = event.guild_id else {
        return Ok(());
    };
    if guild_id.get() != data.config.guild_id {
        return Ok(());
    }
    if data.triggered.contains(event.id) {
        return Ok(());
    }

    let Some(embed) = event.embeds.as_ref().and_then(|embeds| embeds.first()) else {
        return Ok(());
    };

    match EmbedText::from(embed).trigger() {
        Some(Trigger::SummonClaimed(user_id)) => {
            if !member_exists(ctx, guild_id, user_id).await {
                return Ok(());
            }
            let outcome = data
                .reminders
                .schedule(user_id, event.channel_id, ReminderKind::Summon)
                .await;
            tracing::debug!(user_id = user_id.get(), outcome = ?outcome, "Summon claim handled");
        }
        Some(Trigger::ClanCast(name)) => match find_member_by_name(ctx, guild_id, &name) {
            Some(user_id) => {
                let outcome = data
                    .reminders
                    .schedule(user_id, event.channel_id, ReminderKind::Clan)
                    .await;
                tracing::debug!(user_id = user_id.get(), outcome = ?outcome, "Clan cast handled");
            }
            None => {
                tracing::warn!(name = %name, "Clan reminder: member not found");
            }
        },
        Some(Trigger::HighTierSpawn(rarity)) => {
            announce_high_tier(ctx, event, guild_id, rarity, data).await;
        }
        None => {}
    }

    Ok(())
}

async fn member_exists(ctx: &Context, guild_id: GuildId, user_id: UserId) -> bool {
    let cached = ctx
        .cache
        .guild(guild_id)
        .is_some_and(|g| g.members.contains_key(&user_id));
    if cached {
        return true;
    }
    ctx.http.get_member(guild_id, user_id).await.is_ok()
}

/// Exact username first, then a case-insensitive display name match.
fn find_member_by_name(ctx: &Context, guild_id: GuildId, name: &str) -> Option<UserId> {
    let guild = ctx.cache.guild(guild_id)?;
    if let Some(member) = guild.member_named(name) {
        return Some(member.user.id);
    }

    let lowered = name.to_lowercase();
    guild
        .members
        .values()
        .find(|m| m.display_name().to_lowercase() == lowered)
        .map(|m| m.user.id)
}

async fn announce_high_tier(
    ctx: &Context,
    event: &MessageUpdateEvent,
    guild_id: GuildId,
    rarity: Rarity,
    data: &Data,
) {
    if data.config.high_tier_role_id == 0 {
        return;
    }

    let role = RoleId::new(data.config.high_tier_role_id);
    let role_exists = ctx
        .cache
        .guild(guild_id)
        .map(|g| g.roles.contains_key(&role))
        .unwrap_or(false);
    if !role_exists {
        return;
    }

    if !data.triggered.mark(event.id, unix_now()) {
        return;
    }

    let message = CreateMessage::new()
        .content(format!("{}\n🔥 {}", rarity.announcement(), role.mention()))
        .allowed_mentions(CreateAllowedMentions::new().roles(vec![role]));

    match event.channel_id.send_message(&ctx.http, message).await {
        Ok(_) => tracing::info!(rarity = rarity.label(), "High Tier spawn announced"),
        Err(e) => tracing::warn!(error = %e, "Failed to announce High Tier spawn"),
    }
}
