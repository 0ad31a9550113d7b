use crate::repository::CooldownRepository;
use crate::services::reminder::unix_now;
use crate::utils::embed;
use poise::serenity_prelude::{Mentionable, RoleId};

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, super::Data, Error>;

const COOLDOWN_NAME: &str = "high-tier";

/// Get the High Tier role to be notified of rare spawns
#[poise::command(slash_command, guild_only, rename = "high-tier")]
pub async fn high_tier(ctx: Context<'_>) -> Result<(), Error> {
    if !cooldown_passed(ctx).await? {
        return Ok(());
    }

    let config = &ctx.data().config;
    let guild_id = ctx.guild_id().ok_or("Must be used in a guild")?;
    let member = ctx
        .author_member()
        .await
        .ok_or("Could not load your member profile")?
        .into_owned();

    if config.required_role_id != 0 {
        let required = RoleId::new(config.required_role_id);
        if role_exists(ctx, required) && !member.roles.contains(&required) {
            return reply(
                ctx,
                embed::warning(
                    "High Tier",
                    &format!("Oops, only {} have access to this feature.", required.mention()),
                ),
            )
            .await;
        }
    }

    let Some(role) = high_tier_role(ctx) else {
        return reply(ctx, embed::error("High Tier", "High Tier role not found.")).await;
    };

    if member.roles.contains(&role) {
        return reply(ctx, embed::info("High Tier", "You already have the High Tier role.")).await;
    }

    match ctx
        .http()
        .add_member_role(
            guild_id,
            member.user.id,
            role,
            Some("User opted in for High Tier notifications"),
        )
        .await
    {
        Ok(()) => {
            tracing::info!(user_id = member.user.id.get(), "High Tier role granted");
            reply(
                ctx,
                embed::success(
                    "High Tier",
                    &format!("You just got the {}. You will be notified now.", role.mention()),
                ),
            )
            .await
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to add High Tier role");
            reply(ctx, embed::error("High Tier", "Missing permissions to assign the role.")).await
        }
    }
}

/// Remove the High Tier role and stop notifications
#[poise::command(slash_command, guild_only, rename = "high-tier-remove")]
pub async fn high_tier_remove(ctx: Context<'_>) -> Result<(), Error> {
    if !cooldown_passed(ctx).await? {
        return Ok(());
    }

    let guild_id = ctx.guild_id().ok_or("Must be used in a guild")?;
    let Some(role) = high_tier_role(ctx) else {
        return reply(ctx, embed::error("High Tier", "High Tier role not found.")).await;
    };

    let member = ctx
        .author_member()
        .await
        .ok_or("Could not load your member profile")?
        .into_owned();

    if !member.roles.contains(&role) {
        return reply(ctx, embed::info("High Tier", "You don't have the High Tier role.")).await;
    }

    match ctx
        .http()
        .remove_member_role(
            guild_id,
            member.user.id,
            role,
            Some("User opted out of High Tier notifications"),
        )
        .await
    {
        Ok(()) => {
            tracing::info!(user_id = member.user.id.get(), "High Tier role removed");
            reply(
                ctx,
                embed::success(
                    "High Tier",
                    &format!(
                        "The {} has been removed. You will no longer be notified.",
                        role.mention()
                    ),
                ),
            )
            .await
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to remove High Tier role");
            reply(ctx, embed::error("High Tier", "Missing permissions to remove the role.")).await
        }
    }
}

/// Replies with the wait time and returns `false` while the user is on cooldown.
async fn cooldown_passed(ctx: Context<'_>) -> Result<bool, Error> {
    let data = ctx.data();
    let Some(store) = &data.store else {
        return Ok(true);
    };

    let remaining = match CooldownRepository::check_and_touch(
        store.as_ref(),
        COOLDOWN_NAME,
        ctx.author().id,
        data.config.high_tier_cooldown_secs,
        unix_now(),
    )
    .await
    {
        Ok(remaining) => remaining,
        Err(e) => {
            tracing::warn!(error = %e, "High Tier cooldown lookup failed");
            0
        }
    };

    if remaining > 0 {
        reply(
            ctx,
            embed::warning(
                "Cooldown",
                &format!("⏳ You must wait {}s before using this command again.", remaining),
            ),
        )
        .await?;
        return Ok(false);
    }

    Ok(true)
}

fn high_tier_role(ctx: Context<'_>) -> Option<RoleId> {
    let id = ctx.data().config.high_tier_role_id;
    if id == 0 {
        return None;
    }
    let role = RoleId::new(id);
    role_exists(ctx, role).then_some(role)
}

fn role_exists(ctx: Context<'_>, role: RoleId) -> bool {
    ctx.guild()
        .map(|guild| guild.roles.contains_key(&role))
        .unwrap_or(false)
}

async fn reply(ctx: Context<'_>, embed: poise::serenity_prelude::CreateEmbed) -> Result<(), Error> {
    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}
