use crate::repository::ReminderKind;
use crate::utils::embed;

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, super::Data, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum ToggleState {
    #[name = "On"]
    On,
    #[name = "Off"]
    Off,
}

/// Enable or disable your summon reminders
#[poise::command(slash_command, guild_only)]
pub async fn reminder(
    ctx: Context<'_>,
    #[description = "Turn the reminder on or off"] state: ToggleState,
    #[description = "Which reminder (default: summon)"] kind: Option<ReminderKind>,
) -> Result<(), Error> {
    let kind = kind.unwrap_or(ReminderKind::Summon);
    let reminders = &ctx.data().reminders;

    if !reminders.has_store() {
        let reply = embed::warning(
            "Reminders",
            "Redis is not configured, reminders are always enabled.",
        );
        ctx.send(poise::CreateReply::default().embed(reply).ephemeral(true))
            .await?;
        return Ok(());
    }

    let enabled = state == ToggleState::On;
    reminders.set_enabled(ctx.author().id, kind, enabled).await?;

    tracing::info!(
        user_id = ctx.author().id.get(),
        kind = %kind,
        enabled,
        "Reminder preference updated"
    );

    let reply = if enabled {
        embed::success("Reminders", &format!("{} reminders enabled.", kind_label(kind)))
    } else {
        embed::info("Reminders", &format!("⏸️ {} reminders disabled.", kind_label(kind)))
    };
    ctx.send(poise::CreateReply::default().embed(reply).ephemeral(true))
        .await?;
    Ok(())
}

/// Show your pending reminders
#[poise::command(slash_command, guild_only, rename = "reminder-status")]
pub async fn reminder_status(ctx: Context<'_>) -> Result<(), Error> {
    let user_id = ctx.author().id;
    let reminders = &ctx.data().reminders;

    let mut lines = Vec::new();
    for kind in ReminderKind::ALL {
        let enabled = reminders.is_enabled(user_id, kind).await;
        let pending = reminders
            .pending_for(user_id)
            .into_iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, expire_at)| format!("ready <t:{}:R>", expire_at))
            .unwrap_or_else(|| "nothing pending".to_string());

        lines.push(format!(
            "**{}** ({}) - {}",
            kind_label(kind),
            if enabled { "on" } else { "off" },
            pending
        ));
    }

    let reply = embed::info("⏰ Your reminders", &lines.join("\n"));
    ctx.send(poise::CreateReply::default().embed(reply).ephemeral(true))
        .await?;
    Ok(())
}

fn kind_label(kind: ReminderKind) -> &'static str {
    match kind {
        ReminderKind::Summon => "Summon",
        ReminderKind::Clan => "Clan summon",
    }
}
