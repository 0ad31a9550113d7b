use dotenvy::dotenv;
use lilac::commands::{Data, admin, high_tier, reminder};
use lilac::config::Config;
use lilac::error::BotError;
use lilac::handlers::{handle_event, on_error};
use lilac::repository::{RedisStore, Store};
use lilac::services::{DiscordTransport, ReminderService, ReminderSettings, TriggeredMessages};
use once_cell::sync::OnceCell;
use poise::serenity_prelude::{GuildId, UserId};
use serenity::all::{ActivityData, GatewayIntents, OnlineStatus};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), BotError> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "lilac=info,serenity=warn".into()),
        )
        .init();

    tracing::info!("Starting Lilac bot...");

    let config = Config::from_env()?;

    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS;

    let mut owners = HashSet::new();
    if config.client_id != 0 {
        owners.insert(UserId::new(config.client_id));
    }

    // Without Redis reminders still fire, but nothing survives a restart.
    let store: Option<Store> = match &config.redis_url {
        Some(url) => match RedisStore::connect(url).await {
            Ok(store) => Some(Arc::new(store) as Store),
            Err(e) => {
                tracing::warn!(error = %e, "Redis unavailable, reminders are in-memory only");
                None
            }
        },
        None => {
            tracing::warn!("REDIS_URL not set, reminders are in-memory only");
            None
        }
    };

    let guild_id = GuildId::new(config.guild_id);
    let settings = ReminderSettings {
        guild_id,
        summon_delay: Duration::from_secs(config.summon_cooldown_secs),
        clan_delay: Duration::from_secs(config.clan_cooldown_secs),
        sweep_interval: config.cleanup_interval(),
    };

    let reminders_cell: Arc<OnceCell<ReminderService>> = Arc::new(OnceCell::new());
    let reminders_for_setup = reminders_cell.clone();
    let config_for_setup = config.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                reminder::reminder(),
                reminder::reminder_status(),
                high_tier::high_tier(),
                high_tier::high_tier_remove(),
                admin::sync(),
            ],
            owners,
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, _framework, data| {
                Box::pin(handle_event(ctx, event, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                tracing::info!(user = %ready.user.name, "Logged in");

                poise::builtins::register_in_guild(ctx, &framework.options().commands, guild_id)
                    .await?;
                tracing::info!(guild_id = guild_id.get(), "Slash commands registered");

                let transport = DiscordTransport::new(ctx.cache.clone(), ctx.http.clone());
                let reminders = ReminderService::new(store.clone(), Arc::new(transport), settings);

                let report = reminders.restore_all().await;
                tracing::info!(
                    restored = report.restored,
                    expired = report.expired,
                    skipped = report.skipped,
                    "Reminders restored"
                );

                reminders.spawn_sweeper();
                let _ = reminders_for_setup.set(reminders.clone());

                let triggered = TriggeredMessages::new();
                triggered.spawn_pruner();

                Ok(Data {
                    config: config_for_setup,
                    store,
                    reminders,
                    triggered,
                })
            })
        })
        .build();

    let mut client = serenity::Client::builder(&config.token, intents)
        .framework(framework)
        .await
        .map_err(|e| BotError::Client(format!("Failed to create client: {}", e)))?;

    let shard_manager = client.shard_manager.clone();

    // Status rotation
    let status_manager = shard_manager.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        let activities = [
            ActivityData::watching("Lilac 🌸"),
            ActivityData::playing("Silksong 🪡"),
            ActivityData::listening("K-Pop 🎵"),
        ];
        let mut idx = 0;
        loop {
            interval.tick().await;
            let runners = status_manager.runners.lock().await;
            for (_, runner) in runners.iter() {
                runner
                    .runner_tx
                    .set_presence(Some(activities[idx].clone()), OnlineStatus::Online);
            }
            idx = (idx + 1) % activities.len();
        }
    });

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            tracing::info!("Heartbeat: bot alive");
        }
    });

    tokio::select! {
        result = client.start() => {
            result.map_err(|e| BotError::Client(format!("Client stopped: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping gracefully...");
            if let Some(reminders) = reminders_cell.get() {
                reminders.shutdown();
            }
            shard_manager.shutdown_all().await;
        }
    }

    tracing::info!("Lilac bot stopped.");
    Ok(())
}
