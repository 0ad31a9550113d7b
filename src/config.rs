use crate::error::BotError;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub token: String,
    pub client_id: u64,
    pub redis_url: Option<String>,
    pub guild_id: u64,
    pub mazoku_bot_id: u64,
    pub summon_cooldown_secs: u64,
    pub clan_cooldown_secs: u64,
    pub cleanup_interval_mins: u64,
    pub high_tier_role_id: u64,
    pub required_role_id: u64,
    pub high_tier_cooldown_secs: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, BotError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BotError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("TOKEN")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| BotError::Config("TOKEN not configured".to_string()))?;

        let guild_id = parse_or(&lookup, "GUILD_ID", 0)?;
        if guild_id == 0 {
            return Err(BotError::Config("GUILD_ID not configured".to_string()));
        }

        let summon_cooldown_secs = parse_or(&lookup, "COOLDOWN_SECONDS", 1800)?;

        Ok(Self {
            token,
            client_id: parse_or(&lookup, "CLIENT_ID", 0)?,
            redis_url: lookup("REDIS_URL").filter(|u| !u.is_empty()),
            guild_id,
            mazoku_bot_id: parse_or(&lookup, "MAZOKU_BOT_ID", 0)?,
            summon_cooldown_secs,
            clan_cooldown_secs: parse_or(&lookup, "CLAN_COOLDOWN_SECONDS", summon_cooldown_secs)?,
            cleanup_interval_mins: parse_or(&lookup, "REMINDER_CLEANUP_MINUTES", 10)?,
            high_tier_role_id: parse_or(&lookup, "HIGH_TIER_ROLE_ID", 0)?,
            required_role_id: parse_or(&lookup, "REQUIRED_ROLE_ID", 0)?,
            high_tier_cooldown_secs: parse_or(&lookup, "HIGH_TIER_COOLDOWN", 300)?,
        })
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_mins.max(1) * 60)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, BotError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| BotError::Config(format!("{} must be a valid number, got '{}'", key, raw))),
        _ => Ok(default),
    }
}
