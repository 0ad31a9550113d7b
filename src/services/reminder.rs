//! Delayed per-user reminders that survive restarts.
//!
//! Every armed reminder lives in two places: a slot in [`ReminderService`]'s
//! in-memory table (owning the tokio task that waits) and a Redis hash under
//! `reminder:<kind>:<user_id>`. The table guarantees at most one pending
//! reminder per `(user, kind)`; the hash lets [`ReminderService::restore_all`]
//! re-arm waits after a restart. [`ReminderService::sweep_once`] deletes
//! hashes whose deadline passed without a task cleaning them up.

use crate::error::{BotError, DeliveryError};
use crate::repository::{
    PendingReminder, PreferenceRepository, ReminderKind, ReminderRepository, Store, StoredReminder,
};
use crate::services::transport::ReminderTransport;
use futures_util::FutureExt;
use parking_lot::Mutex;
use serenity::all::{ChannelId, GuildId, Mentionable, UserId};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{MissedTickBehavior, interval};

type SlotKey = (UserId, ReminderKind);

#[derive(Debug, Clone)]
pub struct ReminderSettings {
    pub guild_id: GuildId,
    pub summon_delay: Duration,
    pub clan_delay: Duration,
    pub sweep_interval: Duration,
}

impl ReminderSettings {
    pub fn delay(&self, kind: ReminderKind) -> Duration {
        match kind {
            ReminderKind::Summon => self.summon_delay,
            ReminderKind::Clan => self.clan_delay,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Started { expire_at: i64 },
    AlreadyActive,
    Disabled,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: usize,
    pub expired: usize,
    pub skipped: usize,
}

struct Slot {
    id: u64,
    expire_at: i64,
    handle: Option<AbortHandle>,
}

struct Inner {
    store: Option<Store>,
    transport: Arc<dyn ReminderTransport>,
    settings: ReminderSettings,
    active: Mutex<HashMap<SlotKey, Slot>>,
    next_id: AtomicU64,
}

#[derive(Clone)]
pub struct ReminderService {
    inner: Arc<Inner>,
}

/// Frees the in-memory slot when the waiting task ends, however it ends.
struct SlotGuard {
    inner: Arc<Inner>,
    key: SlotKey,
    id: u64,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        let mut active = self.inner.active.lock();
        if active.get(&self.key).is_some_and(|slot| slot.id == self.id) {
            active.remove(&self.key);
        }
    }
}

pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

impl ReminderService {
    pub fn new(
        store: Option<Store>,
        transport: Arc<dyn ReminderTransport>,
        settings: ReminderSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                transport,
                settings,
                active: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn has_store(&self) -> bool {
        self.inner.store.is_some()
    }

    /// Schedules a reminder using the configured delay for `kind`.
    pub async fn schedule(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
        kind: ReminderKind,
    ) -> ScheduleOutcome {
        let delay = self.inner.settings.delay(kind);
        self.schedule_in(user_id, channel_id, kind, delay).await
    }

    pub async fn schedule_in(
        &self,
        user_id: UserId,
        channel_id: ChannelId,
        kind: ReminderKind,
        delay: Duration,
    ) -> ScheduleOutcome {
        if !self.is_enabled(user_id, kind).await {
            return ScheduleOutcome::Disabled;
        }

        let expire_at = unix_now() + delay.as_secs() as i64;
        let reminder = PendingReminder {
            user_id,
            kind,
            channel_id,
            expire_at,
        };

        let Some(id) = self.reserve(&reminder) else {
            return ScheduleOutcome::AlreadyActive;
        };

        if let Some(store) = &self.inner.store {
            if let Err(e) = ReminderRepository::save(store.as_ref(), &reminder).await {
                tracing::warn!(
                    user_id = user_id.get(),
                    kind = %kind,
                    error = %e,
                    "Failed to persist reminder, it will not survive a restart"
                );
            }
        }

        self.arm(id, reminder, delay);

        tracing::info!(
            user_id = user_id.get(),
            channel_id = channel_id.get(),
            kind = %kind,
            delay_secs = delay.as_secs(),
            "Reminder started"
        );

        ScheduleOutcome::Started { expire_at }
    }

    /// Re-arms persisted reminders after a restart. Records whose deadline passed
    /// while the bot was down are deleted without firing.
    pub async fn restore_all(&self) -> RestoreReport {
        let mut report = RestoreReport::default();
        let Some(store) = &self.inner.store else {
            return report;
        };

        let guild_id = self.inner.settings.guild_id;
        let now = unix_now();

        for kind in ReminderKind::ALL {
            let records = match ReminderRepository::load_all(store.as_ref(), kind).await {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(kind = %kind, error = %e, "Failed to load reminders for restore");
                    continue;
                }
            };

            for record in records {
                let reminder = match record {
                    StoredReminder::Valid(reminder) => reminder,
                    StoredReminder::Malformed { key, .. } => {
                        tracing::warn!(key = %key, "Skipping malformed reminder record");
                        report.skipped += 1;
                        continue;
                    }
                };

                let remaining = reminder.remaining(now);
                if remaining <= 0 {
                    if let Err(e) = ReminderRepository::delete_key(store.as_ref(), &reminder.key()).await {
                        tracing::warn!(key = %reminder.key(), error = %e, "Failed to delete expired reminder");
                    }
                    report.expired += 1;
                    continue;
                }

                // Left in place for the sweep if the member or channel is gone.
                let transport = &self.inner.transport;
                if transport.resolve_member(guild_id, reminder.user_id).await.is_none()
                    || transport
                        .resolve_channel(guild_id, reminder.channel_id)
                        .await
                        .is_none()
                {
                    report.skipped += 1;
                    continue;
                }

                let Some(id) = self.reserve(&reminder) else {
                    report.skipped += 1;
                    continue;
                };

                self.arm(id, reminder, Duration::from_secs(remaining as u64));
                report.restored += 1;

                tracing::info!(
                    user_id = reminder.user_id.get(),
                    kind = %kind,
                    remaining_secs = remaining,
                    "Restored reminder"
                );
            }
        }

        report
    }

    /// Deletes persisted records whose deadline has passed. Returns how many were removed.
    pub async fn sweep_once(&self) -> usize {
        let Some(store) = &self.inner.store else {
            return 0;
        };

        let now = unix_now();
        let mut removed = 0;

        for kind in ReminderKind::ALL {
            let records = match ReminderRepository::load_all(store.as_ref(), kind).await {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(kind = %kind, error = %e, "Reminder sweep could not list records");
                    continue;
                }
            };

            for record in records {
                let (key, expire_at) = match record {
                    StoredReminder::Valid(reminder) => (reminder.key(), reminder.expire_at),
                    StoredReminder::Malformed {
                        key,
                        expire_at: Some(expire_at),
                    } if expire_at != 0 => (key, expire_at),
                    StoredReminder::Malformed { .. } => continue,
                };

                if expire_at > now {
                    continue;
                }

                match ReminderRepository::delete_key(store.as_ref(), &key).await {
                    Ok(()) => removed += 1,
                    Err(e) => tracing::warn!(key = %key, error = %e, "Failed to delete stale reminder"),
                }
            }
        }

        if removed > 0 {
            tracing::info!(removed, "Reminder sweep removed stale records");
        }

        removed
    }

    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let service = self.clone();
        let period = self.inner.settings.sweep_interval;

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                service.sweep_once().await;
            }
        })
    }

    pub async fn is_enabled(&self, user_id: UserId, kind: ReminderKind) -> bool {
        let Some(store) = &self.inner.store else {
            return true;
        };

        match PreferenceRepository::is_enabled(store.as_ref(), self.inner.settings.guild_id, user_id, kind)
            .await
        {
            Ok(enabled) => enabled,
            Err(e) => {
                tracing::warn!(user_id = user_id.get(), kind = %kind, error = %e, "Preference lookup failed");
                true
            }
        }
    }

    /// Pending reminders never change when a preference is toggled; the flag is
    /// read again when they fire.
    pub async fn set_enabled(
        &self,
        user_id: UserId,
        kind: ReminderKind,
        enabled: bool,
    ) -> Result<(), BotError> {
        let store = self.inner.store.as_ref().ok_or_else(|| {
            BotError::Config("Redis is not configured, reminders are always enabled".to_string())
        })?;

        PreferenceRepository::set_enabled(
            store.as_ref(),
            self.inner.settings.guild_id,
            user_id,
            kind,
            enabled,
        )
        .await?;

        Ok(())
    }

    pub fn is_active(&self, user_id: UserId, kind: ReminderKind) -> bool {
        self.inner.active.lock().contains_key(&(user_id, kind))
    }

    pub fn pending_for(&self, user_id: UserId) -> Vec<(ReminderKind, i64)> {
        let active = self.inner.active.lock();
        ReminderKind::ALL
            .into_iter()
            .filter_map(|kind| active.get(&(user_id, kind)).map(|slot| (kind, slot.expire_at)))
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.inner.active.lock().len()
    }

    /// Aborts every waiting task. Persisted records stay for the next restore.
    pub fn shutdown(&self) {
        let drained: Vec<Slot> = self.inner.active.lock().drain().map(|(_, slot)| slot).collect();

        for slot in drained {
            if let Some(handle) = slot.handle {
                handle.abort();
            }
        }
    }

    fn reserve(&self, reminder: &PendingReminder) -> Option<u64> {
        let mut active = self.inner.active.lock();
        let key = (reminder.user_id, reminder.kind);
        if active.contains_key(&key) {
            return None;
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        active.insert(
            key,
            Slot {
                id,
                expire_at: reminder.expire_at,
                handle: None,
            },
        );
        Some(id)
    }

    fn arm(&self, id: u64, reminder: PendingReminder, delay: Duration) {
        let service = self.clone();
        let guard = SlotGuard {
            inner: self.inner.clone(),
            key: (reminder.user_id, reminder.kind),
            id,
        };

        let handle = tokio::spawn(async move {
            service.wait_and_fire(guard, reminder, delay).await;
        })
        .abort_handle();

        let orphaned = {
            let mut active = self.inner.active.lock();
            match active.get_mut(&(reminder.user_id, reminder.kind)) {
                Some(slot) if slot.id == id => {
                    slot.handle = Some(handle.clone());
                    false
                }
                _ => true,
            }
        };

        // Slot vanished before the handle landed: either the task already
        // finished or shutdown drained the table.
        if orphaned {
            handle.abort();
        }
    }

    async fn wait_and_fire(&self, guard: SlotGuard, reminder: PendingReminder, delay: Duration) {
        tokio::time::sleep(delay).await;

        if AssertUnwindSafe(self.fire(&reminder)).catch_unwind().await.is_err() {
            tracing::error!(key = %reminder.key(), "Reminder delivery panicked");
        }

        // The record goes before the slot so a reminder started in between
        // is never deleted by this task.
        if let Some(store) = &self.inner.store {
            if let Err(e) = ReminderRepository::delete_key(store.as_ref(), &reminder.key()).await {
                tracing::warn!(key = %reminder.key(), error = %e, "Failed to delete fired reminder");
            }
        }

        drop(guard);
    }

    async fn fire(&self, reminder: &PendingReminder) {
        if !self.is_enabled(reminder.user_id, reminder.kind).await {
            tracing::debug!(user_id = reminder.user_id.get(), kind = %reminder.kind, "Reminder disabled, not sending");
            return;
        }

        let guild_id = self.inner.settings.guild_id;
        let transport = &self.inner.transport;

        let Some(member) = transport.resolve_member(guild_id, reminder.user_id).await else {
            tracing::debug!(user_id = reminder.user_id.get(), "Reminder target left, not sending");
            return;
        };
        let Some(channel) = transport.resolve_channel(guild_id, reminder.channel_id).await else {
            tracing::debug!(channel_id = reminder.channel_id.get(), "Reminder channel gone, not sending");
            return;
        };

        let content = render(reminder.kind, reminder.user_id);
        match transport.deliver(reminder.channel_id, reminder.user_id, content).await {
            Ok(()) => tracing::info!(member = %member, channel = %channel, kind = %reminder.kind, "Reminder sent"),
            Err(DeliveryError::Forbidden) => {
                tracing::warn!(channel = %channel, kind = %reminder.kind, "Cannot send reminder, missing permissions")
            }
            Err(e) => tracing::warn!(channel = %channel, kind = %reminder.kind, error = %e, "Reminder delivery failed"),
        }
    }
}

pub fn render(kind: ReminderKind, user_id: UserId) -> String {
    match kind {
        ReminderKind::Summon => format!("⏱️ Hey {}, your `/summon` is available!", user_id.mention()),
        ReminderKind::Clan => format!(
            "⚔️ Hey {}, your clan summon spell is ready to cast! Choose wisely.",
            user_id.mention()
        ),
    }
}
