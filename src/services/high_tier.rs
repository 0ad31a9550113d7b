use parking_lot::RwLock;
use serenity::all::MessageId;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;

/// How long a pinged message is remembered.
pub const TRIGGER_RETENTION_SECS: i64 = 6 * 3600;
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Auto summon embeds get edited several times; this keeps the role ping to one per message.
#[derive(Clone, Default)]
pub struct TriggeredMessages {
    seen: Arc<RwLock<HashMap<MessageId, i64>>>,
}

impl TriggeredMessages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, message_id: MessageId) -> bool {
        self.seen.read().contains_key(&message_id)
    }

    /// Returns `true` the first time a message is seen.
    pub fn mark(&self, message_id: MessageId, now: i64) -> bool {
        let mut seen = self.seen.write();
        if seen.contains_key(&message_id) {
            return false;
        }
        seen.insert(message_id, now);
        true
    }

    pub fn prune(&self, now: i64) -> usize {
        let mut seen = self.seen.write();
        let before = seen.len();
        seen.retain(|_, at| now - *at < TRIGGER_RETENTION_SECS);
        before - seen.len()
    }

    pub fn len(&self) -> usize {
        self.seen.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.read().is_empty()
    }

    pub fn spawn_pruner(&self) -> JoinHandle<()> {
        let triggered = self.clone();

        tokio::spawn(async move {
            let mut ticker = interval(PRUNE_INTERVAL);
            loop {
                ticker.tick().await;
                let removed = triggered.prune(crate::services::reminder::unix_now());
                if removed > 0 {
                    tracing::debug!(removed, "Pruned triggered high-tier messages");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_once() {
        let triggered = TriggeredMessages::new();
        let id = MessageId::new(10);

        assert!(triggered.mark(id, 100));
        assert!(!triggered.mark(id, 200));
        assert!(triggered.contains(id));
        assert_eq!(triggered.len(), 1);
    }

    #[test]
    fn test_prune_keeps_recent() {
        let triggered = TriggeredMessages::new();
        triggered.mark(MessageId::new(1), 0);
        triggered.mark(MessageId::new(2), TRIGGER_RETENTION_SECS);

        let removed = triggered.prune(TRIGGER_RETENTION_SECS + 10);
        assert_eq!(removed, 1);
        assert!(!triggered.contains(MessageId::new(1)));
        assert!(triggered.contains(MessageId::new(2)));
    }
}
