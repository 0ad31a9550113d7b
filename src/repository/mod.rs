pub mod cooldown;
pub mod kv;
pub mod preference;
pub mod reminder;

pub use cooldown::CooldownRepository;
pub use kv::{KvStore, RedisStore, Store};
pub use preference::PreferenceRepository;
pub use reminder::{PendingReminder, ReminderKind, ReminderRepository, StoredReminder};
