pub mod high_tier;
pub mod mazoku;
pub mod reminder;
pub mod transport;

pub use high_tier::TriggeredMessages;
pub use reminder::{ReminderService, ReminderSettings, ScheduleOutcome};
pub use transport::{DiscordTransport, ReminderTransport};
