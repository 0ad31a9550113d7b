pub mod admin;
pub mod high_tier;
pub mod reminder;

use crate::config::Config;
use crate::repository::Store;
use crate::services::{ReminderService, TriggeredMessages};

#[derive(Clone)]
pub struct Data {
    pub config: Config,
    pub store: Option<Store>,
    pub reminders: ReminderService,
    pub triggered: TriggeredMessages,
}
