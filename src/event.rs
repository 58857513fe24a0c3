//! Calendar events

use serde::{Deserialize, Serialize};
use chrono::{Utc, DateTime};

use crate::item::{ItemBase, ItemId};

/// An event, that may happen at a given time of its day
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(flatten)]
    base: ItemBase,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    time: Option<DateTime<Utc>>,
}

impl Event {
    pub fn new(base: ItemBase, time: Option<DateTime<Utc>>) -> Self {
        Self { base, time }
    }

    pub fn id(&self) -> &ItemId {
        self.base.id()
    }

    pub fn date(&self) -> &DateTime<Utc> {
        self.base.date()
    }

    pub fn name(&self) -> &str {
        self.base.name()
    }

    pub fn description(&self) -> Option<&str> {
        self.base.description()
    }

    /// The time of day this event starts at, if any
    pub fn time(&self) -> Option<&DateTime<Utc>> {
        self.time.as_ref()
    }

    pub(crate) fn base_mut(&mut self) -> &mut ItemBase {
        &mut self.base
    }

    pub fn set_time(&mut self, time: Option<DateTime<Utc>>) {
        self.time = time;
    }
}
