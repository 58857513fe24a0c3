//! To-do tasks

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::item::{ItemBase, ItemId};

/// A to-do task
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(flatten)]
    base: ItemBase,

    /// Whether this task has been completed.
    /// Items stored without this field are not done.
    #[serde(default)]
    done: bool,
}

impl Task {
    pub fn new(base: ItemBase, done: bool) -> Self {
        Self { base, done }
    }

    pub fn id(&self) -> &ItemId               { self.base.id()          }
    pub fn date(&self) -> &DateTime<Utc>      { self.base.date()        }
    pub fn name(&self) -> &str                { self.base.name()        }
    pub fn description(&self) -> Option<&str> { self.base.description() }
    pub fn done(&self) -> bool                { self.done               }

    pub(crate) fn base_mut(&mut self) -> &mut ItemBase {
        &mut self.base
    }

    /// Mark this task as completed (or not)
    pub fn set_done(&mut self, done: bool) {
        self.done = done;
    }
}
