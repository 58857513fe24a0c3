//! Free-text notes

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::item::{ItemBase, ItemId};

/// A note. It only has the fields that are common to every item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(flatten)]
    base: ItemBase,
}

impl Note {
    pub fn new(base: ItemBase) -> Self {
        Self { base }
    }

    pub fn id(&self) -> &ItemId               { self.base.id()          }
    pub fn date(&self) -> &DateTime<Utc>      { self.base.date()        }
    pub fn name(&self) -> &str                { self.base.name()        }
    pub fn description(&self) -> Option<&str> { self.base.description() }

    pub(crate) fn base_mut(&mut self) -> &mut ItemBase {
        &mut self.base
    }
}
