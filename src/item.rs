//! Planner items (tasks, notes, events)

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize};
use chrono::{DateTime, Datelike, TimeZone, Utc};

use crate::task::Task;
use crate::note::Note;
use crate::event::Event;


/// A planner entry.
///
/// Items are serialized as a flat JSON object, tagged by a `"type"` field
/// (`"task"`, `"note"` or `"event"`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Item {
    Task(Task),
    Note(Note),
    Event(Event),
}

/// Returns `task.$property_name`, `note.$property_name` or `event.$property_name`, depending on the variant of self
macro_rules! synthetise_common_getter {
    ($property_name:ident, $return_type:ty) => {
        pub fn $property_name(&self) -> $return_type {
            match self {
                Item::Task(t) => t.$property_name(),
                Item::Note(n) => n.$property_name(),
                Item::Event(e) => e.$property_name(),
            }
        }
    }
}

impl Item {
    synthetise_common_getter!(id, &ItemId);
    synthetise_common_getter!(date, &DateTime<Utc>);
    synthetise_common_getter!(name, &str);
    synthetise_common_getter!(description, Option<&str>);

    /// Build an item from a draft, giving it the provided ID
    pub fn from_draft(draft: ItemDraft, id: ItemId) -> Self {
        let base = ItemBase::new(id, draft.date, draft.name, draft.description);
        match draft.details {
            ItemDetails::Task{ done } => Item::Task(Task::new(base, done)),
            ItemDetails::Note => Item::Note(Note::new(base)),
            ItemDetails::Event{ time } => Item::Event(Event::new(base, time)),
        }
    }

    /// The content of this item, without its ID
    pub fn to_draft(&self) -> ItemDraft {
        let details = match self {
            Item::Task(t) => ItemDetails::Task{ done: t.done() },
            Item::Note(_) => ItemDetails::Note,
            Item::Event(e) => ItemDetails::Event{ time: e.time().cloned() },
        };
        ItemDraft {
            date: *self.date(),
            name: self.name().to_string(),
            description: self.description().map(String::from),
            details,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            Item::Task(_) => ItemKind::Task,
            Item::Note(_) => ItemKind::Note,
            Item::Event(_) => ItemKind::Event,
        }
    }

    pub fn is_task(&self) -> bool {
        matches!(self, Item::Task(_))
    }

    pub fn is_note(&self) -> bool {
        matches!(self, Item::Note(_))
    }

    pub fn is_event(&self) -> bool {
        matches!(self, Item::Event(_))
    }

    pub fn as_task(&self) -> Option<&Task> {
        match self {
            Item::Task(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_event(&self) -> Option<&Event> {
        match self {
            Item::Event(e) => Some(e),
            _ => None,
        }
    }

    /// Whether this item is filed under the same calendar day (year, month and day) as `day`.
    ///
    /// The item date is read in the time zone of `day`, and the time of day is ignored.
    pub fn is_on_day<Tz: TimeZone>(&self, day: &DateTime<Tz>) -> bool {
        self.date().with_timezone(&day.timezone()).date_naive() == day.date_naive()
    }

    fn base_mut(&mut self) -> &mut ItemBase {
        match self {
            Item::Task(t) => t.base_mut(),
            Item::Note(n) => n.base_mut(),
            Item::Event(e) => e.base_mut(),
        }
    }

    /// Overwrite the fields that are set in `update`, and keep the others.
    ///
    /// The ID is never changed. Fields that do not exist for this variant (e.g. a completion flag for a note) are ignored.
    pub fn apply_update(&mut self, update: &ItemUpdate) {
        let base = self.base_mut();
        if let Some(date) = update.date {
            base.date = date;
        }
        if let Some(name) = &update.name {
            base.name = name.clone();
        }
        if let Some(description) = &update.description {
            base.description = description.clone();
        }

        match self {
            Item::Task(t) => {
                if let Some(done) = update.done {
                    t.set_done(done);
                }
            },
            Item::Event(e) => {
                if let Some(time) = update.time {
                    e.set_time(time);
                }
            },
            Item::Note(_) => (),
        }

        if update.done.is_some() && self.is_task() == false {
            log::debug!("Ignoring the completion flag of an update to {} {}", self.kind(), self.id());
        }
        if update.time.is_some() && self.is_event() == false {
            log::debug!("Ignoring the time of an update to {} {}", self.kind(), self.id());
        }
    }
}


/// The fields every item has
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemBase {
    pub(crate) id: ItemId,
    pub(crate) date: DateTime<Utc>,
    pub(crate) name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) description: Option<String>,
}

impl ItemBase {
    pub fn new(id: ItemId, date: DateTime<Utc>, name: String, description: Option<String>) -> Self {
        Self { id, date, name, description }
    }

    pub fn id(&self) -> &ItemId               { &self.id }
    pub fn date(&self) -> &DateTime<Utc>      { &self.date }
    pub fn name(&self) -> &str                { &self.name }
    pub fn description(&self) -> Option<&str> { self.description.as_deref() }
}


/// The type of an item, without its content
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Task,
    Note,
    Event,
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Task => write!(f, "task"),
            ItemKind::Note => write!(f, "note"),
            ItemKind::Event => write!(f, "event"),
        }
    }
}


/// The ID of an item: `<year>.<month>.<day>.<uuid>`, where the date parts come from the item date, as seen in the user's time zone
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId {
    content: String,
}

impl ItemId {
    /// Generate a random ItemId for an item filed under `date`.
    ///
    /// The date parts are the ones of `date` in its own time zone.
    pub fn random<Tz: TimeZone>(date: &DateTime<Tz>) -> Self {
        let random = uuid::Uuid::new_v4().to_hyphenated().to_string();
        let content = format!("{}.{}.{}.{}", date.year(), date.month(), date.day(), random);
        Self { content }
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }
}

impl From<String> for ItemId {
    fn from(content: String) -> Self {
        Self { content }
    }
}

impl From<&str> for ItemId {
    fn from(content: &str) -> Self {
        Self { content: content.to_string() }
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.content)
    }
}


/// The variant-specific part of an item
#[derive(Clone, Debug, PartialEq)]
pub enum ItemDetails {
    Task { done: bool },
    Note,
    Event { time: Option<DateTime<Utc>> },
}

/// An item that has not been given an ID yet, i.e. that has not been added to an [`ItemStore`](crate::ItemStore)
#[derive(Clone, Debug, PartialEq)]
pub struct ItemDraft {
    pub date: DateTime<Utc>,
    pub name: String,
    pub description: Option<String>,
    pub details: ItemDetails,
}

impl ItemDraft {
    /// A task that is not done yet
    pub fn task<S: ToString>(name: S, date: DateTime<Utc>) -> Self {
        Self::new(name, date, ItemDetails::Task{ done: false })
    }

    pub fn note<S: ToString>(name: S, date: DateTime<Utc>) -> Self {
        Self::new(name, date, ItemDetails::Note)
    }

    pub fn event<S: ToString>(name: S, date: DateTime<Utc>, time: Option<DateTime<Utc>>) -> Self {
        Self::new(name, date, ItemDetails::Event{ time })
    }

    fn new<S: ToString>(name: S, date: DateTime<Utc>, details: ItemDetails) -> Self {
        Self { date, name: name.to_string(), description: None, details }
    }

    pub fn with_description<S: ToString>(mut self, description: S) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Only meaningful for tasks
    pub fn with_done(mut self, done: bool) -> Self {
        if let ItemDetails::Task{ done: d } = &mut self.details {
            *d = done;
        }
        self
    }
}


/// A partial item, used to update some of the fields of an existing item.
///
/// `None` means "keep the current value".
/// The optional fields of an item (`description` and `time`) can be cleared with `Some(None)`,
/// which is a JSON `null`, while a missing key keeps the current value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present_or_null")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present_or_null")]
    pub time: Option<Option<DateTime<Utc>>>,
}

/// A key that is present (even with a `null` value) deserializes to `Some`
fn present_or_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ItemUpdate {
    /// An update that changes nothing yet
    pub fn new(id: ItemId) -> Self {
        Self { id, date: None, name: None, description: None, done: None, time: None }
    }

    pub fn date(mut self, date: DateTime<Utc>) -> Self           { self.date = Some(date); self }
    pub fn name<S: ToString>(mut self, name: S) -> Self          { self.name = Some(name.to_string()); self }
    pub fn description<S: ToString>(mut self, d: S) -> Self      { self.description = Some(Some(d.to_string())); self }
    pub fn clear_description(mut self) -> Self                   { self.description = Some(None); self }
    pub fn done(mut self, done: bool) -> Self                    { self.done = Some(done); self }
    pub fn time(mut self, time: DateTime<Utc>) -> Self           { self.time = Some(Some(time)); self }
    pub fn clear_time(mut self) -> Self                          { self.time = Some(None); self }
}
