//! The planner items, persisted as a whole into a single slot of a key-value store

use std::error::Error;

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::config::ITEMS_KEY;
use crate::item::{Item, ItemDraft, ItemId, ItemUpdate};
use crate::traits::KeyValueStore;


/// A store for planner items.
///
/// Every operation reads the full list of items from the underlying [`KeyValueStore`], changes it, and writes it back.
/// There is no locking: two `ItemStore`s sharing the same backing data may overwrite each other's changes.
///
/// Item IDs are derived from the item dates as seen in the time zone of the store (the local time zone by default).
#[derive(Debug)]
pub struct ItemStore<S: KeyValueStore, Tz: TimeZone = Local> {
    store: S,
    timezone: Tz,
}

impl<S: KeyValueStore> ItemStore<S> {
    /// Create an item store that persists into `store`, for a user in the local time zone
    pub fn new(store: S) -> Self {
        Self { store, timezone: Local }
    }
}

impl<S: KeyValueStore, Tz: TimeZone> ItemStore<S, Tz> {
    /// Create an item store that persists into `store`, for a user in `timezone`
    pub fn with_timezone(store: S, timezone: Tz) -> Self {
        Self { store, timezone }
    }

    pub fn timezone(&self) -> &Tz { &self.timezone }

    /// Returns the underlying key-value store
    pub fn store(&self) -> &S { &self.store }
    /// Returns the underlying key-value store
    pub fn store_mut(&mut self) -> &mut S { &mut self.store }
    pub fn into_inner(self) -> S { self.store }

    /// Returns every item, in insertion order.
    ///
    /// A missing (or empty) storage slot means there are no items yet.
    /// The stored content is not validated further than its deserialization.
    pub fn get_items(&self) -> Result<Vec<Item>, Box<dyn Error>> {
        match self.store.get(ITEMS_KEY)? {
            Some(text) if text.is_empty() == false => {
                let items = serde_json::from_str(&text)?;
                Ok(items)
            },
            _ => Ok(Vec::new()),
        }
    }

    /// Returns the items that are filed under the same day as `day`, in the time zone of `day`
    pub fn get_items_from_day<DayTz: TimeZone>(&self, day: &DateTime<DayTz>) -> Result<Vec<Item>, Box<dyn Error>> {
        Ok(self.get_items()?
            .into_iter()
            .filter(|item| item.is_on_day(day))
            .collect()
        )
    }

    fn save_items(&mut self, items: &[Item]) -> Result<(), Box<dyn Error>> {
        let text = serde_json::to_string(items)?;
        self.store.set(ITEMS_KEY, text)
    }

    /// Add a new item at the end of the list, and return its (newly generated) ID
    pub fn add_item(&mut self, draft: ItemDraft) -> Result<ItemId, Box<dyn Error>> {
        let mut items = self.get_items()?;
        let id = ItemId::random(&draft.date.with_timezone(&self.timezone));
        log::debug!("Adding item {}", id);
        items.push(Item::from_draft(draft, id.clone()));
        self.save_items(&items)?;
        Ok(id)
    }

    /// Remove an item. Removing an item that does not exist does nothing.
    pub fn remove_item(&mut self, id: &ItemId) -> Result<(), Box<dyn Error>> {
        let items = self.get_items()?;
        let n_items = items.len();
        let remaining: Vec<Item> = items.into_iter()
            .filter(|item| item.id() != id)
            .collect();
        if remaining.len() == n_items {
            log::debug!("No item {} to remove", id);
        }
        self.save_items(&remaining)
    }

    /// Change the fields of an item that are set in `update`.
    /// Updating an item that does not exist does nothing.
    pub fn update_item(&mut self, update: &ItemUpdate) -> Result<(), Box<dyn Error>> {
        let mut items = self.get_items()?;
        match items.iter_mut().find(|item| item.id() == &update.id) {
            None => log::debug!("No item {} to update", update.id),
            Some(item) => item.apply_update(update),
        }
        self.save_items(&items)
    }

    /// File an item under another date.
    ///
    /// Since item IDs depend on their date, this adds a copy of the item with a new ID, then removes the original one.
    /// These are two distinct writes: in case the second one fails, both items remain.
    ///
    /// Returns the new ID, or `None` in case there is no such item.
    pub fn move_item(&mut self, id: &ItemId, new_date: DateTime<Utc>) -> Result<Option<ItemId>, Box<dyn Error>> {
        let original = match self.get_items()?.into_iter().find(|item| item.id() == id) {
            None => {
                log::debug!("No item {} to move", id);
                return Ok(None);
            },
            Some(item) => item,
        };

        let mut draft = original.to_draft();
        draft.date = new_date;
        let new_id = self.add_item(draft)?;
        self.remove_item(id)?;
        log::debug!("Item {} moved to {}", id, new_id);
        Ok(Some(new_id))
    }

    /// Remove every item, and the storage slot itself
    pub fn clear(&mut self) -> Result<(), Box<dyn Error>> {
        self.store.remove(ITEMS_KEY)
    }
}
