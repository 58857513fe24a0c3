//! This crate provides the storage layer of a personal planner, and an offline-first request cache.
//!
//! Planner items (tasks, notes and events, see [`Item`]) are managed by an [`ItemStore`], that persists them into any
//! [`KeyValueStore`](traits::KeyValueStore), e.g. a [`FileStorage`](storage::FileStorage).
//!
//! Independently, the [`worker`] module provides an [`OfflineWorker`](worker::OfflineWorker), that pre-caches a few URLs
//! and then serves requests from its cache first, falling back to the network.

pub mod traits;

mod item;
pub use item::{Item, ItemBase, ItemDetails, ItemDraft, ItemId, ItemKind, ItemUpdate};
mod task;
pub use task::Task;
mod note;
pub use note::Note;
mod event;
pub use event::Event;

pub mod storage;
mod item_store;
pub use item_store::ItemStore;

pub mod worker;

pub mod config;
pub mod utils;
pub mod mock_behaviour;
