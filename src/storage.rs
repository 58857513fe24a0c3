//! Key-value stores that an [`ItemStore`](crate::ItemStore) can persist into

use std::collections::HashMap;
use std::error::Error;
use std::path::{Path, PathBuf};

use crate::traits::KeyValueStore;


/// A key-value store that only lives in memory
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryStorage {
    data: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        Ok(self.data.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), Box<dyn Error>> {
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), Box<dyn Error>> {
        self.data.remove(key);
        Ok(())
    }
}


/// A key-value store that is saved into a local JSON file.
///
/// The whole file is rewritten on every change.
#[derive(Debug, PartialEq)]
pub struct FileStorage {
    backing_file: PathBuf,
    data: HashMap<String, String>,
}

impl FileStorage {
    /// Initialize a store from the content of a valid backing file if it exists.
    /// Returns an error otherwise
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn Error>> {
        let data = match std::fs::File::open(path) {
            Err(err) => {
                return Err(format!("Unable to open file {:?}: {}", path, err).into());
            },
            Ok(file) => serde_json::from_reader(file)?,
        };

        Ok(Self{
            backing_file: PathBuf::from(path),
            data,
        })
    }

    /// Initialize an empty store. Nothing is written to `path` until the first change
    pub fn new(path: &Path) -> Self {
        Self{
            backing_file: PathBuf::from(path),
            data: HashMap::new(),
        }
    }

    /// Load the store from `path`, or start with an empty one in case this file is missing or invalid
    pub fn open(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(storage) => storage,
            Err(err) => {
                log::warn!("Invalid storage file: {}. Using an empty storage", err);
                Self::new(path)
            }
        }
    }

    pub fn backing_file(&self) -> &Path {
        &self.backing_file
    }

    /// Store the current content to the backing file
    fn save_to_file(&self) -> Result<(), Box<dyn Error>> {
        let path = &self.backing_file;
        let file = match std::fs::File::create(path) {
            Err(err) => {
                return Err(format!("Unable to save file {:?}: {}", path, err).into());
            },
            Ok(f) => f,
        };

        serde_json::to_writer(file, &self.data)?;
        Ok(())
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        Ok(self.data.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), Box<dyn Error>> {
        self.data.insert(key.to_string(), value);
        self.save_to_file()
    }

    fn remove(&mut self, key: &str) -> Result<(), Box<dyn Error>> {
        if self.data.remove(key).is_none() {
            return Ok(());
        }
        self.save_to_file()
    }
}
