//! Durable key-value storage backing the history table.
//!
//! Mirrors a browser's local storage: string keys, string values, synchronous
//! writes that unconditionally replace the previous value.

use std::{collections::BTreeMap, fs, io::ErrorKind, path::PathBuf};

use crate::error::StorageError;

// ---

/// Key under which the serialized history list is stored.
pub const HISTORY_KEY: &str = "waterFootprintHistory";

pub trait Storage: Send {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Store kept as one JSON object in a file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        // ---
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => return Err(self.io_error(source)),
        };

        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
            key: self.path.display().to_string(),
            source,
        })
    }

    /// Sibling file the next write is staged in.
    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        PathBuf::from(staging)
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        // ---
        let mut items = self.read_all()?;
        items.insert(key.to_string(), value.to_string());

        let encoded = serde_json::to_string_pretty(&items)?;

        // Replace the file in one step so a crash never leaves it half written
        let staging = self.staging_path();
        let written = fs::write(&staging, encoded).and_then(|()| fs::rename(&staging, &self.path));
        if let Err(source) = written {
            fs::remove_file(&staging).ok();
            return Err(self.io_error(source));
        }

        tracing::debug!("Stored {} ({} bytes) in {}", key, value.len(), self.path.display());
        Ok(())
    }
}

/// Store that lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
