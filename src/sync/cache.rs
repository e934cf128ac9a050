//! Local persistent cache consumed by the sync session.
//!
//! Reads and writes are synchronous and expected to be fast; the session
//! calls them while applying edits, never across an await point.

use crate::core::Result;
use crate::storage::{read_json, write_json_atomic};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait LocalCache: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<Value>>;
    fn store(&self, key: &str, value: &Value) -> Result<()>;
}

/// One JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl LocalCache for FileCache {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        read_json(&self.path_for(key))
    }

    fn store(&self, key: &str, value: &Value) -> Result<()> {
        write_json_atomic(&self.path_for(key), value)
    }
}

#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Value>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalCache for MemoryCache {
    fn load(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.lock()?.get(key).cloned())
    }

    fn store(&self, key: &str, value: &Value) -> Result<()> {
        self.entries.lock()?.insert(key.to_string(), value.clone());
        Ok(())
    }
}
