//! File-backed persistence: a single JSON document replaced atomically on every write

use super::KvStore;
use crate::core::{Result, TrackerError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::debug;

// ============================================================================
// Snapshot helpers
// ============================================================================

/// Reads a JSON document, `None` when the file does not exist.
pub fn read_json(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read(path).map_err(|e| {
        TrackerError::storage(format!("Failed to read {}: {}", path.display(), e))
    })?;
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let value = serde_json::from_slice(&raw).map_err(|e| {
        TrackerError::storage(format!("Failed to parse {}: {}", path.display(), e))
    })?;
    Ok(Some(value))
}

/// Writes `value` next to `path` in a temp file, syncs it, then renames it over `path`.
pub fn write_json_atomic(path: &Path, value: &Value) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| {
        TrackerError::storage(format!("Failed to create directory {}: {}", dir.display(), e))
    })?;

    let temp = NamedTempFile::new_in(&dir)
        .map_err(|e| TrackerError::storage(format!("Failed to create temp file: {}", e)))?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer
            .flush()
            .map_err(|e| TrackerError::storage(format!("Failed to flush snapshot: {}", e)))?;
    }
    temp.as_file()
        .sync_all()
        .map_err(|e| TrackerError::storage(format!("Failed to sync snapshot: {}", e)))?;
    temp.persist(path).map_err(|e| {
        TrackerError::storage(format!("Failed to replace {}: {}", path.display(), e.error))
    })?;
    Ok(())
}

// ============================================================================
// File Store
// ============================================================================

/// Key-value store kept in memory and mirrored to one JSON object on disk.
pub struct FileKvStore {
    path: PathBuf,
    entries: Mutex<Map<String, Value>>,
}

impl FileKvStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match read_json(&path)? {
            None => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(TrackerError::storage(format!(
                    "{} does not hold a JSON object",
                    path.display()
                )));
            }
        };
        debug!(path = %path.display(), keys = entries.len(), "opened file store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl KvStore for FileKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let previous = entries.insert(key.to_string(), value);

        // the lock stays held across the blocking write so snapshots land in order
        let path = self.path.clone();
        let snapshot = Value::Object(entries.clone());
        let written = tokio::task::spawn_blocking(move || write_json_atomic(&path, &snapshot))
            .await
            .map_err(|e| TrackerError::storage(format!("Snapshot task failed: {}", e)))
            .and_then(|result| result);

        if let Err(err) = written {
            // keep memory and disk in agreement
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }
}
