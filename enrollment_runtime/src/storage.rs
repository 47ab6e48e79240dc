//! Key-value storage for the record list.
//!
//! One entry per key; the registration list lives under a single key as a
//! JSON array of records. Every write replaces the whole entry.
//!
//! File-backed rules:
//!   - `<dir>/<key>.json`, key restricted to `[a-zA-Z0-9_-]+`
//!   - write to `<key>.json.tmp`, fsync, then rename over the old file
//!   - a missing file reads as an absent entry

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use enrollment_core::RegistrationRecord;

use crate::error::Result;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> io::Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> io::Result<()>;

    fn remove(&mut self, key: &str) -> io::Result<()>;
}

// ---------------------------------------------------------------------------
// File store
// ---------------------------------------------------------------------------

/// Directory of JSON files, one per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open or create a store rooted at `dir`.
    pub fn open(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> io::Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");

        if let Err(e) = write_synced(&tmp, value).and_then(|_| fs::rename(&tmp, &path)) {
            fs::remove_file(&tmp).ok();
            return Err(e);
        }

        debug!(path = %path.display(), bytes = value.len(), "storage entry written");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> io::Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

fn write_synced(path: &Path, value: &str) -> io::Result<()> {
    let mut file = File::create(path)?;
    {
        let mut writer = BufWriter::new(&mut file);
        writer.write_all(value.as_bytes())?;
        writer.flush()?;
    }
    file.sync_all()
}

fn validate_key(key: &str) -> io::Result<()> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
    if !ok {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Invalid storage key {:?}: must match [a-zA-Z0-9_-]+", key),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> io::Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Record list
// ---------------------------------------------------------------------------

/// Write the full record list under `key`, replacing what was there.
pub fn save_records<S: KeyValueStore + ?Sized>(
    store: &mut S,
    key: &str,
    records: &[RegistrationRecord],
) -> Result<()> {
    let content = serde_json::to_string(records)?;
    store.set(key, &content)?;
    Ok(())
}

/// Read the record list under `key`. An absent entry is an empty list.
pub fn load_records<S: KeyValueStore + ?Sized>(
    store: &S,
    key: &str,
) -> Result<Vec<RegistrationRecord>> {
    match store.get(key)? {
        Some(content) if !content.trim().is_empty() => Ok(serde_json::from_str(&content)?),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("enrollment_runtime_storage_tests")
            .join(name);
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }
        dir
    }

    #[test]
    fn test_file_store_set_get_remove() {
        let mut store = FileStore::open(&temp_dir("set_get")).unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "[1]").unwrap();
        store.set("k", "[2]").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("[2]"));
        assert!(!store.dir().join("k.json.tmp").exists());
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let mut store = FileStore::open(&temp_dir("failed_rename")).unwrap();
        // A non-empty directory at the target path makes the rename fail.
        let target = store.dir().join("k.json");
        fs::create_dir_all(target.join("occupied")).unwrap();

        assert!(store.set("k", "[1]").is_err());
        assert!(!store.dir().join("k.json.tmp").exists());
        assert!(target.is_dir());
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let mut store = FileStore::open(&temp_dir("bad_key")).unwrap();
        let err = store.set("../escape", "x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(store.get("").is_err());
    }

    #[test]
    fn test_absent_entry_loads_empty() {
        let store = MemoryStore::new();
        assert!(load_records(&store, "studentRegistrations").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_entry_is_an_error() {
        let mut store = MemoryStore::new();
        store.set("k", "{not json").unwrap();
        assert!(load_records(&store, "k").is_err());
    }
}
