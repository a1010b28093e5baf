//! Durable Record Store
//!
//! Quest records are structured documents (`toml::Table`) keyed by quest
//! name. `TomlRecordStore` keeps one `<name>.toml` file per quest;
//! `MemoryRecordStore` keeps them in a map.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::StoreError;

pub trait RecordStore: Send + Sync {
    fn exists(&self, key: &str) -> Result<bool, StoreError>;

    fn read(&self, key: &str) -> Result<Option<toml::Table>, StoreError>;

    fn write(&self, key: &str, record: &toml::Table) -> Result<(), StoreError>;

    /// All keys, sorted.
    fn list_keys(&self) -> Result<Vec<String>, StoreError>;
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    let bad = key.is_empty()
        || key.starts_with('.')
        || key.contains(['/', '\\'])
        || key.contains('\0');
    if bad {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

// ============================================================================
// TOML Files
// ============================================================================

pub struct TomlRecordStore {
    dir: PathBuf,
}

impl TomlRecordStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.toml", key)))
    }
}

impl RecordStore for TomlRecordStore {
    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.path_for(key)?.is_file())
    }

    fn read(&self, key: &str) -> Result<Option<toml::Table>, StoreError> {
        let path = self.path_for(key)?;
        if !path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let table = toml::from_str(&content).map_err(|source| StoreError::Parse {
            key: key.to_string(),
            source,
        })?;
        Ok(Some(table))
    }

    fn write(&self, key: &str, record: &toml::Table) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let content = toml::to_string_pretty(record)?;

        fs::create_dir_all(&self.dir)?;

        // Write-then-rename so a crash never leaves a half-written record
        let tmp = self.dir.join(format!(".{}.toml.tmp", key));
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)?;

        debug!("Wrote quest record {:?}", path);
        Ok(())
    }

    fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        if !self.dir.exists() {
            warn!("Quest directory does not exist: {:?}", self.dir);
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().is_none_or(|ext| ext != "toml") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_key(stem).is_ok() {
                    keys.push(stem.to_string());
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

// ============================================================================
// In-memory
// ============================================================================

#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<BTreeMap<String, toml::Table>>,
    read_only: AtomicBool,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with `StoreError::ReadOnly`.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Store a raw document, bypassing validation.
    pub fn insert_raw(&self, key: &str, record: toml::Table) {
        self.records().insert(key.to_string(), record);
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    fn records(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, toml::Table>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RecordStore for MemoryRecordStore {
    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        validate_key(key)?;
        Ok(self.records().contains_key(key))
    }

    fn read(&self, key: &str) -> Result<Option<toml::Table>, StoreError> {
        validate_key(key)?;
        Ok(self.records().get(key).cloned())
    }

    fn write(&self, key: &str, record: &toml::Table) -> Result<(), StoreError> {
        validate_key(key)?;
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::ReadOnly);
        }
        self.records().insert(key.to_string(), record.clone());
        Ok(())
    }

    fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.records().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn doc(name: &str) -> toml::Table {
        let mut table = toml::Table::new();
        table.insert("name".into(), toml::Value::String(name.into()));
        table.insert("isStart".into(), toml::Value::Boolean(false));
        table
    }

    #[test]
    fn test_key_validation() {
        assert!(validate_key("welcome").is_ok());
        assert!(validate_key("the elder's request").is_ok());
        for bad in ["", "../escape", "a/b", "a\\b", ".hidden"] {
            assert!(matches!(validate_key(bad), Err(StoreError::InvalidKey(_))), "{}", bad);
        }
    }

    #[test]
    fn test_toml_store_write_read_list() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlRecordStore::new(&temp_dir.path().join("quests"));

        assert!(store.list_keys().unwrap().is_empty());
        assert!(!store.exists("welcome").unwrap());
        assert!(store.read("welcome").unwrap().is_none());

        store.write("welcome", &doc("welcome")).unwrap();
        store.write("farewell", &doc("farewell")).unwrap();

        assert!(store.exists("welcome").unwrap());
        assert_eq!(store.read("welcome").unwrap(), Some(doc("welcome")));
        assert_eq!(store.list_keys().unwrap(), vec!["farewell", "welcome"]);
        assert!(store.dir().join("welcome.toml").is_file());
    }

    #[test]
    fn test_toml_store_ignores_foreign_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlRecordStore::new(temp_dir.path());
        store.write("welcome", &doc("welcome")).unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "hello").unwrap();
        fs::create_dir(temp_dir.path().join("archive.toml")).unwrap();

        assert_eq!(store.list_keys().unwrap(), vec!["welcome"]);
    }

    #[test]
    fn test_toml_store_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlRecordStore::new(temp_dir.path());
        fs::write(temp_dir.path().join("broken.toml"), "name = ").unwrap();

        assert!(matches!(
            store.read("broken"),
            Err(StoreError::Parse { key, .. }) if key == "broken"
        ));
    }

    #[test]
    fn test_toml_store_rejects_traversal() {
        let temp_dir = TempDir::new().unwrap();
        let store = TomlRecordStore::new(temp_dir.path());
        assert!(matches!(
            store.write("../outside", &doc("x")),
            Err(StoreError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_memory_store_read_only() {
        let store = MemoryRecordStore::new();
        store.write("welcome", &doc("welcome")).unwrap();

        store.set_read_only(true);
        assert!(matches!(
            store.write("welcome", &doc("changed")),
            Err(StoreError::ReadOnly)
        ));
        assert_eq!(store.read("welcome").unwrap(), Some(doc("welcome")));

        store.set_read_only(false);
        store.write("other", &doc("other")).unwrap();
        assert_eq!(store.list_keys().unwrap(), vec!["other", "welcome"]);
        assert_eq!(store.len(), 2);
    }
}
