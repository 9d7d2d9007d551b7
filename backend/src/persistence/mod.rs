//! Key-value persistence for saved progress and the store registry.
//!
//! Two independent records are kept, each read and written as a whole JSON
//! value:
//!
//! ```text
//! data_dir/
//! ├── storeCodes.json                 ["AL", "BR", ...]
//! └── transferRequestsProgress.json   [{ "id": 1, "displayId": 1, ... }]
//! ```
//!
//! [`FileStore`] writes each value to a temporary file and renames it into
//! place; a failed write leaves the previous value intact.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::config::{DEFAULT_STORE_CODES, PROGRESS_KEY, STORE_CODES_KEY};
use crate::error::{InputFormatError, IoError, IoResult, SessionResult};
use crate::models::TableRow;
use crate::notify::notify_warning;
use crate::validation::{validate_progress_snapshot, validate_store_codes};

/// Whole-value string storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> IoResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> IoResult<()>;
    fn remove(&self, key: &str) -> IoResult<()>;
}

// =============================================================================
// File Store
// =============================================================================

/// One `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: PathBuf::from(dir.as_ref()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> IoResult<Option<String>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| IoError::StorageRead(format!("{}: {}", path.display(), e)))
    }

    fn set(&self, key: &str, value: &str) -> IoResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| IoError::StorageWrite(e.to_string()))?;

        let path = self.path(key);
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        fs::write(&tmp, value).map_err(|e| IoError::StorageWrite(e.to_string()))?;
        fs::rename(&tmp, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            IoError::StorageWrite(e.to_string())
        })
    }

    fn remove(&self, key: &str) -> IoResult<()> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(());
        }
        fs::remove_file(&path).map_err(|e| IoError::StorageWrite(e.to_string()))
    }
}

// =============================================================================
// Memory Store
// =============================================================================

/// In-process store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> IoResult<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|e| IoError::StorageRead(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> IoResult<()> {
        let mut values = self
            .values
            .write()
            .map_err(|e| IoError::StorageWrite(e.to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> IoResult<()> {
        let mut values = self
            .values
            .write()
            .map_err(|e| IoError::StorageWrite(e.to_string()))?;
        values.remove(key);
        Ok(())
    }
}

// =============================================================================
// Records
// =============================================================================

/// Write the full row set verbatim.
pub fn save_progress(store: &dyn KeyValueStore, rows: &[TableRow]) -> SessionResult<()> {
    let json = serde_json::to_string(rows).map_err(|e| IoError::StorageWrite(e.to_string()))?;
    store.set(PROGRESS_KEY, &json)?;
    Ok(())
}

/// Read the saved row set, `None` when nothing was saved.
///
/// A record that is not an array of rows, or that repeats a row id, is a
/// [`InputFormatError::MalformedSnapshot`].
pub fn load_progress(store: &dyn KeyValueStore) -> SessionResult<Option<Vec<TableRow>>> {
    let Some(raw) = store.get(PROGRESS_KEY)? else {
        return Ok(None);
    };

    let value: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| InputFormatError::MalformedSnapshot(vec![e.to_string()]))?;
    validate_progress_snapshot(&value).map_err(InputFormatError::MalformedSnapshot)?;

    let rows: Vec<TableRow> = serde_json::from_value(value)
        .map_err(|e| InputFormatError::MalformedSnapshot(vec![e.to_string()]))?;

    let mut seen = HashSet::with_capacity(rows.len());
    let repeated: Vec<String> = rows
        .iter()
        .filter(|r| !seen.insert(r.id))
        .map(|r| format!("Duplicate row id {}", r.id))
        .collect();
    if !repeated.is_empty() {
        return Err(InputFormatError::MalformedSnapshot(repeated).into());
    }

    Ok(Some(rows))
}

/// Forget the saved row set.
pub fn clear_progress(store: &dyn KeyValueStore) -> SessionResult<()> {
    store.remove(PROGRESS_KEY)?;
    Ok(())
}

/// Normalized form of a store list: uppercase, de-duplicated, ascending.
pub fn normalize_store_codes<S: AsRef<str>>(codes: &[S]) -> Vec<String> {
    let mut normalized: Vec<String> = codes
        .iter()
        .map(|c| c.as_ref().trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized
}

pub fn save_store_codes<S: AsRef<str>>(store: &dyn KeyValueStore, codes: &[S]) -> SessionResult<()> {
    let normalized = normalize_store_codes(codes);
    let json = serde_json::to_string(&normalized).map_err(|e| IoError::StorageWrite(e.to_string()))?;
    store.set(STORE_CODES_KEY, &json)?;
    Ok(())
}

/// Saved store codes, or the default list when absent or unreadable.
pub fn load_store_codes(store: &dyn KeyValueStore) -> Vec<String> {
    let defaults = || normalize_store_codes(DEFAULT_STORE_CODES);

    let raw = match store.get(STORE_CODES_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return defaults(),
        Err(e) => {
            notify_warning(format!("{}. Using default stores.", e));
            return defaults();
        }
    };

    match parse_store_codes(&raw) {
        Ok(codes) => normalize_store_codes(&codes),
        Err(e) => {
            notify_warning(format!("{}. Using default stores.", e));
            defaults()
        }
    }
}

fn parse_store_codes(raw: &str) -> Result<Vec<String>, InputFormatError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| InputFormatError::MalformedStoreList(vec![e.to_string()]))?;
    validate_store_codes(&value).map_err(InputFormatError::MalformedStoreList)?;
    serde_json::from_value(value).map_err(|e| InputFormatError::MalformedStoreList(vec![e.to_string()]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use tempfile::tempdir;

    fn sample_rows() -> Vec<TableRow> {
        let mut first = TableRow::new(1, "AB1234");
        first.brand = "NIKE".into();
        first.from = "AL".into();
        first.note = "Other".into();
        first.custom_note = "hold \"front\"".into();
        let second = first.duplicate(2);
        vec![first, second, TableRow::new(3, "X1")]
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "[1]").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("[1]"));
        assert!(store.dir().join("k.json").exists());
        assert!(!store.dir().join("k.json.tmp").exists());

        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        store.remove("k").unwrap();
    }

    #[test]
    fn test_progress_roundtrip_is_identical() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let rows = sample_rows();

        save_progress(&store, &rows).unwrap();
        assert_eq!(load_progress(&store).unwrap(), Some(rows));
    }

    #[test]
    fn test_missing_progress() {
        let store = MemoryStore::new();
        assert_eq!(load_progress(&store).unwrap(), None);
    }

    #[test]
    fn test_malformed_progress() {
        let store = MemoryStore::new();
        store.set(PROGRESS_KEY, "{\"rows\": []}").unwrap();
        assert!(matches!(
            load_progress(&store),
            Err(SessionError::InputFormat(InputFormatError::MalformedSnapshot(_)))
        ));

        store.set(PROGRESS_KEY, "not json").unwrap();
        assert!(load_progress(&store).is_err());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let store = MemoryStore::new();
        let mut rows = sample_rows();
        rows[1].id = rows[0].id;
        save_progress(&store, &rows).unwrap();

        match load_progress(&store) {
            Err(SessionError::InputFormat(InputFormatError::MalformedSnapshot(errors))) => {
                assert_eq!(errors, vec!["Duplicate row id 1".to_string()]);
            }
            other => panic!("expected malformed snapshot, got {:?}", other),
        }
    }

    #[test]
    fn test_oversized_id_rejected() {
        let store = MemoryStore::new();
        let mut rows = sample_rows();
        rows[2].id = u64::MAX;
        save_progress(&store, &rows).unwrap();

        assert!(matches!(
            load_progress(&store),
            Err(SessionError::InputFormat(InputFormatError::MalformedSnapshot(_)))
        ));
    }

    #[test]
    fn test_clear_progress() {
        let store = MemoryStore::new();
        save_progress(&store, &sample_rows()).unwrap();

        clear_progress(&store).unwrap();
        assert_eq!(load_progress(&store).unwrap(), None);
        clear_progress(&store).unwrap();
    }

    #[test]
    fn test_store_codes_sorted_on_write() {
        let store = MemoryStore::new();
        save_store_codes(&store, &["zz", "AL", " br "]).unwrap();

        let raw = store.get(STORE_CODES_KEY).unwrap().unwrap();
        assert_eq!(raw, "[\"AL\",\"BR\",\"ZZ\"]");
        assert_eq!(load_store_codes(&store), vec!["AL", "BR", "ZZ"]);
    }

    #[test]
    fn test_store_codes_fallback() {
        let store = MemoryStore::new();
        let defaults = load_store_codes(&store);
        assert_eq!(defaults.len(), DEFAULT_STORE_CODES.len());
        assert!(defaults.windows(2).all(|w| w[0] < w[1]));

        store.set(STORE_CODES_KEY, "{\"bad\": true}").unwrap();
        assert_eq!(load_store_codes(&store), defaults);
    }
}
