//! Whole-snapshot JSON persistence
//!
//! Every persisted structure (players, history, aliases, config blob) is read
//! in full at startup and rewritten in full on mutation. There is no partial
//! or append update and no cross-file transaction.

use crate::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Load/save contract for one logical store
pub trait SnapshotStore<T>: Send + Sync {
    /// Read the whole snapshot. `Ok(None)` when nothing was saved yet.
    fn load(&self) -> Result<Option<T>>;

    /// Replace the whole snapshot.
    fn save_all(&self, value: &T) -> Result<()>;
}

/// UTF-8 pretty JSON file, replaced atomically through a sibling temp file
pub struct JsonFile<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFile<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T> SnapshotStore<T> for JsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    fn load(&self) -> Result<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&self.path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn save_all(&self, value: &T) -> Result<()> {
        let json = serde_json::to_vec_pretty(value)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-process store holding the last saved snapshot as JSON
pub struct MemoryStore<T> {
    saved: Mutex<Option<String>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            saved: Mutex::new(None),
            _marker: PhantomData,
        }
    }
}

impl<T> MemoryStore<T>
where
    T: Serialize,
{
    /// Store pre-seeded with `value`
    pub fn with_value(value: &T) -> Result<Self> {
        Ok(Self {
            saved: Mutex::new(Some(serde_json::to_string(value)?)),
            _marker: PhantomData,
        })
    }
}

impl<T> SnapshotStore<T> for MemoryStore<T>
where
    T: Serialize + DeserializeOwned,
{
    fn load(&self) -> Result<Option<T>> {
        let saved = self
            .saved
            .lock()
            .map_err(|_| crate::Error::Internal("memory store poisoned".to_string()))?;
        match saved.as_deref() {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn save_all(&self, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        let mut saved = self
            .saved
            .lock()
            .map_err(|_| crate::Error::Internal("memory store poisoned".to_string()))?;
        *saved = Some(json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_json_file_missing_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonFile<Vec<i64>> = JsonFile::new(dir.path().join("absent.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_json_file_save_replaces_whole_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonFile<BTreeMap<String, String>> = JsonFile::new(dir.path().join("m.json"));

        let mut first = BTreeMap::new();
        first.insert("a".to_string(), "A".to_string());
        first.insert("b".to_string(), "B".to_string());
        store.save_all(&first).unwrap();

        let mut second = BTreeMap::new();
        second.insert("c".to_string(), "C".to_string());
        store.save_all(&second).unwrap();

        assert_eq!(store.load().unwrap(), Some(second));
        assert!(!dir.path().join("m.json.tmp").exists());
    }

    #[test]
    fn test_json_file_corrupt_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let store: JsonFile<Vec<i64>> = JsonFile::new(path);
        assert!(store.load().is_err());
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::<Vec<i64>>::default();
        assert!(store.load().unwrap().is_none());
        store.save_all(&vec![1, -2, 3]).unwrap();
        assert_eq!(store.load().unwrap(), Some(vec![1, -2, 3]));
    }
}
