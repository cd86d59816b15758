//! Best-score store
//!
//! Scores live in a flat key/value backend (LocalStorage on web, a map in
//! tests and on native) under `meerkat_<game>_high` and
//! `meerkat_<game>_l<level>_best`. Backend failures are logged and treated
//! as "no score" so a broken store never interrupts a game.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::STORAGE_NAMESPACE;

/// Which direction counts as an improvement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Better {
    /// Points, saves, keepie-uppies
    Higher,
    /// Times
    Lower,
}

impl Better {
    /// Whether `value` should replace `existing`
    ///
    /// For `Higher`, a missing score counts as zero: only positive values
    /// are ever recorded.
    pub fn improves(self, value: f64, existing: Option<f64>) -> bool {
        match self {
            Better::Higher => value > existing.unwrap_or(0.0),
            Better::Lower => existing.is_none_or(|best| value < best),
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage rejected write to {key}: {reason}")]
    Rejected { key: String, reason: String },
    #[error("stored value for {key} is not a number: {value:?}")]
    Corrupt { key: String, value: String },
}

/// Flat string key/value backend
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-memory backend (tests, native runs)
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Browser LocalStorage backend
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct LocalStorage {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorage {
    pub fn open() -> Result<Self, StorageError> {
        let storage = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window".to_string()))?
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".to_string()))?;
        Ok(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStorage for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(key)
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        // Quota errors surface here
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::Rejected {
                key: key.to_string(),
                reason: format!("{:?}", e),
            })
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StorageError::Rejected {
                key: key.to_string(),
                reason: format!("{:?}", e),
            })
    }
}

/// `<game>_high`
pub fn high_key(game: &str) -> String {
    format!("{}_high", game)
}

/// `<game>_l<level>_best`
pub fn level_key(game: &str, level: u32) -> String {
    format!("{}_l{}_best", game, level)
}

/// Best-score reads and conditional writes over a backend
pub struct ScoreStore {
    backend: Box<dyn KeyValueStorage>,
}

impl std::fmt::Debug for ScoreStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreStore").finish_non_exhaustive()
    }
}

impl Default for ScoreStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl ScoreStore {
    pub fn new(backend: Box<dyn KeyValueStorage>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    /// LocalStorage when available, memory otherwise
    #[cfg(target_arch = "wasm32")]
    pub fn browser() -> Self {
        match LocalStorage::open() {
            Ok(storage) => Self::new(Box::new(storage)),
            Err(e) => {
                log::warn!("{}; scores will not persist", e);
                Self::in_memory()
            }
        }
    }

    fn namespaced(key: &str) -> String {
        format!("{}{}", STORAGE_NAMESPACE, key)
    }

    fn read(&self, key: &str) -> Result<Option<f64>, StorageError> {
        let full = Self::namespaced(key);
        match self.backend.get(&full)? {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| StorageError::Corrupt { key: full, value: raw }),
        }
    }

    /// Stored best for `key`, if any
    ///
    /// `mode` is accepted for symmetry with [`ScoreStore::save_if_best`]; a
    /// stored value reads the same either way.
    pub fn get_best(&self, key: &str, mode: Better) -> Option<f64> {
        match self.read(key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Reading best {:?} score failed: {}", mode, e);
                None
            }
        }
    }

    /// Store `value` if it improves on the stored best; true iff written
    pub fn save_if_best(&mut self, key: &str, value: f64, mode: Better) -> bool {
        let existing = self.get_best(key, mode);
        if !mode.improves(value, existing) {
            return false;
        }
        match self.backend.set(&Self::namespaced(key), &value.to_string()) {
            Ok(()) => {
                log::info!("New best for {}: {} (was {:?})", key, value, existing);
                true
            }
            Err(e) => {
                log::warn!("Saving best score failed: {}", e);
                false
            }
        }
    }

    /// Raw backend access (settings share it)
    pub fn backend(&self) -> &dyn KeyValueStorage {
        self.backend.as_ref()
    }

    pub fn backend_mut(&mut self) -> &mut dyn KeyValueStorage {
        self.backend.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Backend whose writes always fail
    struct ReadOnly(MemoryStorage);

    impl KeyValueStorage for ReadOnly {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }
        fn set(&mut self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Rejected {
                key: key.to_string(),
                reason: "quota".to_string(),
            })
        }
        fn remove(&mut self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn test_keys() {
        assert_eq!(high_key("shooting"), "shooting_high");
        assert_eq!(level_key("dribble", 2), "dribble_l2_best");
    }

    #[test]
    fn test_higher_is_better() {
        let mut store = ScoreStore::in_memory();
        assert_eq!(store.get_best("shooting_high", Better::Higher), None);
        // Zero never counts as a best
        assert!(!store.save_if_best("shooting_high", 0.0, Better::Higher));
        assert!(store.save_if_best("shooting_high", 60.0, Better::Higher));
        assert!(!store.save_if_best("shooting_high", 60.0, Better::Higher));
        assert!(!store.save_if_best("shooting_high", 40.0, Better::Higher));
        assert!(store.save_if_best("shooting_high", 70.0, Better::Higher));
        assert_eq!(store.get_best("shooting_high", Better::Higher), Some(70.0));
    }

    #[test]
    fn test_lower_is_better() {
        let mut store = ScoreStore::in_memory();
        assert!(store.save_if_best("dribble_l1_best", 12.3, Better::Lower));
        assert!(!store.save_if_best("dribble_l1_best", 14.0, Better::Lower));
        assert!(store.save_if_best("dribble_l1_best", 9.8, Better::Lower));
        assert_eq!(store.get_best("dribble_l1_best", Better::Lower), Some(9.8));
    }

    #[test]
    fn test_values_are_namespaced() {
        let mut store = ScoreStore::in_memory();
        store.save_if_best("tackle_high", 7.0, Better::Higher);
        assert_eq!(
            store.backend().get("meerkat_tackle_high").ok().flatten(),
            Some("7".to_string())
        );
    }

    #[test]
    fn test_corrupt_value_reads_as_missing() {
        let mut store = ScoreStore::in_memory();
        store
            .backend_mut()
            .set("meerkat_formation_high", "lots")
            .unwrap();
        assert_eq!(store.get_best("formation_high", Better::Higher), None);
        assert!(store.save_if_best("formation_high", 5.0, Better::Higher));
    }

    #[test]
    fn test_failed_write_reports_false() {
        let mut store = ScoreStore::new(Box::new(ReadOnly(MemoryStorage::new())));
        assert!(!store.save_if_best("keepieups_high", 12.0, Better::Higher));
        assert_eq!(store.get_best("keepieups_high", Better::Higher), None);
    }
}
