//! Process-local key-value store.

use super::{KvResult, KvStore};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// In-memory store. Clones share the same entries, so two handles behave
/// like two sessions against one server.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KvStore for MemoryKvStore {
    fn exists(&self, key: &str) -> KvResult<bool> {
        Ok(self.entries.lock().contains_key(key))
    }

    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> KvResult<()> {
        self.entries.lock().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> KvResult<bool> {
        Ok(self.entries.lock().remove(key).is_some())
    }

    fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        value: &[u8],
    ) -> KvResult<bool> {
        let mut entries = self.entries.lock();
        if entries.get(key).map(Vec::as_slice) != expected {
            return Ok(false);
        }
        entries.insert(key.to_string(), value.to_vec());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryKvStore;
    use crate::kv::KvStore;

    #[test]
    fn clones_share_entries() {
        let first = MemoryKvStore::new();
        let second = first.clone();

        first.set("k", b"v").unwrap();
        assert_eq!(second.get("k").unwrap().as_deref(), Some(&b"v"[..]));
        assert!(second.delete("k").unwrap());
        assert!(!first.exists("k").unwrap());
    }

    #[test]
    fn compare_and_set_checks_current_value() {
        let store = MemoryKvStore::new();

        assert!(store.compare_and_set("k", None, b"one").unwrap());
        assert!(!store.compare_and_set("k", None, b"two").unwrap());
        assert!(!store.compare_and_set("k", Some(&b"stale"[..]), b"two").unwrap());
        assert!(store.compare_and_set("k", Some(&b"one"[..]), b"two").unwrap());
        assert_eq!(store.get("k").unwrap().as_deref(), Some(&b"two"[..]));
    }
}
