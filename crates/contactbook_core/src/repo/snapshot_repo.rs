//! Whole-snapshot repository over a `KvStore`.
//!
//! # Invariants
//! - Absent key, or a key whose value vanished between EXISTS and GET,
//!   loads as an empty snapshot.
//! - Encoding happens before any store command, so an encode failure leaves
//!   the store untouched.

use crate::kv::{KvError, KvStore};
use crate::model::dataset::Dataset;
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Key holding the serialized snapshot.
pub const USERS_KEY: &str = "users";

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    /// Snapshot bytes could not be decoded, or the snapshot could not be encoded.
    Serialization(serde_json::Error),
    /// The store command itself failed.
    Kv(KvError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serialization(err) => write!(f, "invalid snapshot document: {err}"),
            Self::Kv(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialization(err) => Some(err),
            Self::Kv(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

impl From<KvError> for RepoError {
    fn from(value: KvError) -> Self {
        Self::Kv(value)
    }
}

/// Decoded snapshot together with the bytes it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSnapshot {
    pub dataset: Dataset,
    /// `None` when the key was absent.
    pub raw: Option<Vec<u8>>,
}

/// Loads and stores the full `Dataset` under `USERS_KEY`.
pub struct SnapshotRepository<S: KvStore> {
    store: S,
}

impl<S: KvStore> SnapshotRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Fetches and decodes the current snapshot.
    pub fn load(&self) -> RepoResult<LoadedSnapshot> {
        if !self.store.exists(USERS_KEY)? {
            debug!("event=snapshot_load module=repo status=ok state=absent");
            return Ok(LoadedSnapshot {
                dataset: Dataset::new(),
                raw: None,
            });
        }

        let Some(raw) = self.store.get(USERS_KEY)? else {
            debug!("event=snapshot_load module=repo status=ok state=vanished");
            return Ok(LoadedSnapshot {
                dataset: Dataset::new(),
                raw: None,
            });
        };

        let dataset = Dataset::decode(&raw)?;
        debug!(
            "event=snapshot_load module=repo status=ok bytes={} users={}",
            raw.len(),
            dataset.len()
        );
        Ok(LoadedSnapshot {
            dataset,
            raw: Some(raw),
        })
    }

    /// Replaces the stored snapshot unconditionally.
    pub fn save(&self, dataset: &Dataset) -> RepoResult<()> {
        let bytes = dataset.encode()?;
        self.store.set(USERS_KEY, &bytes)?;
        debug!(
            "event=snapshot_save module=repo status=ok bytes={} users={}",
            bytes.len(),
            dataset.len()
        );
        Ok(())
    }

    /// Replaces the stored snapshot only if it still equals `expected`.
    ///
    /// Returns `false` when another writer got there first.
    pub fn save_if_unchanged(&self, dataset: &Dataset, expected: Option<&[u8]>) -> RepoResult<bool> {
        let bytes = dataset.encode()?;
        let swapped = self.store.compare_and_set(USERS_KEY, expected, &bytes)?;
        debug!(
            "event=snapshot_save module=repo status={} mode=cas bytes={}",
            if swapped { "ok" } else { "conflict" },
            bytes.len()
        );
        Ok(swapped)
    }

    /// Deletes the snapshot key. Returns whether anything was stored.
    pub fn remove(&self) -> RepoResult<bool> {
        Ok(self.store.delete(USERS_KEY)?)
    }
}
