//! Key-value collaborator contract and bundled implementations.
//!
//! # Responsibility
//! - Define the EXISTS/GET/SET/DEL surface the snapshot repository consumes.
//! - Offer an optional conditional set for callers that opt into
//!   compare-and-swap writes.
//!
//! # Invariants
//! - Each command is atomic on its own; nothing spans two commands.
//! - Deleting a missing key succeeds and reports `false`.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

pub type KvResult<T> = Result<T, KvError>;

/// Failure raised by the store itself (transport or engine side).
#[derive(Debug)]
pub enum KvError {
    Sqlite(rusqlite::Error),
    /// Store database was written by a newer schema than this binary knows.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// The store does not implement an optional command.
    Unsupported(&'static str),
}

impl Display for KvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "store schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Unsupported(command) => write!(f, "store does not support `{command}`"),
        }
    }
}

impl Error for KvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::Unsupported(_) => None,
        }
    }
}

impl From<rusqlite::Error> for KvError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Minimal key-value command set.
pub trait KvStore {
    fn exists(&self, key: &str) -> KvResult<bool>;
    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> KvResult<()>;
    /// Removes `key`; returns whether a value was present.
    fn delete(&self, key: &str) -> KvResult<bool>;

    /// Sets `key` to `value` only if it currently holds `expected`
    /// (`None` meaning absent). Returns `false` when the guard failed.
    fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        value: &[u8],
    ) -> KvResult<bool> {
        let _ = (key, expected, value);
        Err(KvError::Unsupported("compare_and_set"))
    }
}

impl<T: KvStore + ?Sized> KvStore for &T {
    fn exists(&self, key: &str) -> KvResult<bool> {
        (**self).exists(key)
    }

    fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> KvResult<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> KvResult<bool> {
        (**self).delete(key)
    }

    fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        value: &[u8],
    ) -> KvResult<bool> {
        (**self).compare_and_set(key, expected, value)
    }
}
