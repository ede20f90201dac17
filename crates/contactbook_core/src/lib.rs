//! Core domain logic for the contact book.
//! Users own contacts; the whole dataset persists as one snapshot under one
//! key of a key-value store.

pub mod config;
pub mod db;
pub mod kv;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use kv::{KvError, KvResult, KvStore, MemoryKvStore, SqliteKvStore};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::dataset::Dataset;
pub use model::user::{Contact, ContactId, ContactMap, User, UserId, UserValidationError};
pub use model::view::{project_users, ContactView, UserView};
pub use repo::snapshot_repo::{
    LoadedSnapshot, RepoError, RepoResult, SnapshotRepository, USERS_KEY,
};
pub use service::data_service::{
    DataService, ServiceError, ServiceErrorKind, ServiceResult, WritePolicy,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
