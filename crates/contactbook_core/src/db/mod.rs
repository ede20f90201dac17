//! SQLite bootstrap for the bundled durable key-value store.
//!
//! # Responsibility
//! - Open and configure SQLite connections backing `SqliteKvStore`.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - No key-value command runs before migrations succeed.
//!
//! Failures surface as `KvError`, the same error the store commands raise.

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};
