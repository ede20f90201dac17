//! Snapshot persistence on top of the key-value collaborator.
//!
//! # Responsibility
//! - Own the well-known key and the snapshot document encoding.
//! - Translate EXISTS/GET/SET/DEL results into whole-`Dataset` load/store.
//!
//! # Invariants
//! - Stores always write the full snapshot; there is no sub-key granularity.
//! - Decode failures are surfaced, never replaced by an empty snapshot.

pub mod snapshot_repo;
