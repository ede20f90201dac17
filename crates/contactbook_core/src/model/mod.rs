//! Storage and view models for the contact book.
//!
//! # Responsibility
//! - Define the storage shape persisted as one snapshot (`Dataset`).
//! - Define read-only view projections handed to external callers.
//!
//! # Invariants
//! - A `Dataset` is keyed by `User::id`; a user's contacts by `Contact::id`.
//! - Views never carry back-references and never touch the store.

pub mod dataset;
pub mod user;
pub mod view;
