//! Core use-case services.
//!
//! # Responsibility
//! - Run read-modify-write cycles against the snapshot repository.
//! - Keep callers decoupled from the key-value collaborator and encoding.

pub mod data_service;
