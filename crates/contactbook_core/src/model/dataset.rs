//! Whole-dataset snapshot, the single unit of persistence.
//!
//! # Responsibility
//! - Hold every user (and transitively every contact) in one owned map.
//! - Apply upsert-by-id mutations in memory.
//! - Encode/decode the snapshot document.
//!
//! # Invariants
//! - Users are keyed by their own `id`; contacts likewise within a user.
//!   Decoding rejects documents that break this.
//! - A contact is only ever inserted under a user present in the snapshot.
//! - Encoding always produces a full document, never a diff.

use crate::model::user::{Contact, User, UserId, UserValidationError};
use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// In-memory snapshot of the full dataset.
///
/// Serialized as a JSON object keyed by user id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    users: HashMap<UserId, User>,
}

impl Dataset {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }

    /// Moves one user out of the snapshot.
    pub fn take_user(&mut self, id: &str) -> Option<User> {
        self.users.remove(id)
    }

    /// Iterates users in map order (unspecified, not stable across runs).
    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    /// Inserts or fully replaces the user stored at `user.id`.
    ///
    /// Returns the previous user, whose contacts are discarded with it.
    pub fn upsert_user(&mut self, user: User) -> Option<User> {
        self.users.insert(user.id.clone(), user)
    }

    /// Inserts or replaces one contact under its owning user.
    ///
    /// Sibling contacts are preserved. When the owner is absent the contact
    /// is handed back unchanged in `Err` and the snapshot is not modified.
    pub fn upsert_contact(&mut self, contact: Contact) -> Result<Option<Contact>, Contact> {
        match self.users.get_mut(&contact.user_id) {
            Some(user) => Ok(user.contacts.insert(contact.id.clone(), contact)),
            None => Err(contact),
        }
    }

    /// Encodes the full snapshot as a JSON document.
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Checks that every user sits under its own id and every contact is
    /// filed and owned correctly.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        for (key, user) in &self.users {
            if key != &user.id {
                return Err(UserValidationError::UserKeyMismatch {
                    key: key.clone(),
                    user_id: user.id.clone(),
                });
            }
            user.validate()?;
        }
        Ok(())
    }

    /// Decodes a snapshot from a JSON document.
    ///
    /// A document whose map keys disagree with the embedded ids is rejected
    /// as malformed.
    pub fn decode(bytes: &[u8]) -> serde_json::Result<Self> {
        let dataset: Self = serde_json::from_slice(bytes)?;
        dataset.validate().map_err(serde_json::Error::custom)?;
        Ok(dataset)
    }
}

impl FromIterator<User> for Dataset {
    fn from_iter<I: IntoIterator<Item = User>>(iter: I) -> Self {
        Self {
            users: iter.into_iter().map(|user| (user.id.clone(), user)).collect(),
        }
    }
}
