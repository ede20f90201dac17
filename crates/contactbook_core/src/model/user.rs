//! User and contact storage models.
//!
//! # Responsibility
//! - Define the records embedded in the persisted snapshot document.
//! - Provide write-time validation for ids and contact ownership.
//!
//! # Invariants
//! - `id` values are stable for the record lifetime. Any string is accepted.
//! - A contact stored under a user carries that user's id in `user_id`.
//! - A contact is stored in `User::contacts` under its own `id`.
//!
//! Field names on the wire are `ID`, `Name`, `Contacts`, `Email` and
//! `UserID`, matching documents already written by earlier deployments.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Identifier of a user, unique within a snapshot.
pub type UserId = String;

/// Identifier of a contact, unique within its owning user.
pub type ContactId = String;

/// Contacts owned by one user, keyed by contact id.
pub type ContactMap = HashMap<ContactId, Contact>;

/// Validation failures detected before a write reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// User is stored in a snapshot under a key different from its own id.
    UserKeyMismatch { key: UserId, user_id: UserId },
    /// Contact is filed under a map key different from its own id.
    ContactKeyMismatch { key: ContactId, contact_id: ContactId },
    /// Contact embedded in a user points at another owner.
    ContactOwnerMismatch {
        contact_id: ContactId,
        expected: UserId,
        actual: UserId,
    },
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserKeyMismatch { key, user_id } => {
                write!(f, "user `{user_id}` is stored under mismatching key `{key}`")
            }
            Self::ContactKeyMismatch { key, contact_id } => write!(
                f,
                "contact `{contact_id}` is stored under mismatching key `{key}`"
            ),
            Self::ContactOwnerMismatch {
                contact_id,
                expected,
                actual,
            } => write!(
                f,
                "contact `{contact_id}` belongs to user `{actual}`, expected `{expected}`"
            ),
        }
    }
}

impl Error for UserValidationError {}

/// Contact record owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename = "ID")]
    pub id: ContactId,
    #[serde(rename = "Email")]
    pub email: String,
    /// Back-reference to the owning user. Must resolve at write time.
    #[serde(rename = "UserID")]
    pub user_id: UserId,
}

impl Contact {
    /// Creates a contact with a generated id for the given owner.
    pub fn new(user_id: impl Into<UserId>, email: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), user_id, email)
    }

    /// Creates a contact with a caller-provided id.
    pub fn with_id(
        id: impl Into<ContactId>,
        user_id: impl Into<UserId>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            user_id: user_id.into(),
        }
    }
}

/// User record and the contacts it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "ID")]
    pub id: UserId,
    #[serde(rename = "Name")]
    pub name: String,
    /// Missing or `null` in a stored document decodes as empty.
    #[serde(rename = "Contacts", default, deserialize_with = "null_as_empty")]
    pub contacts: ContactMap,
}

impl User {
    /// Creates a user with a generated id and no contacts.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), name)
    }

    /// Creates a user with a caller-provided id and no contacts.
    pub fn with_id(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            contacts: ContactMap::new(),
        }
    }

    /// Adds a new contact owned by this user and returns its generated id.
    pub fn add_contact(&mut self, email: impl Into<String>) -> ContactId {
        let contact = Contact::new(self.id.clone(), email);
        let id = contact.id.clone();
        self.contacts.insert(id.clone(), contact);
        id
    }

    /// Inserts or replaces a contact keyed by its own id.
    ///
    /// Returns the replaced contact, if any. Ownership is not rewritten;
    /// `validate` reports a foreign `user_id`.
    pub fn insert_contact(&mut self, contact: Contact) -> Option<Contact> {
        self.contacts.insert(contact.id.clone(), contact)
    }

    /// Checks that every embedded contact is filed under its own id and
    /// owned by this user.
    pub fn validate(&self) -> Result<(), UserValidationError> {
        for (key, contact) in &self.contacts {
            if key != &contact.id {
                return Err(UserValidationError::ContactKeyMismatch {
                    key: key.clone(),
                    contact_id: contact.id.clone(),
                });
            }
            if contact.user_id != self.id {
                return Err(UserValidationError::ContactOwnerMismatch {
                    contact_id: contact.id.clone(),
                    expected: self.id.clone(),
                    actual: contact.user_id.clone(),
                });
            }
        }

        Ok(())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<ContactMap, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<ContactMap>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::{Contact, User, UserValidationError};

    #[test]
    fn add_contact_files_contact_under_owner() {
        let mut user = User::with_id("u1", "Alice");
        let contact_id = user.add_contact("alice@example.com");

        let contact = &user.contacts[&contact_id];
        assert_eq!(contact.user_id, "u1");
        assert_eq!(contact.email, "alice@example.com");
        assert!(user.validate().is_ok());
    }

    #[test]
    fn validate_rejects_misfiled_contact() {
        let mut user = User::with_id("u1", "Alice");
        user.contacts
            .insert("wrong".to_string(), Contact::with_id("c1", "u1", "a@x.com"));

        assert_eq!(
            user.validate().unwrap_err(),
            UserValidationError::ContactKeyMismatch {
                key: "wrong".to_string(),
                contact_id: "c1".to_string(),
            }
        );
    }

    #[test]
    fn validate_rejects_foreign_owner() {
        let mut user = User::with_id("u1", "Alice");
        user.insert_contact(Contact::with_id("c1", "u2", "a@x.com"));

        assert_eq!(
            user.validate().unwrap_err(),
            UserValidationError::ContactOwnerMismatch {
                contact_id: "c1".to_string(),
                expected: "u1".to_string(),
                actual: "u2".to_string(),
            }
        );
    }

    #[test]
    fn validate_accepts_empty_ids() {
        let mut user = User::with_id("", "Nameless");
        user.insert_contact(Contact::with_id("", "", "a@x.com"));
        assert!(user.validate().is_ok());
    }
}
