//! Read-only view projections.
//!
//! # Responsibility
//! - Flatten storage records into response-shaped views.
//!
//! # Invariants
//! - Projection is pure: no store access, no mutation of the source.
//! - `UserView::contacts` follows map iteration order, which is unspecified.
//!   Callers must compare contact views as a set.

use crate::model::dataset::Dataset;
use crate::model::user::{Contact, ContactId, User, UserId};
use serde::{Deserialize, Serialize};

/// Contact as seen from its parent `UserView`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContactView {
    #[serde(rename = "ID")]
    pub id: ContactId,
    #[serde(rename = "Email")]
    pub email: String,
}

/// User with its contacts flattened into a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    #[serde(rename = "ID")]
    pub id: UserId,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Contacts")]
    pub contacts: Vec<ContactView>,
}

impl From<&Contact> for ContactView {
    fn from(contact: &Contact) -> Self {
        Self {
            id: contact.id.clone(),
            email: contact.email.clone(),
        }
    }
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            contacts: user.contacts.values().map(ContactView::from).collect(),
        }
    }
}

/// Projects every user in the snapshot. Empty snapshot yields an empty vec.
pub fn project_users(dataset: &Dataset) -> Vec<UserView> {
    dataset.users().map(UserView::from).collect()
}

#[cfg(test)]
mod tests {
    use super::{project_users, ContactView, UserView};
    use crate::model::dataset::Dataset;
    use crate::model::user::{Contact, User};
    use std::collections::HashSet;

    #[test]
    fn user_view_flattens_contacts_without_back_reference() {
        let mut user = User::with_id("u1", "A");
        user.insert_contact(Contact::with_id("c1", "u1", "one@x.com"));
        user.insert_contact(Contact::with_id("c2", "u1", "two@x.com"));

        let view = UserView::from(&user);
        assert_eq!(view.id, "u1");
        assert_eq!(view.name, "A");

        let contacts: HashSet<ContactView> = view.contacts.into_iter().collect();
        let expected: HashSet<ContactView> = [
            ContactView {
                id: "c1".to_string(),
                email: "one@x.com".to_string(),
            },
            ContactView {
                id: "c2".to_string(),
                email: "two@x.com".to_string(),
            },
        ]
        .into_iter()
        .collect();
        assert_eq!(contacts, expected);
    }

    #[test]
    fn project_users_on_empty_snapshot_is_empty() {
        assert!(project_users(&Dataset::new()).is_empty());
    }

    #[test]
    fn view_serializes_without_user_reference() {
        let mut user = User::with_id("u1", "A");
        user.insert_contact(Contact::with_id("c1", "u1", "a@x.com"));

        let json = serde_json::to_value(UserView::from(&user)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "ID": "u1",
                "Name": "A",
                "Contacts": [{ "ID": "c1", "Email": "a@x.com" }]
            })
        );
    }
}
