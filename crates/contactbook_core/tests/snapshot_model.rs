use contactbook_core::{
    Contact, Dataset, KvStore, MemoryKvStore, SnapshotRepository, User, USERS_KEY,
};

fn sample_dataset() -> Dataset {
    let mut alice = User::with_id("u1", "Alice");
    alice.insert_contact(Contact::with_id("c1", "u1", "alice@work.com"));
    alice.insert_contact(Contact::with_id("c2", "u1", "alice@home.com"));
    let bob = User::with_id("u2", "Bob");

    [alice, bob].into_iter().collect()
}

#[test]
fn encode_then_decode_reproduces_snapshot() {
    let dataset = sample_dataset();

    let decoded = Dataset::decode(&dataset.encode().unwrap()).unwrap();
    assert_eq!(decoded, dataset);
    assert_eq!(decoded.user("u1").unwrap().contacts.len(), 2);
}

#[test]
fn snapshot_document_uses_expected_wire_fields() {
    let bytes = sample_dataset().encode().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(json["u1"]["ID"], "u1");
    assert_eq!(json["u1"]["Name"], "Alice");
    assert_eq!(json["u1"]["Contacts"]["c1"]["Email"], "alice@work.com");
    assert_eq!(json["u1"]["Contacts"]["c1"]["UserID"], "u1");
    assert_eq!(json["u2"]["Contacts"], serde_json::json!({}));
}

#[test]
fn missing_or_null_contacts_decode_as_empty() {
    let bytes = serde_json::to_vec(&serde_json::json!({
        "u1": { "ID": "u1", "Name": "A" },
        "u2": { "ID": "u2", "Name": "B", "Contacts": null }
    }))
    .unwrap();

    let dataset = Dataset::decode(&bytes).unwrap();
    assert!(dataset.user("u1").unwrap().contacts.is_empty());
    assert!(dataset.user("u2").unwrap().contacts.is_empty());
}

#[test]
fn decode_rejects_user_stored_under_foreign_key() {
    let bytes = serde_json::to_vec(&serde_json::json!({
        "u1": { "ID": "u2", "Name": "B", "Contacts": null }
    }))
    .unwrap();

    let err = Dataset::decode(&bytes).unwrap_err();
    assert!(err.to_string().contains("mismatching key `u1`"));
}

#[test]
fn decode_rejects_misfiled_or_foreign_contact() {
    let misfiled = serde_json::to_vec(&serde_json::json!({
        "u1": {
            "ID": "u1",
            "Name": "A",
            "Contacts": { "c9": { "ID": "c1", "Email": "a@x.com", "UserID": "u1" } }
        }
    }))
    .unwrap();
    let err = Dataset::decode(&misfiled).unwrap_err();
    assert!(err.to_string().contains("mismatching key `c9`"));

    let foreign = serde_json::to_vec(&serde_json::json!({
        "u1": {
            "ID": "u1",
            "Name": "A",
            "Contacts": { "c1": { "ID": "c1", "Email": "a@x.com", "UserID": "u2" } }
        }
    }))
    .unwrap();
    assert!(Dataset::decode(&foreign).is_err());
}

#[test]
fn generated_ids_are_unique_and_owned() {
    let mut user = User::new("Carol");
    let first = user.add_contact("one@x.com");
    let second = user.add_contact("two@x.com");

    assert!(!user.id.is_empty());
    assert_ne!(first, second);
    assert!(user.contacts.values().all(|contact| contact.user_id == user.id));
    assert!(user.validate().is_ok());

    let standalone = Contact::new(user.id.clone(), "three@x.com");
    assert_eq!(standalone.user_id, user.id);
    assert!(!standalone.id.is_empty());
}

#[test]
fn repository_load_distinguishes_absent_key() {
    let store = MemoryKvStore::new();
    let repo = SnapshotRepository::new(store.clone());

    let loaded = repo.load().unwrap();
    assert!(loaded.dataset.is_empty());
    assert!(loaded.raw.is_none());

    let dataset = sample_dataset();
    repo.save(&dataset).unwrap();
    let loaded = repo.load().unwrap();
    assert_eq!(loaded.dataset, dataset);
    assert_eq!(loaded.raw, store.get(USERS_KEY).unwrap());

    assert!(repo.remove().unwrap());
    assert!(!repo.remove().unwrap());
}

#[test]
fn repository_conditional_save_rejects_stale_expectation() {
    let repo = SnapshotRepository::new(MemoryKvStore::new());
    let dataset = sample_dataset();

    assert!(repo.save_if_unchanged(&dataset, None).unwrap());
    assert!(!repo.save_if_unchanged(&Dataset::new(), None).unwrap());

    let raw = repo.load().unwrap().raw;
    assert!(repo.save_if_unchanged(&Dataset::new(), raw.as_deref()).unwrap());
    assert!(repo.load().unwrap().dataset.is_empty());
}
