//! Entity Store Lifecycle Tests
//!
//! Tests for the store's CRUD contract:
//! - Insert/get round-trip overwrites only the id
//! - Ids are strictly increasing and never reused
//! - Not-found and invalid-id errors
//! - On-disk format is stable and human-diffable
//! - Overlapping operations on one instance do not lose updates

use serde::{Deserialize, Serialize};
use shelfdb::descriptor::TypeDescriptor;
use shelfdb::store::{EntityId, EntityStore, StoreError};
use std::sync::Arc;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    #[serde(default)]
    id: EntityId,
    name: String,
    age: u32,
}

shelfdb::impl_identifiable!(User);

fn user(name: &str, age: u32) -> User {
    User {
        id: 0,
        name: name.to_string(),
        age,
    }
}

fn user_descriptor() -> TypeDescriptor {
    TypeDescriptor::shape([
        ("name", TypeDescriptor::string()),
        ("age", TypeDescriptor::number()),
    ])
}

async fn setup_store() -> (TempDir, EntityStore<User>) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let tmp = TempDir::new().unwrap();
    let store = EntityStore::new(tmp.path().join("users.json"), user_descriptor()).unwrap();
    store.initialize().await.unwrap();
    (tmp, store)
}

// =============================================================================
// Scenario Tests
// =============================================================================

/// Insert, read, update, delete one record end to end.
#[tokio::test]
async fn test_crud_scenario() {
    let (_tmp, store) = setup_store().await;

    let id = store.insert(user("Ann", 30)).await.unwrap();
    assert_eq!(id, 1);

    let all = store.get_all().await.unwrap();
    assert_eq!(
        all,
        vec![User {
            id: 1,
            name: "Ann".into(),
            age: 30
        }]
    );

    store
        .update(User {
            id: 1,
            name: "Ann".into(),
            age: 31,
        })
        .await
        .unwrap();
    assert_eq!(store.get_by_id(1).await.unwrap().age, 31);

    store.delete(1).await.unwrap();
    assert!(store.get_all().await.unwrap().is_empty());
    assert!(matches!(
        store.get_by_id(1).await,
        Err(StoreError::EntityNotFound { id: 1, .. })
    ));
}

/// The inserted value comes back equal except for the assigned id.
#[tokio::test]
async fn test_insert_get_round_trip() {
    let (_tmp, store) = setup_store().await;

    let mut original = user("Bob", 52);
    original.id = 999; // overwritten
    let id = store.insert(original.clone()).await.unwrap();

    let stored = store.get_by_id(id).await.unwrap();
    assert_eq!(stored, User { id, ..original });
}

// =============================================================================
// Id Lifecycle Tests
// =============================================================================

/// Ids strictly increase and are never reused, even across deletes.
#[tokio::test]
async fn test_ids_monotonic_across_deletes() {
    let (_tmp, store) = setup_store().await;

    let mut issued = Vec::new();
    for round in 0..5u32 {
        let a = store.insert(user("a", round)).await.unwrap();
        let b = store.insert(user("b", round)).await.unwrap();
        store.delete(a).await.unwrap();
        issued.push(a);
        issued.push(b);
    }

    assert!(issued.windows(2).all(|w| w[0] < w[1]));

    // deleting the newest record does not make its id available again
    let last = *issued.last().unwrap();
    store.delete(last).await.unwrap();
    assert!(store.insert(user("c", 0)).await.unwrap() > last);
}

/// A restarted store continues from the persisted counter.
#[tokio::test]
async fn test_counter_survives_restart() {
    let (tmp, store) = setup_store().await;
    store.insert(user("a", 1)).await.unwrap();
    let second = store.insert(user("b", 2)).await.unwrap();
    store.delete(second).await.unwrap();
    drop(store);

    let reopened = EntityStore::<User>::new(tmp.path().join("users.json"), user_descriptor()).unwrap();
    reopened.initialize().await.unwrap();
    assert_eq!(reopened.insert(user("c", 3)).await.unwrap(), second + 1);
}

// =============================================================================
// Error Contract Tests
// =============================================================================

/// Operations on ids that were never issued yield EntityNotFound.
#[tokio::test]
async fn test_never_inserted_id_not_found() {
    let (_tmp, store) = setup_store().await;
    store.insert(user("a", 1)).await.unwrap();

    assert!(store.get_by_id(77).await.unwrap_err().is_not_found());
    assert!(store.delete(77).await.unwrap_err().is_not_found());

    let mut stranger = user("x", 0);
    stranger.id = 77;
    assert!(store.update(stranger).await.unwrap_err().is_not_found());

    // the failed mutations left the document untouched
    assert_eq!(store.get_all().await.unwrap().len(), 1);
}

/// Id zero is rejected before any I/O.
#[tokio::test]
async fn test_zero_id_invalid() {
    let (_tmp, store) = setup_store().await;
    let before = std::fs::read_to_string(store.path()).unwrap();

    assert_eq!(store.get_by_id(0).await.unwrap_err().code(), "SHELF_INVALID_ID");
    assert_eq!(store.delete(0).await.unwrap_err().code(), "SHELF_INVALID_ID");
    assert_eq!(store.update(user("a", 1)).await.unwrap_err().code(), "SHELF_INVALID_ID");

    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
}

/// A record that no longer matches the descriptor makes every read fail.
#[tokio::test]
async fn test_nonconforming_record_rejected_on_read() {
    let (_tmp, store) = setup_store().await;
    std::fs::write(
        store.path(),
        r#"{"nextId": 2, "items": [{"id": 1, "name": "a", "age": "old"}]}"#,
    )
    .unwrap();

    let err = store.get_all().await.unwrap_err();
    assert_eq!(err.code(), "SHELF_CONFORMANCE");
    assert!(err.to_string().contains("$.items[0].age"));
}

// =============================================================================
// On-Disk Format Tests
// =============================================================================

/// Field order, indentation and insertion order are stable.
#[tokio::test]
async fn test_document_format() {
    let (_tmp, store) = setup_store().await;
    store.insert(user("Ann", 30)).await.unwrap();
    store.insert(user("Bob", 40)).await.unwrap();

    let text = std::fs::read_to_string(store.path()).unwrap();
    let expected = r#"{
    "nextId": 3,
    "items": [
        {
            "id": 1,
            "name": "Ann",
            "age": 30
        },
        {
            "id": 2,
            "name": "Bob",
            "age": 40
        }
    ]
}
"#;
    assert_eq!(text, expected);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

/// Overlapping inserts on one instance all land, with distinct ids.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_inserts_not_lost() {
    let (_tmp, store) = setup_store().await;
    let store = Arc::new(store);

    let mut handles = Vec::new();
    for i in 0..16u32 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.insert(user(&format!("u{}", i), i)).await.unwrap()
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort_unstable();
    assert_eq!(ids, (1..=16).collect::<Vec<EntityId>>());
    assert_eq!(store.get_all().await.unwrap().len(), 16);
}

/// Overlapping update and delete on one instance both take effect.
#[tokio::test]
async fn test_concurrent_update_and_delete() {
    let (_tmp, store) = setup_store().await;
    let a = store.insert(user("a", 1)).await.unwrap();
    let b = store.insert(user("b", 2)).await.unwrap();

    let (updated, deleted) = tokio::join!(
        store.update(User {
            id: a,
            name: "a".into(),
            age: 10
        }),
        store.delete(b),
    );
    updated.unwrap();
    deleted.unwrap();

    let all = store.get_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].age, 10);
}
