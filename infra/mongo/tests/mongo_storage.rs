//! Runs against a live deployment: `MONGODB_URI=mongodb://localhost:27017 cargo test -- --ignored`.

use accounts_mongo::MongoStorage;
use accounts_server::storage::{SessionStorage, UserStorage};
use accounts_server::{ConnectionInfo, NewUser, StorageError};
use std::time::{SystemTime, UNIX_EPOCH};

async fn storage() -> MongoStorage {
    let uri = std::env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".into());
    let suffix = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    MongoStorage::builder()
        .uri(uri)
        .database(format!("accounts-test-{suffix}"))
        .init()
        .await
        .expect("connect to MongoDB")
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn users_and_sessions_round_trip() {
    let storage = storage().await;

    let id = storage
        .create_user(NewUser {
            username: Some("alice".into()),
            email: Some("Alice@Example.com".into()),
            password_hash: Some("hash".into()),
        })
        .await
        .unwrap();
    let user = storage.find_user_by_email("alice@example.com").await.unwrap().unwrap();
    assert_eq!(user.id, id);
    assert_eq!(storage.find_password_hash(&id).await.unwrap().as_deref(), Some("hash"));

    storage.set_password_hash(&id, "new-hash").await.unwrap();
    assert_eq!(storage.find_password_hash(&id).await.unwrap().as_deref(), Some("new-hash"));

    let session = storage.create_session(&id, "token-1", &ConnectionInfo::default()).await.unwrap();
    storage.invalidate_session(&session).await.unwrap();
    assert!(!storage.find_session_by_token("token-1").await.unwrap().unwrap().valid);

    storage.database().drop().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn unique_indexes_reject_duplicates() {
    let storage = storage().await;
    let alice = || NewUser { username: Some("alice".into()), ..NewUser::default() };

    // Users without email must not collide on the sparse email index.
    storage.create_user(alice()).await.unwrap();
    storage.create_user(NewUser { username: Some("bob".into()), ..NewUser::default() }).await.unwrap();

    let err = storage.create_user(alice()).await.unwrap_err();
    assert!(matches!(err, StorageError::Duplicate { .. }));

    storage.database().drop().await.unwrap();
}
