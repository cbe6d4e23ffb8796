use accounts_domain::config::AccountsConfig;
use accounts_server::storage::UserStorage;
use accounts_server::{
    AccountsServer, AuthenticationService, ConnectionInfo, DatabaseManager, MemoryStorage,
    NewUser, ServerError, ServerOptions, ServicesMap, User,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::any::Any;
use std::sync::{Arc, OnceLock};

/// Accepts any known username, no secret required.
#[derive(Debug, Default)]
struct UsernameService {
    store: OnceLock<DatabaseManager>,
}

#[async_trait]
impl AuthenticationService for UsernameService {
    fn service_name(&self) -> &'static str {
        "username"
    }

    fn set_store(&self, store: DatabaseManager) {
        let _ = self.store.set(store);
    }

    async fn authenticate(&self, params: Value) -> Result<Option<User>, ServerError> {
        let store = self.store.get().ok_or("store not set")?;
        let username = params["username"].as_str().unwrap_or_default();
        Ok(store.find_user_by_username(username).await?)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

async fn setup() -> AccountsServer {
    setup_with(AccountsConfig::with_secret("secret")).await
}

async fn setup_with(config: AccountsConfig) -> AccountsServer {
    let db = DatabaseManager::from_storage(Arc::new(MemoryStorage::new()));
    db.create_user(NewUser { username: Some("alice".into()), ..NewUser::default() })
        .await
        .unwrap();

    let mut services = ServicesMap::new();
    services.insert("username".into(), Arc::new(UsernameService::default()));

    AccountsServer::new(ServerOptions::new(config, db), services).unwrap()
}

fn info() -> ConnectionInfo {
    ConnectionInfo { ip: Some("10.0.0.1".into()), user_agent: Some("tests".into()) }
}

#[tokio::test]
async fn login_resume_refresh_logout() {
    let server = setup().await;

    let login = server
        .login_with_service("username", json!({ "username": "alice" }), info())
        .await
        .unwrap();
    assert_eq!(login.user.username.as_deref(), Some("alice"));

    let resumed = server.resume_session(&login.tokens.access_token).await.unwrap();
    assert_eq!(resumed.id, login.user.id);

    let refreshed = server
        .refresh_tokens(&login.tokens.access_token, &login.tokens.refresh_token, info())
        .await
        .unwrap();
    assert_eq!(refreshed.session_id, login.session_id);

    server.logout(&refreshed.tokens.access_token).await.unwrap();
    let err = server.resume_session(&login.tokens.access_token).await.unwrap_err();
    assert!(matches!(err, ServerError::InvalidSession { .. }));
}

#[tokio::test]
async fn unknown_user_is_an_invalid_credential() {
    let server = setup().await;
    let err = server
        .login_with_service("username", json!({ "username": "mallory" }), info())
        .await
        .unwrap_err();
    assert!(matches!(err, ServerError::InvalidCredentials { .. }));
    assert_eq!(err.to_string(), "Invalid credentials");
}

#[tokio::test]
async fn unmatched_login_without_reason_stays_generic() {
    let config =
        AccountsConfig { ambiguous_error_messages: false, ..AccountsConfig::with_secret("secret") };
    let server = setup_with(config).await;
    let err = server
        .login_with_service("username", json!({ "username": "mallory" }), info())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid credentials");
}

#[tokio::test]
async fn unknown_service_is_reported() {
    let server = setup().await;
    let err = server.login_with_service("oauth", json!({}), info()).await.unwrap_err();
    assert!(matches!(err, ServerError::ServiceNotFound { .. }));
    assert_eq!(err.to_string(), "Service 'oauth' is not registered");
}

#[tokio::test]
async fn mismatched_token_pairs_are_rejected() {
    let server = setup().await;
    let first = server
        .login_with_service("username", json!({ "username": "alice" }), info())
        .await
        .unwrap();
    let second = server
        .login_with_service("username", json!({ "username": "alice" }), info())
        .await
        .unwrap();

    let err = server
        .refresh_tokens(&first.tokens.access_token, &second.tokens.refresh_token, info())
        .await
        .unwrap_err();
    assert!(matches!(err, ServerError::InvalidSession { .. }));
}

#[tokio::test]
async fn services_are_reachable_by_type() {
    let server = setup().await;
    assert!(server.service_as::<UsernameService>("username").is_some());
    assert!(server.service("password").is_none());
    assert!(server.find_user_by_id("missing").await.unwrap().is_none());
}

#[test]
fn blank_secret_is_rejected() {
    let db = DatabaseManager::from_storage(Arc::new(MemoryStorage::new()));
    let err = AccountsServer::new(
        ServerOptions::new(AccountsConfig::with_secret("  "), db),
        ServicesMap::new(),
    )
    .unwrap_err();
    assert!(matches!(err, ServerError::Config { .. }));
}
