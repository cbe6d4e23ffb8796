use crate::error::ServerError;
use crate::storage::DatabaseManager;
use crate::types::User;
use async_trait::async_trait;
use serde_json::Value;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

/// A pluggable way of proving who a user is (password, magic link, OAuth, ...).
///
/// The server hands every registered service its [`DatabaseManager`] once, when it is built.
#[async_trait]
pub trait AuthenticationService: Any + Debug + Send + Sync {
    /// Key the service is registered and addressed under.
    fn service_name(&self) -> &'static str;

    fn set_store(&self, store: DatabaseManager);

    /// Checks service-specific credentials.
    ///
    /// `Ok(None)` or [`ServerError::InvalidCredentials`] means the credentials did not match a
    /// user. The server decides whether the reason reaches the caller.
    async fn authenticate(&self, params: Value) -> Result<Option<User>, ServerError>;

    fn as_any(&self) -> &dyn Any;
}

/// Registered services keyed by [`AuthenticationService::service_name`].
pub type ServicesMap = BTreeMap<String, Arc<dyn AuthenticationService>>;
