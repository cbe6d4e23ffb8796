//! Storage contracts the authentication server relies on.
//!
//! A storage driver implements both [`UserStorage`] and [`SessionStorage`]; the server talks
//! to them through a [`DatabaseManager`], which may route users and sessions to different
//! backends.

mod memory;

pub use memory::MemoryStorage;

use crate::types::{ConnectionInfo, NewUser, Session, User};
use async_trait::async_trait;
use std::borrow::Cow;
use std::fmt::Debug;
use std::sync::Arc;

#[accounts_derive::accounts_error]
pub enum StorageError {
    /// The backend could not be reached.
    #[error("Storage connection failed{}: {message}", format_context(.context))]
    Connection { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A read or write was rejected by the backend.
    #[error("Storage query failed{}: {message}", format_context(.context))]
    Query { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A uniqueness constraint (username, email, session token) was violated.
    #[error("Duplicate record{}: {message}", format_context(.context))]
    Duplicate { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal storage error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

#[async_trait]
pub trait UserStorage: Debug + Send + Sync {
    /// Stores the user and returns its id.
    async fn create_user(&self, user: NewUser) -> Result<String, StorageError>;

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StorageError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError>;

    /// Case-insensitive lookup.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError>;

    async fn find_password_hash(&self, user_id: &str) -> Result<Option<String>, StorageError>;

    async fn set_password_hash(&self, user_id: &str, hash: &str) -> Result<(), StorageError>;
}

#[async_trait]
pub trait SessionStorage: Debug + Send + Sync {
    /// Opens a valid session and returns its id.
    async fn create_session(
        &self,
        user_id: &str,
        token: &str,
        info: &ConnectionInfo,
    ) -> Result<String, StorageError>;

    async fn find_session_by_id(&self, id: &str) -> Result<Option<Session>, StorageError>;

    async fn find_session_by_token(&self, token: &str) -> Result<Option<Session>, StorageError>;

    /// Records the latest connection info and bumps `updated_at`.
    async fn update_session(&self, id: &str, info: &ConnectionInfo) -> Result<(), StorageError>;

    async fn invalidate_session(&self, id: &str) -> Result<(), StorageError>;

    async fn invalidate_all_sessions(&self, user_id: &str) -> Result<(), StorageError>;
}

/// A backend usable as both user and session storage.
pub trait Storage: UserStorage + SessionStorage {}

impl<T: UserStorage + SessionStorage + ?Sized> Storage for T {}

/// Routes user and session operations to their stores.
#[derive(Debug, Clone)]
pub struct DatabaseManager {
    users: Arc<dyn UserStorage>,
    sessions: Arc<dyn SessionStorage>,
}

impl DatabaseManager {
    pub fn new(users: Arc<dyn UserStorage>, sessions: Arc<dyn SessionStorage>) -> Self {
        Self { users, sessions }
    }

    /// Uses one backend for both users and sessions.
    pub fn from_storage(storage: Arc<dyn Storage>) -> Self {
        let users: Arc<dyn UserStorage> = storage.clone();
        let sessions: Arc<dyn SessionStorage> = storage;
        Self::new(users, sessions)
    }
}

#[async_trait]
impl UserStorage for DatabaseManager {
    async fn create_user(&self, user: NewUser) -> Result<String, StorageError> {
        self.users.create_user(user).await
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StorageError> {
        self.users.find_user_by_id(id).await
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        self.users.find_user_by_username(username).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        self.users.find_user_by_email(email).await
    }

    async fn find_password_hash(&self, user_id: &str) -> Result<Option<String>, StorageError> {
        self.users.find_password_hash(user_id).await
    }

    async fn set_password_hash(&self, user_id: &str, hash: &str) -> Result<(), StorageError> {
        self.users.set_password_hash(user_id, hash).await
    }
}

#[async_trait]
impl SessionStorage for DatabaseManager {
    async fn create_session(
        &self,
        user_id: &str,
        token: &str,
        info: &ConnectionInfo,
    ) -> Result<String, StorageError> {
        self.sessions.create_session(user_id, token, info).await
    }

    async fn find_session_by_id(&self, id: &str) -> Result<Option<Session>, StorageError> {
        self.sessions.find_session_by_id(id).await
    }

    async fn find_session_by_token(&self, token: &str) -> Result<Option<Session>, StorageError> {
        self.sessions.find_session_by_token(token).await
    }

    async fn update_session(&self, id: &str, info: &ConnectionInfo) -> Result<(), StorageError> {
        self.sessions.update_session(id, info).await
    }

    async fn invalidate_session(&self, id: &str) -> Result<(), StorageError> {
        self.sessions.invalidate_session(id).await
    }

    async fn invalidate_all_sessions(&self, user_id: &str) -> Result<(), StorageError> {
        self.sessions.invalidate_all_sessions(user_id).await
    }
}
