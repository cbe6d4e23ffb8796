//! # Password service
//!
//! Username/email + password authentication for the accounts server. Hashes are argon2id
//! PHC strings computed off the async runtime.

mod error;
mod hashing;

pub use crate::error::{PasswordError, PasswordErrorExt};

use accounts_server::storage::{SessionStorage, UserStorage};
use accounts_server::{AuthenticationService, DatabaseManager, NewUser, ServerError, User};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::any::Any;
use std::sync::OnceLock;
use tracing::{debug, info};

/// Name the service registers under.
pub const SERVICE_NAME: &str = "password";

const DEFAULT_MINIMUM_PASSWORD_LENGTH: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PasswordOptions {
    pub minimum_password_length: usize,
    /// Invalidates every session of a user whose password changed.
    pub invalidate_sessions_on_password_change: bool,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            minimum_password_length: DEFAULT_MINIMUM_PASSWORD_LENGTH,
            invalidate_sessions_on_password_change: false,
        }
    }
}

/// Identifies the account a password belongs to. The first set key wins: id, username, email.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSelector {
    pub id: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Parameters of a password login.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordLogin {
    pub user: UserSelector,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Default)]
pub struct PasswordService {
    options: PasswordOptions,
    store: OnceLock<DatabaseManager>,
}

impl PasswordService {
    #[must_use]
    pub fn new(options: PasswordOptions) -> Self {
        Self { options, store: OnceLock::new() }
    }

    #[must_use]
    pub const fn options(&self) -> &PasswordOptions {
        &self.options
    }

    /// Registers a new account and returns its id.
    pub async fn create_user(&self, user: CreateUser) -> Result<String, PasswordError> {
        let store = self.store()?;
        let username = user.username.map(|u| u.trim().to_owned()).filter(|u| !u.is_empty());
        let email = user.email.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty());

        if username.is_none() && email.is_none() {
            return Err(validation("Username or email is required"));
        }
        if email.as_ref().is_some_and(|e| !is_email(e)) {
            return Err(validation("Email is not valid"));
        }
        self.check_password(&user.password)?;

        if let Some(username) = &username {
            if store.find_user_by_username(username).await?.is_some() {
                return Err(PasswordError::UserExists {
                    message: "Username already exists".into(),
                    context: None,
                });
            }
        }
        if let Some(email) = &email {
            if store.find_user_by_email(email).await?.is_some() {
                return Err(PasswordError::UserExists {
                    message: "Email already exists".into(),
                    context: None,
                });
            }
        }

        let password_hash = hashing::hash(user.password).await?;
        let id = store
            .create_user(NewUser { username, email, password_hash: Some(password_hash) })
            .await
            .context("Creating user")?;
        info!(user_id = %id, "User created");
        Ok(id)
    }

    /// Checks a password login and returns the matching user.
    pub async fn verify(&self, login: PasswordLogin) -> Result<User, PasswordError> {
        let store = self.store()?;
        let user = self.find_user(store, &login.user).await?.ok_or(PasswordError::UserNotFound {
            context: None,
        })?;
        self.check_current(store, &user.id, login.password).await?;
        Ok(user)
    }

    /// Replaces a user's password after checking the current one.
    pub async fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), PasswordError> {
        let store = self.store()?;
        self.check_password(new_password)?;
        self.check_current(store, user_id, old_password.to_owned()).await?;

        let hash = hashing::hash(new_password.to_owned()).await?;
        store.set_password_hash(user_id, &hash).await.context("Storing password")?;
        if self.options.invalidate_sessions_on_password_change {
            store.invalidate_all_sessions(user_id).await.context("Invalidating sessions")?;
        }
        info!(user_id, "Password changed");
        Ok(())
    }

    fn store(&self) -> Result<&DatabaseManager, PasswordError> {
        self.store.get().ok_or_else(|| PasswordError::Internal {
            message: "Service is not attached to an accounts server".into(),
            context: None,
        })
    }

    fn check_password(&self, password: &str) -> Result<(), PasswordError> {
        if password.chars().count() < self.options.minimum_password_length {
            return Err(PasswordError::Validation {
                message: format!(
                    "Password must be at least {} characters",
                    self.options.minimum_password_length
                )
                .into(),
                context: None,
            });
        }
        Ok(())
    }

    async fn check_current(
        &self,
        store: &DatabaseManager,
        user_id: &str,
        password: String,
    ) -> Result<(), PasswordError> {
        let hash = store
            .find_password_hash(user_id)
            .await?
            .ok_or(PasswordError::NoPasswordSet { context: None })?;
        if hashing::verify(password, hash).await? {
            Ok(())
        } else {
            Err(PasswordError::IncorrectPassword { context: None })
        }
    }

    async fn find_user(
        &self,
        store: &DatabaseManager,
        selector: &UserSelector,
    ) -> Result<Option<User>, PasswordError> {
        let found = match selector {
            UserSelector { id: Some(id), .. } => store.find_user_by_id(id).await?,
            UserSelector { username: Some(username), .. } => {
                store.find_user_by_username(username).await?
            }
            UserSelector { email: Some(email), .. } => store.find_user_by_email(email).await?,
            _ => return Err(validation("A user id, username or email is required")),
        };
        Ok(found)
    }
}

#[async_trait]
impl AuthenticationService for PasswordService {
    fn service_name(&self) -> &'static str {
        SERVICE_NAME
    }

    fn set_store(&self, store: DatabaseManager) {
        if self.store.set(store).is_err() {
            debug!("Password service store already set, keeping the first one");
        }
    }

    async fn authenticate(&self, params: Value) -> Result<Option<User>, ServerError> {
        let login: PasswordLogin = serde_json::from_value(params).map_err(|e| {
            ServerError::Service { message: format!("Invalid login parameters: {e}").into(), context: None }
        })?;

        match self.verify(login).await {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                if e.is_credential_mismatch() {
                    debug!(reason = %e, "Password login rejected");
                }
                Err(e.into())
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn validation(message: &'static str) -> PasswordError {
    PasswordError::Validation { message: message.into(), context: None }
}

fn is_email(value: &str) -> bool {
    value.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    })
}
