//! # Accounts server
//!
//! The authentication core the bootstrap wires up: a registry of [`AuthenticationService`]s,
//! session bookkeeping on top of a [`DatabaseManager`] and HS256 access/refresh token pairs.
//!
//! ```rust,ignore
//! let db = DatabaseManager::from_storage(Arc::new(MemoryStorage::new()));
//! let server = AccountsServer::new(ServerOptions::new(config, db), services)?;
//! let login = server.login_with_service("password", params, ConnectionInfo::default()).await?;
//! let user = server.resume_session(&login.tokens.access_token).await?;
//! ```

mod error;
mod service;
pub mod storage;
mod tokens;
pub mod types;

pub use crate::error::{ServerError, ServerErrorExt};
pub use crate::service::{AuthenticationService, ServicesMap};
pub use crate::storage::{DatabaseManager, MemoryStorage, StorageError};
pub use crate::tokens::generate_secret;
pub use crate::types::{ConnectionInfo, EmailRecord, LoginResult, NewUser, Session, Tokens, User};

use crate::storage::{SessionStorage, UserStorage};
use crate::tokens::{TokenIssuer, TokenKind, generate_session_token};
use accounts_domain::config::AccountsConfig;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info, instrument};

const AMBIGUOUS_CREDENTIALS: &str = "Invalid credentials";

/// Everything [`AccountsServer::new`] needs besides the services.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    pub config: AccountsConfig,
    pub db: DatabaseManager,
}

impl ServerOptions {
    #[must_use]
    pub const fn new(config: AccountsConfig, db: DatabaseManager) -> Self {
        Self { config, db }
    }
}

#[derive(Debug)]
pub struct AccountsServer {
    config: AccountsConfig,
    db: DatabaseManager,
    services: ServicesMap,
    tokens: TokenIssuer,
}

impl AccountsServer {
    /// Builds the server and hands each service the database manager.
    ///
    /// # Errors
    /// [`ServerError::Config`] when the token secret is blank.
    pub fn new(options: ServerOptions, services: ServicesMap) -> Result<Self, ServerError> {
        let ServerOptions { config, db } = options;
        if config.token_secret.trim().is_empty() {
            return Err(ServerError::Config {
                message: "token_secret cannot be empty".into(),
                context: None,
            });
        }

        for service in services.values() {
            service.set_store(db.clone());
        }
        info!(services = ?services.keys().collect::<Vec<_>>(), "Accounts server initialized");

        let tokens = TokenIssuer::new(&config);
        Ok(Self { config, db, services, tokens })
    }

    #[must_use]
    pub const fn config(&self) -> &AccountsConfig {
        &self.config
    }

    #[must_use]
    pub const fn db(&self) -> &DatabaseManager {
        &self.db
    }

    #[must_use]
    pub const fn services(&self) -> &ServicesMap {
        &self.services
    }

    #[must_use]
    pub fn service(&self, name: &str) -> Option<&Arc<dyn AuthenticationService>> {
        self.services.get(name)
    }

    /// The service registered under `name`, downcast to its concrete type.
    #[must_use]
    pub fn service_as<T: AuthenticationService>(&self, name: &str) -> Option<&T> {
        self.service(name)?.as_any().downcast_ref::<T>()
    }

    /// Authenticates through `service_name` and opens a session for the user.
    #[instrument(skip(self, params, info), err)]
    pub async fn login_with_service(
        &self,
        service_name: &str,
        params: Value,
        info: ConnectionInfo,
    ) -> Result<LoginResult, ServerError> {
        let service = self.service(service_name).ok_or_else(|| ServerError::ServiceNotFound {
            message: service_name.to_owned().into(),
            context: None,
        })?;

        let user = match service.authenticate(params).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(self.rejected(None)),
            Err(ServerError::InvalidCredentials { message, .. }) => {
                return Err(self.rejected(Some(message)));
            }
            Err(e) => return Err(e),
        };
        if user.deactivated {
            return Err(ServerError::InvalidCredentials {
                message: "Your account has been deactivated".into(),
                context: None,
            });
        }

        self.login_user(user, info).await
    }

    /// Credential mismatches only carry the service's reason when ambiguous messages are off.
    fn rejected(&self, reason: Option<Cow<'static, str>>) -> ServerError {
        let message = match reason {
            Some(reason) if !self.config.ambiguous_error_messages => reason,
            _ => AMBIGUOUS_CREDENTIALS.into(),
        };
        ServerError::InvalidCredentials { message, context: None }
    }

    /// Opens a session for an already authenticated user.
    pub async fn login_user(
        &self,
        user: User,
        info: ConnectionInfo,
    ) -> Result<LoginResult, ServerError> {
        let token = generate_session_token()?;
        let session_id =
            self.db.create_session(&user.id, &token, &info).await.context("Opening session")?;
        let tokens = self.tokens.issue(&user.id, &token)?;

        info!(user_id = %user.id, session_id = %session_id, "User logged in");
        Ok(LoginResult { session_id, tokens, user })
    }

    /// Resolves the user behind a live access token.
    pub async fn resume_session(&self, access_token: &str) -> Result<User, ServerError> {
        let claims = self.tokens.verify(access_token, TokenKind::Access, true)?;
        let session = self.live_session(&claims.sid, &claims.sub).await?;
        let user = self.session_user(&session.user_id).await?;
        if user.deactivated {
            return Err(ServerError::invalid_session("User is deactivated"));
        }
        Ok(user)
    }

    /// Trades a token pair for a fresh one on the same session.
    ///
    /// The access token may be expired, the refresh token may not.
    #[instrument(skip_all, err)]
    pub async fn refresh_tokens(
        &self,
        access_token: &str,
        refresh_token: &str,
        info: ConnectionInfo,
    ) -> Result<LoginResult, ServerError> {
        let refresh = self.tokens.verify(refresh_token, TokenKind::Refresh, true)?;
        let access = self.tokens.verify(access_token, TokenKind::Access, false)?;
        if refresh.sid != access.sid || refresh.sub != access.sub {
            return Err(ServerError::invalid_session("Tokens belong to different sessions"));
        }

        let session = self.live_session(&refresh.sid, &refresh.sub).await?;
        let user = self.session_user(&session.user_id).await?;
        self.db.update_session(&session.id, &info).await.context("Refreshing session")?;
        let tokens = self.tokens.issue(&user.id, &session.token)?;

        debug!(session_id = %session.id, "Tokens refreshed");
        Ok(LoginResult { session_id: session.id, tokens, user })
    }

    /// Invalidates the session behind the access token.
    pub async fn logout(&self, access_token: &str) -> Result<(), ServerError> {
        let claims = self.tokens.verify(access_token, TokenKind::Access, true)?;
        let session = self.live_session(&claims.sid, &claims.sub).await?;
        self.db.invalidate_session(&session.id).await.context("Closing session")?;

        info!(user_id = %session.user_id, session_id = %session.id, "User logged out");
        Ok(())
    }

    pub async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, ServerError> {
        Ok(self.db.find_user_by_id(id).await?)
    }

    async fn live_session(&self, token: &str, user_id: &str) -> Result<Session, ServerError> {
        let session = self
            .db
            .find_session_by_token(token)
            .await?
            .ok_or_else(|| ServerError::invalid_session("Session not found"))?;
        if !session.valid {
            return Err(ServerError::invalid_session("Session is no longer valid"));
        }
        if session.user_id != user_id {
            return Err(ServerError::invalid_session("Session belongs to another user"));
        }
        Ok(session)
    }

    async fn session_user(&self, user_id: &str) -> Result<User, ServerError> {
        self.db.find_user_by_id(user_id).await?.ok_or_else(|| ServerError::UserNotFound {
            message: user_id.to_owned().into(),
            context: None,
        })
    }
}
