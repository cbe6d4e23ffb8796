//! # MongoDB storage
//!
//! User and session storage for the accounts server on top of the official
//! [MongoDB driver](https://www.mongodb.com/docs/drivers/rust/).
//!
//! ## Key Features
//! - **Builder Pattern**: validated parameters, one connection attempt, one `ping`.
//! - **Indexes**: unique sparse indexes on `username` and `emails.address`, unique `token` on
//!   sessions, created idempotently at startup.
//! - **String ids**: documents use short unambiguous ids instead of `ObjectId`s.
//!
//! ## Example
//!
//! ```rust,no_run
//! use accounts_mongo::{MongoError, MongoStorage};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), MongoError> {
//!     let storage = MongoStorage::builder()
//!         .uri("mongodb://localhost:27017")
//!         .database("accounts-js")
//!         .init()
//!         .await?;
//!
//!     let _collections = storage.database().list_collection_names().await?;
//!     Ok(())
//! }
//! ```

mod documents;
mod error;
mod storage;

pub use crate::error::{MongoError, MongoErrorExt};

use crate::documents::{SESSIONS, SessionDocument, USERS, UserDocument};
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Inner state of the [`MongoStorage`] wrapper.
#[derive(Debug)]
struct MongoInner {
    client: Client,
    database: Database,
    users: Collection<UserDocument>,
    sessions: Collection<SessionDocument>,
}

impl Drop for MongoInner {
    fn drop(&mut self) {
        info!(database = %self.database.name(), "MongoDB storage handle dropped");
    }
}

/// Cheaply clonable handle to the accounts collections.
#[derive(Debug, Clone)]
pub struct MongoStorage {
    inner: Arc<MongoInner>,
}

impl MongoStorage {
    /// Creates a new [`MongoStorageBuilder`].
    pub fn builder() -> MongoStorageBuilder {
        MongoStorageBuilder::new()
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        &self.inner.client
    }

    /// The database holding the accounts collections.
    #[must_use]
    pub fn database(&self) -> &Database {
        &self.inner.database
    }
}

#[must_use = "builders do nothing unless you call .init()"]
#[derive(Debug, Default)]
pub struct MongoStorageBuilder {
    uri: Option<String>,
    database: Option<String>,
    server_selection_timeout: Option<Duration>,
}

impl MongoStorageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connection string, e.g. `mongodb://localhost:27017`.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn database(mut self, name: impl Into<String>) -> Self {
        self.database = Some(name.into());
        self
    }

    /// How long the driver waits for a reachable server before the ping fails.
    pub const fn server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.server_selection_timeout = Some(timeout);
        self
    }

    /// Connects, pings the deployment once and ensures the indexes.
    ///
    /// There is no retry: an unreachable deployment fails the call.
    ///
    /// # Errors
    /// * [`MongoError::Validation`] if the URI or database name is missing or blank.
    /// * [`MongoError::Connection`] if the URI is malformed or the ping fails.
    /// * [`MongoError::Mongo`] if index creation fails.
    #[instrument(skip(self), fields(database = ?self.database))]
    pub async fn init(self) -> Result<MongoStorage, MongoError> {
        let uri = required(self.uri, "URI is required")?;
        let name = required(self.database, "Database name is required")?;

        let mut options = ClientOptions::parse(&uri).await.map_err(|e| MongoError::Connection {
            message: e.to_string().into(),
            context: Some("Parsing connection string".into()),
        })?;
        if self.server_selection_timeout.is_some() {
            options.server_selection_timeout = self.server_selection_timeout;
        }
        let client = Client::with_options(options).context("Creating client")?;
        let database = client.database(&name);

        database.run_command(doc! { "ping": 1 }).await.map_err(|e| MongoError::Connection {
            message: e.to_string().into(),
            context: Some("Pinging deployment".into()),
        })?;

        let storage = MongoStorage {
            inner: Arc::new(MongoInner {
                users: database.collection(USERS),
                sessions: database.collection(SESSIONS),
                client,
                database,
            }),
        };
        storage.ensure_indexes().await?;

        info!(database = %name, "MongoDB storage ready");
        Ok(storage)
    }
}

impl MongoStorage {
    async fn ensure_indexes(&self) -> Result<(), MongoError> {
        let unique_sparse = || IndexOptions::builder().unique(true).sparse(true).build();

        self.inner
            .users
            .create_index(IndexModel::builder().keys(doc! { "username": 1 }).options(unique_sparse()).build())
            .await
            .context("Indexing users.username")?;
        self.inner
            .users
            .create_index(
                IndexModel::builder().keys(doc! { "emails.address": 1 }).options(unique_sparse()).build(),
            )
            .await
            .context("Indexing users.emails.address")?;
        self.inner
            .sessions
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "token": 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build(),
            )
            .await
            .context("Indexing sessions.token")?;
        self.inner
            .sessions
            .create_index(IndexModel::builder().keys(doc! { "userId": 1 }).build())
            .await
            .context("Indexing sessions.userId")?;
        Ok(())
    }
}

fn required(value: Option<String>, message: &'static str) -> Result<String, MongoError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(MongoError::Validation { message: message.into(), context: None })
}
