//! # Accounts Boost
//!
//! One call from configuration to a running accounts GraphQL service.
//!
//! Startup is a strictly ordered chain:
//! 1. **Resolve** the storage driver and authentication services from a [`CapabilityRegistry`]
//!    of statically declared factories (built-ins are picked by Cargo features).
//! 2. **Merge** the defaults, the resolved storage and the caller's `server.*` options.
//! 3. **Construct** the [`AccountsServer`].
//! 4. **Compose** the GraphQL schema on first use and keep it ([`Boost::compose_schema`]).
//! 5. **Listen** over HTTP ([`Boost::listen`]).
//!
//! ## Example
//!
//! ```rust,no_run
//! use accounts_boost::{BoostError, BoostOptions, ListenOptions, accounts_boost};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), BoostError> {
//!     let boost = accounts_boost(BoostOptions::default()).await?;
//!     let listening = boost.listen(ListenOptions::port(5000)).await?;
//!     tracing::info!(url = listening.url(), "Ready");
//!     listening.run_until_signal().await
//! }
//! ```

pub mod capability;
mod error;
mod listener;
mod options;
mod resolver;
mod schema;

pub use crate::capability::{CapabilityRegistry, MemoryStorageFactory, ServiceFactory, StorageFactory};
#[cfg(feature = "storage-mongo")]
pub use crate::capability::MongoStorageFactory;
#[cfg(feature = "service-password")]
pub use crate::capability::PasswordServiceFactory;
pub use crate::error::{BoostError, BoostErrorExt};
pub use crate::listener::{Listening, router};
pub use crate::options::merge_options;
pub use crate::resolver::{ResolvedCapabilities, resolve};
pub use crate::schema::ComposedSchema;
pub use accounts_domain::config::{BoostOptions, ListenOptions};
pub use accounts_graphql::{
    AccountsGraphql, ContextBuilder, FragmentOptions, SchemaAdapter, accounts_context,
    auth_directive,
};

use accounts_server::AccountsServer;
use axum::Router;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, instrument};

/// Lifecycle of a [`Boost`] instance. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Configured,
    SchemaComposed,
    Listening,
}

/// A fluent builder for [`Boost`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug)]
pub struct BoostBuilder {
    options: BoostOptions,
    registry: CapabilityRegistry,
    adapter: Arc<dyn SchemaAdapter>,
}

impl Default for BoostBuilder {
    fn default() -> Self {
        Self {
            options: BoostOptions::default(),
            registry: CapabilityRegistry::builtin(),
            adapter: Arc::new(AccountsGraphql),
        }
    }
}

impl BoostBuilder {
    pub fn options(mut self, options: BoostOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the built-in registry.
    pub fn registry(mut self, registry: CapabilityRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Registers an extra storage factory after the existing ones.
    pub fn storage(mut self, factory: impl StorageFactory + 'static) -> Self {
        self.registry = self.registry.storage(factory);
        self
    }

    pub fn service(mut self, factory: impl ServiceFactory + 'static) -> Self {
        self.registry = self.registry.service(factory);
        self
    }

    /// Source of the schema fragments, [`AccountsGraphql`] by default.
    pub fn adapter(mut self, adapter: impl SchemaAdapter + 'static) -> Self {
        self.adapter = Arc::new(adapter);
        self
    }

    /// Resolves the capabilities, merges the options and constructs the accounts server.
    ///
    /// # Errors
    /// * [`BoostError::MissingDependency`] when no storage driver is available.
    /// * [`BoostError::ConnectionFailure`] when the storage driver cannot connect.
    /// * [`BoostError::Service`] when a service rejects its configuration.
    /// * [`BoostError::Server`] when the accounts server rejects the merged options.
    #[instrument(skip_all)]
    pub async fn build(self) -> Result<Boost, BoostError> {
        let Self { options, registry, adapter } = self;

        let resolved = resolve(&registry, &options).await?;
        let ResolvedCapabilities { storage, db, services } = resolved;
        let server_options = merge_options(&options, db)?;
        let server = AccountsServer::new(server_options, services).context("Constructing accounts server")?;

        info!(storage = %storage, services = ?server.services().keys().collect::<Vec<_>>(), "Accounts boost configured");
        Ok(Boost {
            options,
            storage,
            server: Arc::new(server),
            adapter,
            schema: Mutex::new(None),
            listening: AtomicBool::new(false),
        })
    }
}

/// The composition root: owns the accounts server and, once built, the composed schema.
#[derive(Debug)]
pub struct Boost {
    options: BoostOptions,
    storage: String,
    server: Arc<AccountsServer>,
    adapter: Arc<dyn SchemaAdapter>,
    schema: Mutex<Option<Arc<ComposedSchema>>>,
    listening: AtomicBool,
}

impl Boost {
    /// Returns a new [`BoostBuilder`] over the built-in registry.
    pub fn builder() -> BoostBuilder {
        BoostBuilder::default()
    }

    #[must_use]
    pub const fn options(&self) -> &BoostOptions {
        &self.options
    }

    /// Name of the storage driver in use.
    #[must_use]
    pub fn storage(&self) -> &str {
        &self.storage
    }

    #[must_use]
    pub const fn server(&self) -> &Arc<AccountsServer> {
        &self.server
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.listening.load(Ordering::Acquire) {
            Phase::Listening
        } else if self.schema.lock().is_some() {
            Phase::SchemaComposed
        } else {
            Phase::Configured
        }
    }

    /// The merged GraphQL schema, built on the first call and shared afterwards.
    ///
    /// Asks the adapter for an extended and a base fragment and keeps the base type
    /// definitions with the extended resolvers and directives. Every later call returns the
    /// same [`Arc`]. A failed build is not cached.
    ///
    /// # Errors
    /// [`BoostError::Schema`] when the fragments do not form a valid schema.
    pub fn compose_schema(&self) -> Result<Arc<ComposedSchema>, BoostError> {
        let mut slot = self.schema.lock();
        if let Some(schema) = slot.as_ref() {
            return Ok(Arc::clone(schema));
        }

        let extended = self.adapter.schema_fragment(&self.server, FragmentOptions { extend: true });
        let base = self.adapter.schema_fragment(&self.server, FragmentOptions { extend: false });
        let composed = Arc::new(schema::compose(&self.server, base, extended)?);
        debug!(resolvers = composed.resolvers.len(), "GraphQL schema composed");

        *slot = Some(Arc::clone(&composed));
        Ok(composed)
    }

    /// The HTTP routes over the composed schema, for embedding into a larger router.
    ///
    /// # Errors
    /// See [`Boost::compose_schema`].
    pub fn router(&self) -> Result<Router, BoostError> {
        Ok(router(self.compose_schema()?))
    }

    /// Address `listen` binds: explicit options over configured `listen.*` over the defaults
    /// (`0.0.0.0:4003`).
    #[must_use]
    pub fn listen_addr(&self, options: ListenOptions) -> SocketAddr {
        options.or(self.options.listen).socket_addr()
    }

    /// Composes the schema and serves it over HTTP. Returns once the socket is bound.
    ///
    /// # Errors
    /// * [`BoostError::Schema`] when the schema cannot be composed.
    /// * [`BoostError::BindFailure`] when the address cannot be bound. Nothing is retried.
    pub async fn listen(&self, options: ListenOptions) -> Result<Listening, BoostError> {
        let address = self.listen_addr(options);
        let router = self.router()?;

        let listening = listener::serve(address, router).await?;
        self.listening.store(true, Ordering::Release);
        Ok(listening)
    }
}

/// Builds a [`Boost`] over the built-in registry and the accounts GraphQL API.
///
/// # Errors
/// See [`BoostBuilder::build`].
pub async fn accounts_boost(options: BoostOptions) -> Result<Boost, BoostError> {
    Boost::builder().options(options).build().await
}
