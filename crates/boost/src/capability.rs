//! Statically declared storage drivers and authentication services.
//!
//! Built-in factories are selected by Cargo features; callers register their own on top.

use accounts_domain::config::StorageConfig;
use accounts_domain::constants::MEMORY_STORAGE;
use accounts_server::storage::Storage;
use accounts_server::{AuthenticationService, MemoryStorage, ServerError, StorageError};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;
use std::sync::Arc;

/// Build-time enabled capabilities (by Cargo feature).
pub const ENABLED: &[&str] = &[
    #[cfg(feature = "storage-mongo")]
    accounts_domain::constants::MONGO_STORAGE,
    #[cfg(feature = "storage-memory")]
    MEMORY_STORAGE,
    #[cfg(feature = "service-password")]
    accounts_domain::constants::PASSWORD_SERVICE,
];

/// Constructs a storage backend usable as both user and session storage.
#[async_trait]
pub trait StorageFactory: Debug + Send + Sync {
    /// Driver name matched against `storage.driver`.
    fn name(&self) -> &str;

    /// Whether the backing implementation can be used in this process.
    fn is_available(&self) -> bool {
        true
    }

    /// Connects the driver. Called at most once, at startup.
    async fn create(&self, config: &StorageConfig) -> Result<Arc<dyn Storage>, StorageError>;
}

/// Constructs an authentication service from its `services.<name>` section.
pub trait ServiceFactory: Debug + Send + Sync {
    /// Configuration key of the service.
    fn name(&self) -> &str;

    fn is_available(&self) -> bool {
        true
    }

    fn create(&self, options: Option<&Value>) -> Result<Arc<dyn AuthenticationService>, ServerError>;
}

/// Ordered storage and service factories. Storage order decides which driver wins.
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    storages: Vec<Arc<dyn StorageFactory>>,
    services: Vec<Arc<dyn ServiceFactory>>,
}

impl CapabilityRegistry {
    /// A registry without any factory.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The factories compiled in through Cargo features: `mongo` before `memory`, then `password`.
    #[must_use]
    pub fn builtin() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::empty();

        #[cfg(feature = "storage-mongo")]
        {
            registry = registry.storage(MongoStorageFactory);
        }
        #[cfg(feature = "storage-memory")]
        {
            registry = registry.storage(MemoryStorageFactory);
        }
        #[cfg(feature = "service-password")]
        {
            registry = registry.service(PasswordServiceFactory);
        }

        registry
    }

    /// Appends a storage factory; earlier registrations take precedence.
    #[must_use]
    pub fn storage(mut self, factory: impl StorageFactory + 'static) -> Self {
        self.storages.push(Arc::new(factory));
        self
    }

    #[must_use]
    pub fn service(mut self, factory: impl ServiceFactory + 'static) -> Self {
        self.services.push(Arc::new(factory));
        self
    }

    pub fn storages(&self) -> impl Iterator<Item = &dyn StorageFactory> {
        self.storages.iter().map(AsRef::as_ref)
    }

    pub fn services(&self) -> impl Iterator<Item = &dyn ServiceFactory> {
        self.services.iter().map(AsRef::as_ref)
    }

    #[must_use]
    pub fn storage_names(&self) -> Vec<&str> {
        self.storages().map(StorageFactory::name).collect()
    }
}

/// In-process storage. Registered by `builtin()` only with the `storage-memory` feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryStorageFactory;

#[async_trait]
impl StorageFactory for MemoryStorageFactory {
    fn name(&self) -> &str {
        MEMORY_STORAGE
    }

    async fn create(&self, _config: &StorageConfig) -> Result<Arc<dyn Storage>, StorageError> {
        Ok(Arc::new(MemoryStorage::new()))
    }
}

#[cfg(feature = "storage-mongo")]
pub use self::mongo::MongoStorageFactory;

#[cfg(feature = "storage-mongo")]
mod mongo {
    use super::StorageFactory;
    use accounts_domain::config::StorageConfig;
    use accounts_domain::constants::MONGO_STORAGE;
    use accounts_mongo::MongoStorage;
    use accounts_server::StorageError;
    use accounts_server::storage::Storage;
    use async_trait::async_trait;
    use std::sync::Arc;

    /// `MongoDB` through [`accounts_mongo`]: one connection attempt, one ping.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct MongoStorageFactory;

    #[async_trait]
    impl StorageFactory for MongoStorageFactory {
        fn name(&self) -> &str {
            MONGO_STORAGE
        }

        async fn create(&self, config: &StorageConfig) -> Result<Arc<dyn Storage>, StorageError> {
            let storage =
                MongoStorage::builder().uri(&config.uri).database(&config.name).init().await?;
            Ok(Arc::new(storage))
        }
    }
}

#[cfg(feature = "service-password")]
pub use self::password::PasswordServiceFactory;

#[cfg(feature = "service-password")]
mod password {
    use super::ServiceFactory;
    use accounts_password::{PasswordOptions, PasswordService, SERVICE_NAME};
    use accounts_server::{AuthenticationService, ServerError};
    use serde::Deserialize;
    use serde_json::Value;
    use std::sync::Arc;

    /// The password service, configured from `services.password`.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct PasswordServiceFactory;

    impl ServiceFactory for PasswordServiceFactory {
        fn name(&self) -> &str {
            SERVICE_NAME
        }

        fn create(&self, options: Option<&Value>) -> Result<Arc<dyn AuthenticationService>, ServerError> {
            let options = match options {
                Some(value) => PasswordOptions::deserialize(value).map_err(|e| ServerError::Config {
                    message: e.to_string().into(),
                    context: Some("services.password".into()),
                })?,
                None => PasswordOptions::default(),
            };
            Ok(Arc::new(PasswordService::new(options)))
        }
    }
}
