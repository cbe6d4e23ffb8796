use crate::capability::CapabilityRegistry;
use crate::error::{BoostError, BoostErrorExt};
use accounts_domain::config::BoostOptions;
use accounts_server::{DatabaseManager, ServicesMap};
use std::fmt;
use tracing::{debug, info, instrument};

/// Storage and services picked at startup. Never changes afterwards.
#[derive(Clone)]
pub struct ResolvedCapabilities {
    /// Name of the storage driver that connected.
    pub storage: String,
    pub db: DatabaseManager,
    pub services: ServicesMap,
}

impl fmt::Debug for ResolvedCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCapabilities")
            .field("storage", &self.storage)
            .field("services", &self.services.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Picks the storage driver and constructs every available service, one factory at a time.
///
/// The first available storage factory (restricted to `storage.driver` when set) is connected
/// with the merged storage settings. Its failure is final: the next candidate is not tried.
///
/// # Errors
/// * [`BoostError::MissingDependency`] when no storage factory is available.
/// * [`BoostError::ConnectionFailure`] when the chosen driver fails to connect.
/// * [`BoostError::Service`] when a service factory rejects its configuration.
#[instrument(skip_all, fields(driver = ?options.storage.driver))]
pub async fn resolve(
    registry: &CapabilityRegistry,
    options: &BoostOptions,
) -> Result<ResolvedCapabilities, BoostError> {
    let wanted = options.storage.driver.as_deref();
    let candidate = registry
        .storages()
        .filter(|factory| wanted.is_none_or(|driver| driver == factory.name()))
        .find(|factory| {
            let available = factory.is_available();
            if !available {
                debug!(driver = factory.name(), "Storage driver not available, skipping");
            }
            available
        })
        .ok_or_else(|| missing_storage(registry, wanted))?;

    let config = options.storage.resolve();
    let storage = candidate
        .create(&config)
        .await
        .context(format!("Connecting '{}' storage to database '{}'", candidate.name(), config.name))?;
    info!(driver = candidate.name(), database = %config.name, "Storage resolved");

    let mut services = ServicesMap::new();
    for factory in registry.services() {
        if !factory.is_available() {
            debug!(service = factory.name(), "Service not available, skipping");
            continue;
        }

        let service = factory.create(options.service(factory.name())).map_err(|e| {
            BoostError::Service { message: e.to_string().into(), context: Some(factory.name().to_owned().into()) }
        })?;
        debug!(service = service.service_name(), "Service resolved");
        services.insert(service.service_name().to_owned(), service);
    }

    Ok(ResolvedCapabilities {
        storage: candidate.name().to_owned(),
        db: DatabaseManager::from_storage(storage),
        services,
    })
}

fn missing_storage(registry: &CapabilityRegistry, wanted: Option<&str>) -> BoostError {
    let message = match wanted {
        Some(driver) => format!(
            "storage driver '{driver}' is not available (registered: {:?}), enable its feature or register a StorageFactory for it",
            registry.storage_names()
        ),
        None => "no storage driver is available, enable the `storage-mongo` or `storage-memory` feature or register a StorageFactory".to_owned(),
    };
    BoostError::MissingDependency { message: message.into(), context: None }
}
