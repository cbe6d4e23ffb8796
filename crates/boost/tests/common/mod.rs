#![allow(dead_code, unreachable_pub)]

use accounts_boost::{BoostOptions, CapabilityRegistry, FragmentOptions, SchemaAdapter, ServiceFactory, StorageFactory};
use accounts_domain::config::{AccountsOptions, StorageConfig};
use accounts_graphql::{
    DirectiveMap, FieldDef, Resolver, ResolverMap, SchemaFragment, TypeDef, TypeDefs, resolver,
};
use accounts_password::{PasswordOptions, PasswordService};
use accounts_server::storage::Storage;
use accounts_server::{AccountsServer, AuthenticationService, MemoryStorage, ServerError, StorageError};
use async_graphql::Value;
use async_graphql::dynamic::FieldFuture;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value as Json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory storage factory that records how it was called.
#[derive(Debug, Clone)]
pub struct StubStorage {
    name: &'static str,
    available: bool,
    fails: bool,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Option<StorageConfig>>>,
}

impl StubStorage {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            available: true,
            fails: false,
            calls: Arc::default(),
            seen: Arc::default(),
        }
    }

    pub fn absent(name: &'static str) -> Self {
        Self { available: false, ..Self::new(name) }
    }

    pub fn failing(name: &'static str) -> Self {
        Self { fails: true, ..Self::new(name) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Option<StorageConfig> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl StorageFactory for StubStorage {
    fn name(&self) -> &str {
        self.name
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn create(&self, config: &StorageConfig) -> Result<Arc<dyn Storage>, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.seen.lock() = Some(config.clone());
        if self.fails {
            return Err(StorageError::Connection { message: "connection refused".into(), context: None });
        }
        Ok(Arc::new(MemoryStorage::new()))
    }
}

/// The password service behind an availability switch.
#[derive(Debug, Clone, Copy)]
pub struct StubPassword {
    pub available: bool,
}

impl ServiceFactory for StubPassword {
    fn name(&self) -> &str {
        accounts_password::SERVICE_NAME
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn create(&self, options: Option<&Json>) -> Result<Arc<dyn AuthenticationService>, ServerError> {
        let options = match options {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| ServerError::Config { message: e.to_string().into(), context: None })?,
            None => PasswordOptions::default(),
        };
        Ok(Arc::new(PasswordService::new(options)))
    }
}

/// Memory storage plus the password service.
pub fn memory_registry() -> CapabilityRegistry {
    CapabilityRegistry::empty().storage(StubStorage::new("memory")).service(StubPassword { available: true })
}

pub fn options() -> BoostOptions {
    BoostOptions {
        server: AccountsOptions { token_secret: Some("test-secret".into()), ..AccountsOptions::default() },
        ..BoostOptions::default()
    }
}

/// Adapter exposing two resolvers, `Query.hello` and `Query.mode`. `mode` names the fragment
/// it came from.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwoResolvers;

impl SchemaAdapter for TwoResolvers {
    fn schema_fragment(&self, _server: &Arc<AccountsServer>, options: FragmentOptions) -> SchemaFragment {
        let (query, mode) = if options.extend {
            (TypeDef::extension("Query"), "extended")
        } else {
            (TypeDef::object("Query"), "base")
        };

        SchemaFragment {
            type_defs: TypeDefs::new()
                .with(query.field(FieldDef::new("hello", "String")).field(FieldDef::new("mode", "String"))),
            resolvers: ResolverMap::new()
                .with("Query", "hello", constant("world"))
                .with("Query", "mode", constant(mode)),
            directives: DirectiveMap::new(),
        }
    }
}

/// Adapter whose resolvers point at a field no type defines.
#[derive(Debug, Clone, Copy, Default)]
pub struct Broken;

impl SchemaAdapter for Broken {
    fn schema_fragment(&self, _server: &Arc<AccountsServer>, _options: FragmentOptions) -> SchemaFragment {
        SchemaFragment {
            type_defs: TypeDefs::new().with(TypeDef::object("Query").field(FieldDef::new("hello", "String"))),
            resolvers: ResolverMap::new().with("Query", "missing", constant("nope")),
            directives: DirectiveMap::new(),
        }
    }
}

pub fn constant(value: &'static str) -> Resolver {
    resolver(move |_| FieldFuture::new(async move { Ok(Some(Value::from(value))) }))
}
