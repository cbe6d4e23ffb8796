use crate::constants::{
    DEFAULT_ACCESS_TOKEN_TTL_SECS, DEFAULT_PORT, DEFAULT_REFRESH_TOKEN_TTL_SECS,
    DEFAULT_STORAGE_NAME, DEFAULT_STORAGE_URI,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Caller-supplied bootstrap configuration.
///
/// Every field is optional; missing values fall back to the documented defaults when the
/// bootstrap merges them. Per-service sections are forwarded verbatim.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BoostOptions {
    pub storage: StorageOptions,
    pub services: BTreeMap<String, Value>,
    pub server: AccountsOptions,
    pub listen: ListenOptions,
}

impl BoostOptions {
    /// Configuration section for the service registered under `name`, if any.
    #[must_use]
    pub fn service(&self, name: &str) -> Option<&Value> {
        self.services.get(name)
    }
}

/// Storage connection settings as supplied by the caller.
#[derive(Default, Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    pub uri: Option<String>,
    pub name: Option<String>,
    /// Restricts storage resolution to a single registered driver.
    pub driver: Option<String>,
}

impl StorageOptions {
    /// Applies the defaults field by field.
    #[must_use]
    pub fn resolve(&self) -> StorageConfig {
        let defaults = StorageConfig::default();
        StorageConfig {
            uri: self.uri.clone().unwrap_or(defaults.uri),
            name: self.name.clone().unwrap_or(defaults.name),
        }
    }
}

/// Storage settings handed to a storage factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub uri: String,
    pub name: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { uri: DEFAULT_STORAGE_URI.to_owned(), name: DEFAULT_STORAGE_NAME.to_owned() }
    }
}

/// Authentication server options as supplied by the caller.
///
/// Keys the bootstrap does not know about are kept in `extra` and passed through.
#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AccountsOptions {
    pub token_secret: Option<String>,
    /// Access token lifetime in seconds.
    pub access_token_ttl: Option<u64>,
    /// Refresh token lifetime in seconds.
    pub refresh_token_ttl: Option<u64>,
    pub ambiguous_error_messages: Option<bool>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl AccountsOptions {
    /// Overrides `config` with every value set here; unset fields keep their current value.
    #[must_use]
    pub fn apply(&self, mut config: AccountsConfig) -> AccountsConfig {
        if let Some(secret) = &self.token_secret {
            config.token_secret.clone_from(secret);
        }
        if let Some(ttl) = self.access_token_ttl {
            config.access_token_ttl = ttl;
        }
        if let Some(ttl) = self.refresh_token_ttl {
            config.refresh_token_ttl = ttl;
        }
        if let Some(ambiguous) = self.ambiguous_error_messages {
            config.ambiguous_error_messages = ambiguous;
        }
        config.extra.extend(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
        config
    }
}

/// Fully resolved authentication server options.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountsConfig {
    pub token_secret: String,
    pub access_token_ttl: u64,
    pub refresh_token_ttl: u64,
    pub ambiguous_error_messages: bool,
    pub extra: BTreeMap<String, Value>,
}

impl AccountsConfig {
    /// Built-in defaults around the given signing secret.
    #[must_use]
    pub fn with_secret(token_secret: impl Into<String>) -> Self {
        Self {
            token_secret: token_secret.into(),
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL_SECS,
            refresh_token_ttl: DEFAULT_REFRESH_TOKEN_TTL_SECS,
            ambiguous_error_messages: true,
            extra: BTreeMap::new(),
        }
    }
}

/// HTTP listen options. Explicit values win over configured ones, which win over defaults.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ListenOptions {
    pub address: Option<IpAddr>,
    /// `0` asks the OS for an ephemeral port.
    pub port: Option<u16>,
}

impl ListenOptions {
    /// Options naming only a port.
    #[must_use]
    pub const fn port(port: u16) -> Self {
        Self { address: None, port: Some(port) }
    }

    /// Fills unset fields from `fallback`.
    #[must_use]
    pub fn or(self, fallback: Self) -> Self {
        Self { address: self.address.or(fallback.address), port: self.port.or(fallback.port) }
    }

    /// Socket address to bind, with the defaults applied.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(
            self.address.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            self.port.unwrap_or(DEFAULT_PORT),
        )
    }
}
