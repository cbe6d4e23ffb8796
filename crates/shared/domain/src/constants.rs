//! Well-known names and built-in defaults.

/// Default `MongoDB` connection string.
pub const DEFAULT_STORAGE_URI: &str = "mongodb://localhost:27017";
/// Default database name.
pub const DEFAULT_STORAGE_NAME: &str = "accounts-js";
/// Default HTTP listen port.
pub const DEFAULT_PORT: u16 = 4003;

/// Access tokens live for 90 minutes unless configured otherwise.
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: u64 = 90 * 60;
/// Refresh tokens live for 7 days unless configured otherwise.
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Capability name of the `MongoDB` storage driver.
pub const MONGO_STORAGE: &str = "mongo";
/// Capability name of the in-memory storage driver.
pub const MEMORY_STORAGE: &str = "memory";
/// Service name (and configuration key) of the password service.
pub const PASSWORD_SERVICE: &str = "password";
