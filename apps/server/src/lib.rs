//! # Accounts Boost Server
//!
//! The accounts GraphQL service as a binary: layered configuration, logging, then
//! [`accounts_boost`] from resolution to a listening socket.
//!
//! ## Example
//! ```no_run
//! use accounts_boost_server::{AppConfig, run};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     run(AppConfig::default()).await
//! }
//! ```

use accounts_boost::{Boost, BoostOptions, ListenOptions};
use accounts_logger::{LevelFilter, Logger};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

/// File and environment configuration of the binary.
///
/// The bootstrap sections (`storage`, `services`, `server`, `listen`) sit at the top level next
/// to `logging`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(flatten)]
    pub boost: BoostOptions,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `error`, `warn`, `info`, `debug` or `trace`.
    pub level: Option<String>,
    /// Filter directives, e.g. `accounts_server=debug,tower_http=info`.
    pub directives: Option<String>,
    /// Writes rolling log files here in addition to the console.
    pub directory: Option<PathBuf>,
    pub json: bool,
}

impl LoggingConfig {
    /// Installs the global subscriber.
    ///
    /// # Errors
    /// Fails for an unknown level, bad directives or when a subscriber is already installed.
    pub fn init(&self, name: &str) -> Result<Logger> {
        let mut builder = Logger::builder().name(name).json(self.json);
        if let Some(level) = &self.level {
            let level: LevelFilter =
                level.parse().with_context(|| format!("Invalid logging.level '{level}'"))?;
            builder = builder.level(level);
        }
        if let Some(directives) = &self.directives {
            builder = builder.directives(directives);
        }
        if let Some(directory) = &self.directory {
            builder = builder.directory(directory);
        }
        Ok(builder.init()?)
    }
}

/// Builds the service and serves until Ctrl+C or SIGTERM.
///
/// # Errors
/// Any startup failure: missing storage driver, unreachable database, unusable server options,
/// schema composition or binding.
pub async fn run(config: AppConfig) -> Result<()> {
    let boost = Boost::builder()
        .options(config.boost)
        .build()
        .await
        .context("Failed to assemble the accounts service")?;
    info!(storage = boost.storage(), "Accounts service assembled");

    let listening = boost.listen(ListenOptions::default()).await?;
    listening.run_until_signal().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use accounts_kernel::config::load_config;
    use serial_test::serial;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn boost_sections_sit_next_to_logging() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("boost.toml");
        fs::write(
            &path,
            r#"
[storage]
driver = "memory"

[listen]
port = 4100

[logging]
level = "debug"
json = true
"#,
        )
        .unwrap();

        let config: AppConfig = load_config(Some(&path)).unwrap();
        assert_eq!(config.boost.storage.driver.as_deref(), Some("memory"));
        assert_eq!(config.boost.listen.port, Some(4100));
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
        assert!(config.logging.json);
    }

    #[test]
    fn unknown_level_is_rejected() {
        let logging = LoggingConfig { level: Some("loud".into()), ..LoggingConfig::default() };
        let err = logging.init("accounts-boost-server").unwrap_err();
        assert!(err.to_string().contains("loud"));
    }
}
