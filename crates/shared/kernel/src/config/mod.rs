use config::{Config, Environment, File, Map};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix of the environment variables overlaying file configuration.
pub const ENV_PREFIX: &str = "ACCOUNTS";
/// Separator between nested keys, both after the prefix and between sections.
pub const ENV_SEPARATOR: &str = "__";

const DEFAULT_CONFIG_FILE: &str = "boost";

#[accounts_derive::accounts_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads a configuration structure from an optional file overlaid by environment variables.
///
/// Layers, lowest precedence first:
/// 1. **File**: `path` (default `boost`), with the format inferred from the extension
///    (`boost.toml`, `boost.yaml`, `boost.json`, ...). A missing file is not an error, so a
///    service can start on defaults alone.
/// 2. **Environment**: variables prefixed with `ACCOUNTS__`, nested with `__`
///    (`ACCOUNTS__STORAGE__URI` maps to `storage.uri`). Numbers and booleans are parsed.
///
/// # Errors
/// Fails when a source is malformed or the merged values do not fit `T`.
///
/// # Example
/// ```rust
/// use accounts_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// let cfg: AppConfig = load_config(Some("config/local")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load_layers(path, None)
}

/// [`load_config`] with the environment layer read from `vars` instead of the process
/// environment.
///
/// # Errors
/// Same as [`load_config`].
pub fn load_config_with<T, K, V>(
    path: Option<impl AsRef<Path>>,
    vars: impl IntoIterator<Item = (K, V)>,
) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
    K: Into<String>,
    V: Into<String>,
{
    let mut env = Map::new();
    for (key, value) in vars {
        env.insert(key.into(), value.into());
    }
    load_layers(path, Some(env))
}

fn load_layers<T>(
    path: Option<impl AsRef<Path>>,
    env: Option<Map<String, String>>,
) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let path = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), |p| p.as_ref().to_path_buf());
    info!("Loading config from {} (optional) and {ENV_PREFIX}{ENV_SEPARATOR}* variables", path.display());

    Config::builder()
        .add_source(File::from(path.as_path()).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .convert_case(config::Case::Snake)
                .source(env),
        )
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")
}
