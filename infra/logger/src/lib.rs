//! # Logger
//!
//! Process-wide `tracing` setup for the accounts services.
//!
//! The builder installs a single registry with:
//! * an [`EnvFilter`] seeded from the configured level and directives (`RUST_LOG` still wins
//!   when no explicit directives are given),
//! * a compact ANSI console layer,
//! * an optional rolling file layer written through a non-blocking worker, plain or JSON.
//!
//! ## Example
//!
//! ```rust
//! # use accounts_logger::{Logger, LevelFilter};
//! let _logger = Logger::builder()
//!     .name("accounts-boost")
//!     .level(LevelFilter::DEBUG)
//!     .init()
//!     .unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

const DEFAULT_MAX_FILES: usize = 10;
const LOG_FILE_SUFFIX: &str = "log";

#[derive(Debug)]
struct Settings {
    console: bool,
    directory: Option<PathBuf>,
    level: LevelFilter,
    directives: Option<String>,
    rotation: Rotation,
    max_files: usize,
    json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            console: true,
            directory: None,
            level: LevelFilter::INFO,
            directives: None,
            rotation: Rotation::DAILY,
            max_files: DEFAULT_MAX_FILES,
            json: false,
        }
    }
}

/// Marker for a builder that has not been given a service name yet.
#[derive(Debug)]
pub struct Unnamed;

/// Marker for a builder carrying the service name.
#[derive(Debug)]
pub struct Named(String);

/// Builder for the global tracing subscriber. A name is mandatory before [`init`](LoggerBuilder::init).
#[must_use = "The builder must be configured before it can be used to initialize the logger."]
#[derive(Debug)]
pub struct LoggerBuilder<N = Unnamed> {
    settings: Settings,
    name: N,
}

impl LoggerBuilder<Unnamed> {
    /// Names the service; the name prefixes rolling log files.
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<Named> {
        LoggerBuilder { settings: self.settings, name: Named(name.into()) }
    }
}

impl<N> LoggerBuilder<N> {
    /// Minimum level emitted when no directive matches.
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.settings.level = level;
        self
    }

    /// Explicit filter directives, e.g. `accounts_server=debug,tower_http=info`.
    pub fn directives(mut self, directives: impl Into<String>) -> Self {
        self.settings.directives = Some(directives.into());
        self
    }

    /// Toggles the console layer.
    pub const fn console(mut self, enabled: bool) -> Self {
        self.settings.console = enabled;
        self
    }

    /// Writes rolling log files into `directory`.
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.settings.directory = Some(directory.into());
        self
    }

    /// Rotation policy for file output.
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.settings.rotation = rotation;
        self
    }

    /// How many rotated files are kept.
    pub const fn max_files(mut self, max_files: usize) -> Self {
        self.settings.max_files = max_files;
        self
    }

    /// Emits JSON lines instead of plain text in log files.
    pub const fn json(mut self, enabled: bool) -> Self {
        self.settings.json = enabled;
        self
    }
}

impl LoggerBuilder<Named> {
    /// Installs the global subscriber.
    ///
    /// Keep the returned [`Logger`] alive for the lifetime of the process: it owns the
    /// background writer of the file layer.
    ///
    /// # Errors
    /// * [`LoggerError::InvalidConfiguration`] for an empty name, `max_files == 0`, bad
    ///   directives or when every output is disabled.
    /// * [`LoggerError::Appender`] when the rolling file appender cannot be created.
    /// * [`LoggerError::Subscriber`] when a global subscriber is already installed.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let Self { settings, name: Named(name) } = self;
        validate(&settings, &name)?;

        let filter = env_filter(&settings)?;
        let mut layers = Vec::new();

        if settings.console {
            layers.push(fmt::layer().compact().with_ansi(true).boxed());
        }

        let guard = match &settings.directory {
            Some(directory) => {
                fs::create_dir_all(directory).map_err(|e| LoggerError::Internal {
                    message: e.to_string().into(),
                    context: Some(format!("Creating {}", directory.display()).into()),
                })?;

                let appender = RollingFileAppender::builder()
                    .rotation(settings.rotation.clone())
                    .filename_prefix(&name)
                    .filename_suffix(LOG_FILE_SUFFIX)
                    .max_log_files(settings.max_files)
                    .build(directory)
                    .context("Building rolling file appender")?;
                let (writer, guard) = tracing_appender::non_blocking(appender);

                let file = fmt::layer().with_writer(writer).with_ansi(false);
                layers.push(if settings.json { file.json().boxed() } else { file.boxed() });
                Some(guard)
            }
            None => None,
        };

        if layers.is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "No logging output enabled, enable the console or a log directory".into(),
                context: None,
            });
        }

        tracing_subscriber::registry().with(filter).with(layers).try_init()?;
        tracing::debug!(service = %name, "Logging initialized");

        Ok(Logger { guard })
    }
}

/// Handle to the installed logging system.
#[must_use = "Dropping this handle stops the background log writer."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// Starts a new [`LoggerBuilder`].
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder { settings: Settings::default(), name: Unnamed }
    }

    /// Whether a file layer (and therefore a background writer) is active.
    #[must_use]
    pub const fn writes_to_file(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!("Logging system shutting down, flushing buffers...");
        }
    }
}

fn validate(settings: &Settings, name: &str) -> Result<(), LoggerError> {
    if name.trim().is_empty() {
        return Err(LoggerError::InvalidConfiguration {
            message: "Logger name cannot be empty".into(),
            context: None,
        });
    }
    if settings.max_files == 0 {
        return Err(LoggerError::InvalidConfiguration {
            message: "max_files must be greater than zero".into(),
            context: None,
        });
    }
    Ok(())
}

fn env_filter(settings: &Settings) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(settings.level.into());
    match &settings.directives {
        Some(directives) => builder.parse(directives).map_err(|e| {
            LoggerError::InvalidConfiguration {
                message: format!("Invalid filter directives '{directives}': {e}").into(),
                context: None,
            }
        }),
        None => Ok(builder.from_env_lossy()),
    }
}
