//! Logging configuration for gendb.
//!
//! Logging is configured through an explicit [`LogSettings`] value rather than
//! a process-wide logger created at import time. The binary installs it once;
//! tests can build a subscriber with [`LogSettings::subscriber`] and scope it
//! with `tracing::subscriber::with_default`.

use std::path::{Path, PathBuf};
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default log level when neither `RUST_LOG` nor `LOG_LEVEL` is set.
const DEFAULT_LEVEL: &str = "debug";

/// Default log file name inside the log folder.
const DEFAULT_LOG_FILE: &str = "gendb.log";

/// Where log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Standard error only.
    Stderr,
    /// Daily-rotating file in the configured folder.
    File,
    /// Standard error and the rotating file.
    Both,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Minimum level filter (e.g. "info", "gendb=debug").
    pub level: String,
    /// Folder holding the rotating log files.
    pub folder: PathBuf,
    /// Base file name; the appender suffixes it with the date.
    pub file_name: String,
    /// Output destination.
    pub output: LogOutput,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
            folder: default_log_folder(),
            file_name: DEFAULT_LOG_FILE.to_string(),
            output: LogOutput::Both,
        }
    }
}

impl LogSettings {
    /// Builds settings from `LOG_LEVEL`, `LOG_FOLDER` and `LOG_FILE`, falling
    /// back to the defaults for anything unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        if let Some(level) = lookup("LOG_LEVEL").filter(|v| !v.is_empty()) {
            settings.level = level.to_lowercase();
        }
        if let Some(folder) = lookup("LOG_FOLDER").filter(|v| !v.is_empty()) {
            settings.folder = PathBuf::from(folder);
        }
        if let Some(file) = lookup("LOG_FILE").filter(|v| !v.is_empty()) {
            settings.file_name = file;
        }
        settings
    }

    /// Sets the output destination.
    pub fn with_output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Sets the level filter.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Full path of the (un-suffixed) log file.
    pub fn log_path(&self) -> PathBuf {
        self.folder.join(&self.file_name)
    }

    /// Returns the filter to use. `RUST_LOG` wins over the configured level.
    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
    }

    /// Builds a subscriber writing to `writer` with this level filter.
    ///
    /// Used by tests to capture output without touching global state.
    pub fn subscriber<W>(&self, writer: W) -> impl Subscriber + Send + Sync
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        tracing_subscriber::registry()
            .with(self.env_filter())
            .with(fmt::layer().with_writer(writer).with_ansi(false))
    }

    /// Installs the global subscriber.
    ///
    /// Returns a guard that must be kept alive while file logging is used;
    /// dropping it flushes and stops the background writer. If the log folder
    /// cannot be created, file output is skipped and stderr is used instead.
    pub fn init(self) -> Option<WorkerGuard> {
        let filter = self.env_filter();

        match self.effective_output() {
            LogOutput::Stderr => {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().with_writer(std::io::stderr))
                    .init();
                None
            }
            LogOutput::File => {
                let (writer, guard) = rolling_writer(&self.folder, &self.file_name);
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().with_writer(writer).with_ansi(false))
                    .init();
                Some(guard)
            }
            LogOutput::Both => {
                let (writer, guard) = rolling_writer(&self.folder, &self.file_name);
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().with_writer(std::io::stderr))
                    .with(fmt::layer().with_writer(writer).with_ansi(false))
                    .init();
                Some(guard)
            }
        }
    }

    /// The output actually used: file targets degrade to stderr when the log
    /// folder cannot be created. Never stdout.
    fn effective_output(&self) -> LogOutput {
        if self.output == LogOutput::Stderr {
            return LogOutput::Stderr;
        }
        match std::fs::create_dir_all(&self.folder) {
            Ok(()) => self.output,
            Err(e) => {
                eprintln!(
                    "Warning: Could not create log directory {}: {e}",
                    self.folder.display()
                );
                LogOutput::Stderr
            }
        }
    }
}

/// Creates a non-blocking writer over a file that rotates at midnight.
fn rolling_writer(
    folder: &Path,
    file_name: &str,
) -> (tracing_appender::non_blocking::NonBlocking, WorkerGuard) {
    let appender = tracing_appender::rolling::daily(folder, file_name);
    tracing_appender::non_blocking(appender)
}

/// Returns the default log folder.
///
/// Uses the XDG state directory on Linux (`~/.local/state/gendb/logs`),
/// or falls back to the config directory on other platforms.
pub fn default_log_folder() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        return state_dir.join("gendb").join("logs");
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("gendb").join("logs");
    }

    std::env::temp_dir().join("gendb-logs")
}
