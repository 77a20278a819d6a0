//! Configuration management for gendb.
//!
//! Handles the connection environment (the fixed set of ODBC-style
//! attributes), execution settings, and loading named environments from a
//! TOML file.

use crate::dialect::Dialect;
use crate::error::{GenDbError, Result};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{error, info};

/// Connection timeout applied to every execution, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 45;

/// The attributes an environment may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvKey {
    Server,
    Driver,
    Database,
    TrustedConnection,
    User,
    Pass,
}

impl EnvKey {
    /// All keys, in connection-string order.
    pub const ALL: [EnvKey; 6] = [
        EnvKey::Server,
        EnvKey::Driver,
        EnvKey::Database,
        EnvKey::TrustedConnection,
        EnvKey::User,
        EnvKey::Pass,
    ];

    /// Returns the key as written in connection strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Driver => "driver",
            Self::Database => "database",
            Self::TrustedConnection => "trusted_connection",
            Self::User => "user",
            Self::Pass => "pass",
        }
    }

    /// Credentials are kept out of anything printable.
    pub fn is_secret(&self) -> bool {
        matches!(self, Self::User | Self::Pass)
    }
}

impl FromStr for EnvKey {
    type Err = GenDbError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == lower)
            .ok_or_else(|| {
                GenDbError::config(format!(
                    "Environment key '{s}' is not allowed. Allowed keys: server, driver, database, trusted_connection, user, pass"
                ))
            })
    }
}

impl fmt::Display for EnvKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection attributes for a database.
///
/// Deserialized through [`EnvKey`], so config keys are case-insensitive and
/// unknown keys are rejected just like in [`Environment::update`].
#[derive(Clone, Default, PartialEq)]
pub struct Environment {
    pub server: Option<String>,
    pub driver: Option<String>,
    pub database: Option<String>,
    pub trusted_connection: Option<String>,
    pub user: Option<String>,
    pub pass: Option<String>,

    /// Explicit dialect; when absent it is derived from `driver`.
    pub dialect: Option<Dialect>,
}

/// Connection string plus a credential-free view of it.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionParameters {
    /// `key=value;...;` string for the driver.
    pub connection: String,
    /// Printable `(key, value)` pairs, without `user`/`pass`.
    pub details: Vec<(&'static str, String)>,
}

impl Environment {
    /// Creates an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an environment from key/value entries.
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut env = Self::new();
        env.update(entries)?;
        Ok(env)
    }

    /// Applies an update from key/value entries.
    ///
    /// Keys are matched case-insensitively. If any key is not one of the
    /// allowed attributes the whole update is rejected and nothing changes.
    pub fn update<I, K, V>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut parsed = Vec::new();
        for (key, value) in entries {
            match key.as_ref().parse::<EnvKey>() {
                Ok(k) => parsed.push((k, value.into())),
                Err(e) => {
                    error!("Updating ENV: {e}");
                    return Err(e);
                }
            }
        }

        let keys: Vec<&str> = parsed.iter().map(|(k, _)| k.as_str()).collect();
        info!("Updating ENV: {:?}", keys);
        for (key, value) in parsed {
            self.set(key, Some(value));
        }
        Ok(())
    }

    /// Returns the value stored for `key`.
    pub fn get(&self, key: EnvKey) -> Option<&str> {
        match key {
            EnvKey::Server => self.server.as_deref(),
            EnvKey::Driver => self.driver.as_deref(),
            EnvKey::Database => self.database.as_deref(),
            EnvKey::TrustedConnection => self.trusted_connection.as_deref(),
            EnvKey::User => self.user.as_deref(),
            EnvKey::Pass => self.pass.as_deref(),
        }
    }

    /// Sets or clears the value for `key`.
    pub fn set(&mut self, key: EnvKey, value: Option<String>) {
        let slot = match key {
            EnvKey::Server => &mut self.server,
            EnvKey::Driver => &mut self.driver,
            EnvKey::Database => &mut self.database,
            EnvKey::TrustedConnection => &mut self.trusted_connection,
            EnvKey::User => &mut self.user,
            EnvKey::Pass => &mut self.pass,
        };
        *slot = value;
    }

    /// Sets an explicit dialect, overriding driver-name detection.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Returns the dialect for this environment.
    pub fn dialect(&self) -> Dialect {
        self.dialect.unwrap_or_else(|| {
            self.driver
                .as_deref()
                .map(Dialect::from_driver)
                .unwrap_or_default()
        })
    }

    /// Builds the driver connection string.
    ///
    /// Keys appear in fixed order; unset and blank values are skipped.
    pub fn connection_parameters(&self) -> ConnectionParameters {
        let mut pairs = Vec::new();
        let mut details = Vec::new();

        for key in EnvKey::ALL {
            let Some(value) = self.get(key).filter(|v| !v.is_empty()) else {
                continue;
            };
            pairs.push(format!("{}={}", key.as_str(), value));
            if !key.is_secret() {
                details.push((key.as_str(), value.to_string()));
            }
        }

        ConnectionParameters {
            connection: format!("{};", pairs.join(";")),
            details,
        }
    }

    /// Returns a display-safe string (no credentials).
    pub fn display_string(&self) -> String {
        let database = self.database.as_deref().unwrap_or("unknown");
        let server = self.server.as_deref().unwrap_or("local");
        format!("{database} @ {server} ({})", self.dialect())
    }
}

impl<'de> Deserialize<'de> for Environment {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = BTreeMap::<String, String>::deserialize(deserializer)?;
        let mut environment = Environment::new();
        let mut attributes = Vec::with_capacity(entries.len());

        for (key, value) in entries {
            if key.eq_ignore_ascii_case("dialect") {
                let dialect = Dialect::parse(&value)
                    .ok_or_else(|| de::Error::custom(format!("unknown dialect '{value}'")))?;
                environment.dialect = Some(dialect);
            } else {
                attributes.push((key, value));
            }
        }

        environment.update(attributes).map_err(de::Error::custom)?;
        Ok(environment)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("server", &self.server)
            .field("driver", &self.driver)
            .field("database", &self.database)
            .field("trusted_connection", &self.trusted_connection)
            .field("user", &self.user.as_ref().map(|_| "<redacted>"))
            .field("pass", &self.pass.as_ref().map(|_| "<redacted>"))
            .field("dialect", &self.dialect)
            .finish()
    }
}

/// Execution settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Connection/execution timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Dumps statements, parameters and the first row at debug level.
    #[serde(default)]
    pub debug: bool,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            debug: false,
        }
    }
}

/// Main configuration file structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Execution settings.
    #[serde(default)]
    pub settings: Settings,

    /// Named connection environments.
    #[serde(default)]
    pub environments: HashMap<String, Environment>,
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gendb")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| GenDbError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            GenDbError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Gets a named environment, or the default one if name is None.
    pub fn get_environment(&self, name: Option<&str>) -> Option<&Environment> {
        let key = name.unwrap_or("default");
        self.environments.get(key)
    }
}
