//! Command-line argument parsing for gendb.
//!
//! Uses clap to describe one query run: where to connect, what SQL to run,
//! which conditions to append and how to shape and export the rows.

use crate::config::{Config, Environment, Settings};
use crate::db::Value;
use crate::dialect::Dialect;
use crate::error::{GenDbError, Result};
use crate::query::{ConditionValue, Operator};
use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;

/// Build, run and export a parameterized SQL query.
#[derive(Parser, Debug)]
#[command(name = "gendb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQL text, or a path to a .sql file
    #[arg(short = 's', long, value_name = "SQL")]
    pub sql: String,

    /// Positional parameter for the base SQL (repeatable, in order)
    #[arg(short = 'v', long = "var", value_name = "VALUE")]
    pub vars: Vec<String>,

    /// Condition appended as `AND ...` (repeatable), e.g. --where testInt '!=' 10
    #[arg(
        short = 'w',
        long = "where",
        num_args = 3,
        value_names = ["FIELD", "OP", "VALUE"],
        allow_hyphen_values = true
    )]
    pub conditions: Vec<String>,

    /// Named environment from the config file
    #[arg(short = 'e', long = "env", value_name = "NAME")]
    pub environment: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// ODBC-style driver name (also used to detect the dialect)
    #[arg(long, value_name = "DRIVER")]
    pub driver: Option<String>,

    /// Database server (host[:port])
    #[arg(long, value_name = "SERVER")]
    pub server: Option<String>,

    /// Database name or file path
    #[arg(short = 'd', long, value_name = "DATABASE")]
    pub database: Option<String>,

    /// Trusted connection flag passed through to the driver
    #[arg(long, value_name = "YES|NO")]
    pub trusted_connection: Option<String>,

    /// Database user
    #[arg(short = 'U', long, value_name = "USER")]
    pub user: Option<String>,

    /// Database password
    #[arg(long, env = "GENDB_PASS", hide_env_values = true, value_name = "PASS")]
    pub pass: Option<String>,

    /// Explicit dialect: sqlserver, sqlite, postgres, oracle, generic
    #[arg(long, value_name = "DIALECT")]
    pub dialect: Option<String>,

    /// Comma-separated fields to keep
    #[arg(long, value_name = "FIELDS", value_delimiter = ',')]
    pub select: Vec<String>,

    /// Rename a field, OLD=NEW (repeatable)
    #[arg(long, value_name = "OLD=NEW")]
    pub rename: Vec<String>,

    /// Export the rows as CSV
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// Export the rows as JSON
    #[arg(long, value_name = "PATH")]
    pub json: Option<PathBuf>,

    /// Connection timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Dump statements, parameters and the first row to the log
    #[arg(long)]
    pub debug: bool,

    /// Also write log lines to stderr
    #[arg(long)]
    pub verbose: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Resolves the environment: a named (or default) environment from the
    /// config file, overridden by any connection flags.
    pub fn resolve_environment(&self, config: &Config) -> Result<Environment> {
        let mut environment = match self.environment.as_deref() {
            Some(name) => config.get_environment(Some(name)).cloned().ok_or_else(|| {
                GenDbError::config(format!("Environment '{name}' not found in config file"))
            })?,
            None => config.get_environment(None).cloned().unwrap_or_default(),
        };

        let overrides: Vec<(&str, String)> = [
            ("server", &self.server),
            ("driver", &self.driver),
            ("database", &self.database),
            ("trusted_connection", &self.trusted_connection),
            ("user", &self.user),
            ("pass", &self.pass),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.clone().map(|v| (k, v)))
        .collect();
        environment.update(overrides)?;

        if let Some(name) = self.dialect.as_deref() {
            let dialect = Dialect::parse(name)
                .ok_or_else(|| GenDbError::config(format!("Unknown dialect '{name}'")))?;
            environment = environment.with_dialect(dialect);
        }

        Ok(environment)
    }

    /// Execution settings: config file values overridden by flags.
    pub fn settings(&self, config: &Config) -> Settings {
        Settings {
            timeout_secs: self.timeout.unwrap_or(config.settings.timeout_secs),
            debug: self.debug || config.settings.debug,
        }
    }

    /// Typed positional parameters.
    pub fn parsed_vars(&self) -> Vec<Value> {
        self.vars.iter().map(|v| parse_value(v)).collect()
    }

    /// `--where` triples with typed values. Values for `in`/`not in` are
    /// split on commas.
    pub fn parsed_conditions(&self) -> Result<Vec<(String, String, ConditionValue)>> {
        self.conditions
            .chunks(3)
            .map(|chunk| match chunk {
                [field, op, raw] => {
                    let is_membership = op
                        .parse::<Operator>()
                        .map(|o| o.is_membership())
                        .unwrap_or(false);
                    let value = if is_membership {
                        ConditionValue::List(
                            raw.split(',').map(|v| parse_value(v.trim())).collect(),
                        )
                    } else {
                        parse_value(raw).into()
                    };
                    Ok((field.clone(), op.clone(), value))
                }
                _ => Err(GenDbError::config("--where needs FIELD OP VALUE")),
            })
            .collect()
    }

    /// `--rename` pairs as an old-to-new mapping.
    pub fn rename_mapping(&self) -> Result<HashMap<String, String>> {
        self.rename
            .iter()
            .map(|pair| {
                pair.split_once('=')
                    .filter(|(old, new)| !old.is_empty() && !new.is_empty())
                    .map(|(old, new)| (old.to_string(), new.to_string()))
                    .ok_or_else(|| {
                        GenDbError::config(format!("Invalid rename '{pair}'. Expected OLD=NEW"))
                    })
            })
            .collect()
    }
}

/// Types a command-line value: `null`, integer, float, or text.
pub fn parse_value(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("null") {
        Value::Null
    } else if let Ok(i) = raw.parse::<i64>() {
        Value::Int(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        Value::Float(f)
    } else {
        Value::String(raw.to_string())
    }
}
