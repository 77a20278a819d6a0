//! Database connectivity layer for gendb.
//!
//! Execution is delegated to a [`Connector`]. The sqlx-backed connector opens
//! one connection per call, runs the statement with positional parameters and
//! hands back every row; test doubles implement the same trait.

mod mock;
mod postgres;
mod sqlite;
mod types;

pub use mock::{FailingConnector, MockConnector, RecordedCall};
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::Environment;
use crate::dialect::Dialect;
use crate::error::{GenDbError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Everything a connector needs to run one statement.
#[derive(Debug, Clone, Copy)]
pub struct QueryRequest<'a> {
    /// Connection attributes.
    pub environment: &'a Environment,
    /// Dialect resolved for the environment.
    pub dialect: Dialect,
    /// SQL text with `?` placeholders.
    pub sql: &'a str,
    /// Values for the placeholders, in order.
    pub params: &'a [Value],
    /// Connection timeout.
    pub timeout: Duration,
}

/// Trait defining the interface for connectivity adapters.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connects, executes the statement, fetches all rows and disconnects.
    async fn run(&self, request: QueryRequest<'_>) -> Result<QueryResult>;
}

/// Connector backed by sqlx drivers.
///
/// SQLite and PostgreSQL environments are supported. Other dialects have no
/// driver available and fail with a connection error.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlxConnector;

impl SqlxConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for SqlxConnector {
    async fn run(&self, request: QueryRequest<'_>) -> Result<QueryResult> {
        match request.dialect {
            Dialect::Sqlite => sqlite::run(request).await,
            Dialect::Postgres => postgres::run(request).await,
            other => Err(GenDbError::connection(format!(
                "No driver available for '{other}' environments ({})",
                request.environment.display_string()
            ))),
        }
    }
}

/// Maps a timed-out connection attempt to an error.
fn timeout_error(target: &str, timeout: Duration) -> GenDbError {
    GenDbError::connection(format!(
        "Connection to {target} timed out after {} seconds",
        timeout.as_secs()
    ))
}
