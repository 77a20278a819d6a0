//! gendb - A small parameterized SQL query builder.
//!
//! This library exposes the core modules for use by the binary and by
//! integration tests.

pub mod cli;
pub mod config;
pub mod db;
pub mod dialect;
pub mod error;
pub mod logging;
pub mod query;
pub mod results;

pub use config::{Config, Environment, Settings};
pub use db::{Connector, SqlxConnector, Value};
pub use dialect::Dialect;
pub use error::{GenDbError, Result};
pub use query::{ConditionValue, QueryBuilder};
pub use results::{Record, ResultSet};
