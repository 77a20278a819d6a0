//! Error types for gendb.
//!
//! Defines the main error enum used throughout the crate. Every fallible
//! operation returns one of these instead of logging and carrying on.

use thiserror::Error;

/// Main error type for gendb operations.
#[derive(Error, Debug)]
pub enum GenDbError {
    /// Configuration errors (unknown environment keys, unreadable SQL files, bad config files).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected conditional clauses (bad operator, bad field name, unsupported value).
    #[error("Condition error: {0}")]
    Condition(String),

    /// Database connection errors (driver unavailable, host unreachable, auth failed).
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, parameter mismatches, timeouts).
    #[error("Query error: {0}")]
    Query(String),

    /// Result export errors (empty result set, file I/O).
    #[error("Export error: {0}")]
    Export(String),

    /// Internal errors (unexpected states, bugs).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GenDbError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a condition error with the given message.
    pub fn condition(msg: impl Into<String>) -> Self {
        Self::Condition(msg.into())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an export error with the given message.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::Condition(_) => "Condition Error",
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Export(_) => "Export Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using GenDbError.
pub type Result<T> = std::result::Result<T, GenDbError>;
