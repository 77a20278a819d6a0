//! SQL dialect rules.
//!
//! A dialect is resolved once, when the environment is configured, and then
//! drives how numeric comparisons are written: whether the column is guarded
//! by a numeric check and how it is cast before comparing.

use crate::db::Value;
use std::fmt;

/// Target database dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    SqlServer,
    Sqlite,
    Postgres,
    Oracle,
    /// Unrecognised driver: no checks, no casts.
    #[default]
    Generic,
}

impl Dialect {
    /// Derives the dialect from a free-text ODBC driver name.
    ///
    /// Matching is a case-sensitive substring search, checked in the order
    /// SQL Server, SQLite, PostgreSQL, Oracle.
    pub fn from_driver(driver: &str) -> Self {
        if driver.contains("SQL Server") {
            Self::SqlServer
        } else if driver.contains("SQLite") {
            Self::Sqlite
        } else if driver.contains("PostgreSQL") {
            Self::Postgres
        } else if driver.contains("Oracle") {
            Self::Oracle
        } else {
            Self::Generic
        }
    }

    /// Parses an explicit dialect name from config or the command line.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sqlserver" | "sql server" | "mssql" | "tsql" => Some(Self::SqlServer),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            "oracle" => Some(Self::Oracle),
            "generic" => Some(Self::Generic),
            _ => None,
        }
    }

    /// Returns the dialect name for display and persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SqlServer => "sqlserver",
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
            Self::Oracle => "oracle",
            Self::Generic => "generic",
        }
    }

    /// Predicate asserting that `field` holds something numeric, for
    /// dialects that have one.
    pub fn numeric_check(&self, field: &str) -> Option<String> {
        match self {
            Self::SqlServer => Some(format!("ISNUMERIC({field}) = 1")),
            Self::Sqlite | Self::Postgres | Self::Oracle | Self::Generic => None,
        }
    }

    /// Expression that casts `field` to the numeric type of `value`.
    ///
    /// Non-numeric values and dialects without cast rules get the bare field.
    pub fn coerce_expression(&self, field: &str, value: &Value) -> String {
        match (self, value) {
            (Self::SqlServer, Value::Int(_)) => format!("TRY_CONVERT(bigint, {field})"),
            (Self::SqlServer, Value::Float(_)) => format!("TRY_CONVERT(dec(38,2), {field})"),
            (Self::Sqlite, Value::Int(_)) => format!("CAST({field} AS INT)"),
            (Self::Sqlite, Value::Float(_)) => format!("CAST({field} AS REAL)"),
            _ => field.to_string(),
        }
    }

    /// Left-hand side of a numeric comparison: the numeric check (if any)
    /// ANDed with the coerced field.
    pub fn numeric_operand(&self, field: &str, value: &Value) -> String {
        let coerced = self.coerce_expression(field, value);
        match self.numeric_check(field) {
            Some(check) => format!("{check} AND {coerced}"),
            None => coerced,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
