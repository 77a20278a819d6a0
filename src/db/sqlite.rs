//! SQLite execution through sqlx.
//!
//! The environment's `database` attribute is the path of an existing database
//! file. Placeholders are already `?`, so the SQL is passed through as-is.

use super::{timeout_error, ColumnInfo, QueryRequest, QueryResult, Row, Value};
use crate::error::{GenDbError, Result};
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteRow};
use sqlx::{Column, ConnectOptions, Connection, Row as SqlxRow, Sqlite, TypeInfo, ValueRef};
use std::time::Instant;
use tracing::{debug, warn};

pub(super) async fn run(request: QueryRequest<'_>) -> Result<QueryResult> {
    let path = request
        .environment
        .database
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| GenDbError::config("SQLite environments need a 'database' file path"))?;

    let options = SqliteConnectOptions::new()
        .filename(path)
        .busy_timeout(request.timeout);

    debug!("Opening SQLite database {path}");
    let mut conn = tokio::time::timeout(request.timeout, options.connect())
        .await
        .map_err(|_| timeout_error(path, request.timeout))?
        .map_err(|e| GenDbError::connection(format!("Cannot open SQLite database {path}: {e}")))?;

    let start = Instant::now();
    let query = request
        .params
        .iter()
        .fold(sqlx::query(request.sql), bind_value);
    let fetched = query.fetch_all(&mut conn).await;
    let execution_time = start.elapsed();

    // Close before looking at the outcome so failures don't leak the handle.
    if let Err(e) = conn.close().await {
        warn!("Failed to close SQLite connection: {e}");
    }

    let rows = fetched.map_err(|e| GenDbError::query(e.to_string()))?;

    let columns = rows
        .first()
        .map(|row| {
            row.columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect()
        })
        .unwrap_or_default();

    let rows = rows.iter().map(convert_row).collect::<Result<Vec<_>>>()?;
    Ok(QueryResult::with_data(columns, rows).with_execution_time(execution_time))
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &Value,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value.clone() {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(b),
        Value::Int(i) => query.bind(i),
        Value::Float(f) => query.bind(f),
        Value::String(s) => query.bind(s),
        Value::Bytes(b) => query.bind(b),
        Value::Date(d) => query.bind(d),
        Value::Time(t) => query.bind(t),
        Value::DateTime(dt) => query.bind(dt),
        Value::DateTimeUtc(dt) => query.bind(dt),
    }
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Result<Row> {
    (0..row.columns().len())
        .map(|i| convert_value(row, i))
        .collect()
}

/// Converts a single column value using the storage class of the value
/// itself; SQLite columns are loosely typed.
///
/// NULL becomes `Value::Null`; a value that cannot be decoded is an error.
fn convert_value(row: &SqliteRow, index: usize) -> Result<Value> {
    let decode_error = |e: sqlx::Error| {
        GenDbError::query(format!("Cannot decode column {index}: {e}"))
    };

    let raw = row.try_get_raw(index).map_err(decode_error)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let storage = raw.type_info().name().to_uppercase();

    let value = match storage.as_str() {
        "INTEGER" => row.try_get::<i64, _>(index).map(Value::Int),
        "REAL" => row.try_get::<f64, _>(index).map(Value::Float),
        "BOOLEAN" => row.try_get::<bool, _>(index).map(Value::Bool),
        "BLOB" => row.try_get::<Vec<u8>, _>(index).map(Value::Bytes),
        _ => row.try_get::<String, _>(index).map(Value::String),
    };

    value.map_err(decode_error)
}
