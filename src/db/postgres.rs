//! PostgreSQL execution through sqlx.
//!
//! `server` is `host[:port]`, `database`, `user` and `pass` map onto the
//! connection options. `?` placeholders are rewritten to `$n`.

use super::{timeout_error, ColumnInfo, QueryRequest, QueryResult, Row, Value};
use crate::config::Environment;
use crate::error::{GenDbError, Result};
use crate::query::to_numbered;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgRow};
use sqlx::query::Query;
use sqlx::types::{Decimal, JsonValue, Uuid};
use sqlx::{Column, ConnectOptions, Connection, Postgres, Row as SqlxRow, TypeInfo, ValueRef};
use std::time::Instant;
use tracing::{debug, warn};

/// Default PostgreSQL port when `server` carries none.
const DEFAULT_PORT: u16 = 5432;

pub(super) async fn run(request: QueryRequest<'_>) -> Result<QueryResult> {
    let options = connect_options(request.environment)?;
    let target = request.environment.display_string();

    debug!("Connecting to PostgreSQL at {target}");
    let mut conn = tokio::time::timeout(request.timeout, options.connect())
        .await
        .map_err(|_| timeout_error(&target, request.timeout))?
        .map_err(|e| GenDbError::connection(format!("Cannot connect to {target}: {e}")))?;

    let sql = to_numbered(request.sql);
    let start = Instant::now();
    let query = request.params.iter().fold(sqlx::query(&sql), bind_value);
    let fetched = query.fetch_all(&mut conn).await;
    let execution_time = start.elapsed();

    if let Err(e) = conn.close().await {
        warn!("Failed to close PostgreSQL connection: {e}");
    }

    let rows = fetched.map_err(|e| GenDbError::query(format_query_error(e)))?;

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

/// Builds connection options from the environment attributes.
fn connect_options(environment: &Environment) -> Result<PgConnectOptions> {
    let mut options = PgConnectOptions::new();

    if let Some(server) = environment.server.as_deref().filter(|s| !s.is_empty()) {
        let (host, port) = split_server(server)?;
        options = options.host(host).port(port);
    }
    if let Some(database) = environment.database.as_deref().filter(|s| !s.is_empty()) {
        options = options.database(database);
    }
    if let Some(user) = environment.user.as_deref().filter(|s| !s.is_empty()) {
        options = options.username(user);
    }
    if let Some(pass) = environment.pass.as_deref().filter(|s| !s.is_empty()) {
        options = options.password(pass);
    }

    Ok(options)
}

/// Splits `host[:port]`.
fn split_server(server: &str) -> Result<(&str, u16)> {
    match server.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse::<u16>().map_err(|_| {
                GenDbError::config(format!("Invalid port in server '{server}'"))
            })?;
            Ok((host, port))
        }
        None => Ok((server, DEFAULT_PORT)),
    }
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &Value,
) -> Query<'q, Postgres, PgArguments> {
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

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Result<Row> {
    row.columns()
        .iter()
        .map(|col| convert_value(row, col.ordinal(), col.name(), col.type_info().name()))
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
///
/// SQL NULL becomes `Value::Null`; a non-null value that cannot be decoded
/// is an error. NUMERIC, UUID and JSON values are kept as text so no
/// precision is lost.
fn convert_value(row: &PgRow, index: usize, name: &str, type_name: &str) -> Result<Value> {
    let decode_error = |e: sqlx::Error| {
        GenDbError::query(format!("Cannot decode column '{name}' ({type_name}): {e}"))
    };

    if row.try_get_raw(index).map_err(decode_error)?.is_null() {
        return Ok(Value::Null);
    }

    let value = match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => row.try_get::<bool, _>(index).map(Value::Bool),
        "INT2" | "SMALLINT" => row
            .try_get::<i16, _>(index)
            .map(|v| Value::Int(v.into())),
        "INT4" | "INT" | "INTEGER" => row
            .try_get::<i32, _>(index)
            .map(|v| Value::Int(v.into())),
        "INT8" | "BIGINT" => row.try_get::<i64, _>(index).map(Value::Int),
        "FLOAT4" | "REAL" => row
            .try_get::<f32, _>(index)
            .map(|v| Value::Float(v.into())),
        "FLOAT8" | "DOUBLE PRECISION" => row.try_get::<f64, _>(index).map(Value::Float),
        "NUMERIC" | "DECIMAL" => row
            .try_get::<Decimal, _>(index)
            .map(|d| Value::String(d.to_string())),
        "UUID" => row
            .try_get::<Uuid, _>(index)
            .map(|u| Value::String(u.to_string())),
        "JSON" | "JSONB" => row
            .try_get::<JsonValue, _>(index)
            .map(|j| Value::String(j.to_string())),
        "BYTEA" => row.try_get::<Vec<u8>, _>(index).map(Value::Bytes),
        "DATE" => row.try_get::<chrono::NaiveDate, _>(index).map(Value::Date),
        "TIME" => row.try_get::<chrono::NaiveTime, _>(index).map(Value::Time),
        "TIMESTAMP" => row
            .try_get::<chrono::NaiveDateTime, _>(index)
            .map(Value::DateTime),
        "TIMESTAMPTZ" => row
            .try_get::<chrono::DateTime<chrono::Utc>, _>(index)
            .map(Value::DateTimeUtc),
        _ => row.try_get::<String, _>(index).map(Value::String),
    };

    value.map_err(decode_error)
}

/// Formats a query error with the server's detail and hint, if any.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = format!("ERROR: {}", db_error.message());
    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }
        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }
    }
    result
}
