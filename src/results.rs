//! In-memory result sets and their post-processing.
//!
//! A [`ResultSet`] is the list of records produced by the last execution.
//! Records keep the column order reported by the cursor. Projection, renaming
//! and CSV/JSON export all work on this in-memory copy.

use crate::db::{QueryResult, Value};
use crate::error::{GenDbError, Result};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// One row as an ordered column-name to value mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from `(name, value)` pairs; a repeated name keeps its
    /// first position and takes the last value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut record = Self::new();
        for (k, v) in pairs {
            record.insert(k, v);
        }
        record
    }

    /// Sets `name` to `value`, replacing an existing entry in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Column names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// The records returned by a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultSet {
    rows: Vec<Record>,
}

impl ResultSet {
    /// Creates an empty result set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a result set from records.
    pub fn from_records(rows: Vec<Record>) -> Self {
        Self { rows }
    }

    /// Pairs every row with the column names reported by the cursor.
    pub fn from_query_result(result: QueryResult) -> Self {
        let names: Vec<String> = result.columns.into_iter().map(|c| c.name).collect();
        let rows = result
            .rows
            .into_iter()
            .map(|row| Record::from_pairs(names.iter().cloned().zip(row)))
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Record> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names of the first record, or None when there are no records.
    pub fn fields(&self) -> Option<Vec<&str>> {
        self.rows.first().map(|r| r.keys().collect())
    }

    /// Values of `field` across all records.
    ///
    /// Returns None when the set is empty or the first record lacks the
    /// field; records without the field are skipped.
    pub fn field_data(&self, field: &str) -> Option<Vec<&Value>> {
        info!("Getting Field data for: {field}");
        let first = self.rows.first()?;
        if !first.contains(field) {
            return None;
        }
        Some(self.rows.iter().filter_map(|r| r.get(field)).collect())
    }

    /// Projects every record onto `fields`, in the order requested.
    ///
    /// Fields a record doesn't have are left out of that record.
    pub fn select_fields<S: AsRef<str>>(&self, fields: &[S]) -> ResultSet {
        let wanted: Vec<&str> = fields.iter().map(AsRef::as_ref).collect();
        info!("Selecting Fields: {:?}", wanted);
        let rows = self
            .rows
            .iter()
            .map(|row| {
                Record::from_pairs(
                    wanted
                        .iter()
                        .filter_map(|k| row.get(k).map(|v| (k.to_string(), v.clone()))),
                )
            })
            .collect();
        ResultSet { rows }
    }

    /// Renames fields in every record per `mapping` (old name to new name).
    pub fn rename_fields(&mut self, mapping: &HashMap<String, String>) {
        info!("Renaming Fields: {:?}", mapping);
        for row in &mut self.rows {
            let renamed = Record::from_pairs(row.fields.drain(..).map(|(k, v)| {
                let name = mapping.get(&k).cloned().unwrap_or(k);
                (name, v)
            }));
            *row = renamed;
        }
    }

    /// The records to export: all of them, or a projection when `fields` is non-empty.
    fn for_export<S: AsRef<str>>(&self, fields: &[S]) -> std::borrow::Cow<'_, ResultSet> {
        if fields.is_empty() {
            std::borrow::Cow::Borrowed(self)
        } else {
            std::borrow::Cow::Owned(self.select_fields(fields))
        }
    }

    /// Writes the records as CSV with a header row, forcing a `.csv` extension.
    ///
    /// The header comes from the first record, so an empty set cannot be
    /// exported. Returns the path written.
    pub fn export_csv<S: AsRef<str>>(
        &self,
        path: impl AsRef<Path>,
        fields: &[S],
    ) -> Result<PathBuf> {
        let output = path.as_ref().with_extension("csv");
        info!("Exporting CSV File: {}", output.display());

        let data = self.for_export(fields);
        let header: Vec<String> = match data.rows.first() {
            Some(first) => first.keys().map(str::to_string).collect(),
            None => {
                error!("Cannot export CSV: result set is empty");
                return Err(GenDbError::export("Cannot export CSV: result set is empty"));
            }
        };

        let mut out = String::new();
        push_csv_line(&mut out, header.iter().map(|h| csv_escape(h)));

        for (n, row) in data.rows.iter().enumerate() {
            if let Some(extra) = row.keys().find(|k| !header.iter().any(|h| h.as_str() == *k)) {
                return Err(GenDbError::export(format!(
                    "Row {n} has field '{extra}' which is not in the header"
                )));
            }
            push_csv_line(
                &mut out,
                header.iter().map(|h| {
                    row.get(h)
                        .map(|v| csv_escape(&v.to_export_string()))
                        .unwrap_or_default()
                }),
            );
        }

        write_file(&output, out.as_bytes())?;
        Ok(output)
    }

    /// Writes the records as a JSON array of objects, forcing a `.json` extension.
    ///
    /// Date/time values are written as ISO-8601 strings. Returns the path written.
    pub fn export_json<S: AsRef<str>>(
        &self,
        path: impl AsRef<Path>,
        fields: &[S],
    ) -> Result<PathBuf> {
        let output = path.as_ref().with_extension("json");
        info!("Exporting JSON File: {}", output.display());

        let data = self.for_export(fields);
        let json = serde_json::to_vec(&*data)
            .map_err(|e| GenDbError::export(format!("Failed to encode JSON: {e}")))?;

        write_file(&output, &json)?;
        Ok(output)
    }
}

/// Quotes a CSV cell when it holds a delimiter, quote or line break.
fn csv_escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn push_csv_line(out: &mut String, cells: impl Iterator<Item = String>) {
    out.push_str(&cells.collect::<Vec<_>>().join(","));
    out.push_str("\r\n");
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let io_err = |e: std::io::Error| {
        error!("Failed to write {}: {e}", path.display());
        GenDbError::export(format!("Failed to write {}: {e}", path.display()))
    };
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes).map_err(io_err)?;
    writer.flush().map_err(io_err)
}
