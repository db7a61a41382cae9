//! Core data structures for dqscope.
//!
//! A [`Dataset`] is an ordered set of records over a fixed header list. Cells
//! are `Option<String>`: `None` is a null cell, `Some("")` is the empty-string
//! sentinel. Both count as missing for completeness purposes. Row position is
//! the only row identity.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::de::Error as _;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{DqError, Result};

/// Returns true when a cell value counts as missing (null or empty string).
pub fn is_missing(value: Option<&str>) -> bool {
    value.is_none_or(str::is_empty)
}

/// Tabular dataset held fully in memory.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Dataset {
    /// Builds a dataset from keyed records.
    ///
    /// Header keys absent from a record are filled with `None`. A record
    /// carrying a key outside `headers` is rejected.
    pub fn new(
        headers: Vec<String>,
        records: Vec<BTreeMap<String, Option<String>>>,
    ) -> Result<Self> {
        check_headers(&headers)?;
        let mut rows = Vec::with_capacity(records.len());
        for (index, mut record) in records.into_iter().enumerate() {
            let row: Vec<Option<String>> =
                headers.iter().map(|h| record.remove(h).flatten()).collect();
            if let Some(extra) = record.keys().next() {
                return Err(DqError::dataset(format!(
                    "row {} has column '{}' which is not in the header list",
                    index, extra
                )));
            }
            rows.push(row);
        }
        Ok(Self { headers, rows })
    }

    /// Builds a dataset from positional rows.
    ///
    /// Short rows are padded with `None`; rows longer than the header list
    /// are rejected.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Result<Self> {
        check_headers(&headers)?;
        let width = headers.len();
        let mut normalized = Vec::with_capacity(rows.len());
        for (index, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(DqError::dataset(format!(
                    "row {} has {} cells but only {} headers",
                    index,
                    row.len(),
                    width
                )));
            }
            row.resize(width, None);
            normalized.push(row);
        }
        Ok(Self {
            headers,
            rows: normalized,
        })
    }

    /// Parses a dataset from JSON.
    ///
    /// Accepts either `{"headers": [...], "rows": [...]}` (rows as objects or
    /// arrays) or a bare array of objects, in which case headers are taken in
    /// first-seen key order.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| DqError::serialization("dataset JSON", e))
    }

    /// Reads a dataset from a JSON file in either accepted shape.
    ///
    /// # Errors
    /// Returns `DqError::Io` if the file cannot be read, or the errors of
    /// [`Self::from_json_str`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| DqError::io(format!("reading dataset {}", path.display()), e))?;
        Self::from_json_str(&text)
    }

    /// Column names in declaration order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of records.
    pub const fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true when the dataset has no records.
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column in the header list.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// Returns true if the dataset has the named column.
    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// Cell value at `(row, column)`; `None` for null cells and unknown positions.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.cell(row, index)
    }

    /// Cell value at `(row, column index)`.
    pub fn cell(&self, row: usize, column_index: usize) -> Option<&str> {
        self.rows.get(row)?.get(column_index)?.as_deref()
    }

    /// All cells of a column in row order, or `None` for an unknown column.
    pub fn column_values(&self, column: &str) -> Option<Vec<Option<&str>>> {
        let index = self.column_index(column)?;
        Some(self.rows.iter().map(|r| r[index].as_deref()).collect())
    }

    /// Non-missing cells of a column in row order. Empty for unknown columns.
    pub fn non_missing_values(&self, column: &str) -> Vec<&str> {
        self.column_values(column)
            .unwrap_or_default()
            .into_iter()
            .filter(|v| !is_missing(*v))
            .flatten()
            .collect()
    }

    /// Stable identity for per-dataset suggestion state: `h1|h2|..__<rows>`.
    pub fn signature(&self) -> String {
        format!("{}__{}", self.headers.join("|"), self.rows.len())
    }

    /// Records as JSON objects keyed by header.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .zip(row)
                    .map(|(h, v)| (h.clone(), v.clone().map_or(Value::Null, Value::String)))
                    .collect()
            })
            .collect()
    }
}

fn check_headers(headers: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for header in headers {
        if !seen.insert(header.as_str()) {
            return Err(DqError::dataset(format!("duplicate header '{}'", header)));
        }
    }
    Ok(())
}

/// Converts a JSON scalar into a cell value.
fn cell_from_json(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RowPayload {
    Object(Map<String, Value>),
    Array(Vec<Value>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DatasetPayload {
    Table {
        headers: Vec<String>,
        rows: Vec<RowPayload>,
    },
    Records(Vec<Map<String, Value>>),
}

impl DatasetPayload {
    fn into_dataset(self) -> Result<Dataset> {
        match self {
            Self::Table { headers, rows } => {
                let mut positional = Vec::with_capacity(rows.len());
                for (index, row) in rows.into_iter().enumerate() {
                    match row {
                        RowPayload::Array(cells) => {
                            positional.push(cells.into_iter().map(cell_from_json).collect());
                        }
                        RowPayload::Object(mut object) => {
                            let cells: Vec<Option<String>> = headers
                                .iter()
                                .map(|h| object.remove(h).and_then(cell_from_json))
                                .collect();
                            if let Some(extra) = object.keys().next() {
                                return Err(DqError::dataset(format!(
                                    "row {} has column '{}' which is not in the header list",
                                    index, extra
                                )));
                            }
                            positional.push(cells);
                        }
                    }
                }
                Dataset::from_rows(headers, positional)
            }
            Self::Records(records) => {
                let mut headers: Vec<String> = Vec::new();
                for record in &records {
                    for key in record.keys() {
                        if !headers.contains(key) {
                            headers.push(key.clone());
                        }
                    }
                }
                let rows = records
                    .into_iter()
                    .map(|mut record| {
                        headers
                            .iter()
                            .map(|h| record.remove(h).and_then(cell_from_json))
                            .collect()
                    })
                    .collect();
                Dataset::from_rows(headers, rows)
            }
        }
    }
}

impl<'de> Deserialize<'de> for Dataset {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        DatasetPayload::deserialize(deserializer)?
            .into_dataset()
            .map_err(D::Error::custom)
    }
}

impl Serialize for Dataset {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Dataset", 2)?;
        state.serialize_field("headers", &self.headers)?;
        state.serialize_field("rows", &self.to_records())?;
        state.end()
    }
}
