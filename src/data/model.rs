use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DataError;

// ---------------------------------------------------------------------------
// DataType – declared kind of a column
// ---------------------------------------------------------------------------

/// The declared type of a column. Predicates are registered per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Float,
    Bool,
    String,
    /// ISO-8601 date kept as text; compares lexicographically.
    Date,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::Bool => "bool",
            DataType::String => "string",
            DataType::Date => "date",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// CellValue – a single cell in a column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Date(String),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Integer(v)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<bool> for CellValue {
    fn from(v: bool) -> Self {
        CellValue::Bool(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::String(v.to_string())
    }
}

impl From<String> for CellValue {
    fn from(v: String) -> Self {
        CellValue::String(v)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(CellValue::Null, Into::into)
    }
}

impl CellValue {
    /// The runtime type of the value, `None` for `Null`.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            CellValue::Integer(_) => Some(DataType::Integer),
            CellValue::Float(_) => Some(DataType::Float),
            CellValue::Bool(_) => Some(DataType::Bool),
            CellValue::String(_) => Some(DataType::String),
            CellValue::Date(_) => Some(DataType::Date),
            CellValue::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Coerce the value so it can live in a column of type `target`.
    ///
    /// Integers widen into float columns and strings become dates; anything
    /// else must already match. Returns the value unchanged on mismatch so the
    /// caller can report the original type.
    pub fn coerce_to(self, target: DataType) -> Result<CellValue, CellValue> {
        match (self, target) {
            (CellValue::Null, _) => Ok(CellValue::Null),
            (CellValue::Integer(i), DataType::Float) => Ok(CellValue::Float(i as f64)),
            (CellValue::String(s), DataType::Date) => Ok(CellValue::Date(s)),
            (v, t) if v.data_type() == Some(t) => Ok(v),
            (v, _) => Err(v),
        }
    }

    /// Parse user-entered text as a value of type `data_type`.
    /// Empty text and `null` parse to `Null`.
    pub fn parse_as(data_type: DataType, text: &str) -> Option<CellValue> {
        let text = text.trim();
        if text.is_empty() || text.eq_ignore_ascii_case("null") {
            return Some(CellValue::Null);
        }
        match data_type {
            DataType::Integer => text.parse().ok().map(CellValue::Integer),
            DataType::Float => text.parse().ok().map(CellValue::Float),
            DataType::Bool => text.parse().ok().map(CellValue::Bool),
            DataType::String => Some(CellValue::String(text.to_string())),
            DataType::Date => Some(CellValue::Date(text.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// DataColumn – column metadata
// ---------------------------------------------------------------------------

/// Stable lookup key of a column. Filters hold keys, never columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnKey(pub String);

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ColumnKey {
    fn from(key: &str) -> Self {
        ColumnKey(key.to_string())
    }
}

impl From<String> for ColumnKey {
    fn from(key: String) -> Self {
        ColumnKey(key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataColumn {
    pub key: ColumnKey,
    /// Display name.
    pub name: String,
    pub data_type: DataType,
}

impl DataColumn {
    pub fn new(key: impl Into<ColumnKey>, data_type: DataType) -> Self {
        let key = key.into();
        DataColumn {
            name: key.0.clone(),
            key,
            data_type,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

// ---------------------------------------------------------------------------
// DataTable – columnar store
// ---------------------------------------------------------------------------

/// Immutable columnar table. Every column holds exactly `row_count` cells.
#[derive(Debug, Clone, Default)]
pub struct DataTable {
    columns: Vec<DataColumn>,
    cells: Vec<Vec<CellValue>>,
    index: HashMap<ColumnKey, usize>,
    row_count: usize,
}

impl DataTable {
    pub fn builder() -> TableBuilder {
        TableBuilder::default()
    }

    /// Build a table from `(column, cells)` pairs, validating lengths and types.
    pub fn try_from_columns(
        columns: impl IntoIterator<Item = (DataColumn, Vec<CellValue>)>,
    ) -> Result<Self, DataError> {
        columns
            .into_iter()
            .fold(TableBuilder::default(), |b, (col, cells)| b.column(col, cells))
            .build()
    }

    pub fn column(&self, key: &ColumnKey) -> Option<&DataColumn> {
        self.index.get(key).map(|&i| &self.columns[i])
    }

    /// All cells of a column, indexed by row.
    pub fn cells(&self, key: &ColumnKey) -> Option<&[CellValue]> {
        self.index.get(key).map(|&i| self.cells[i].as_slice())
    }

    /// A single cell. A missing column yields `Ok(None)`; a bad row is an error.
    pub fn cell(&self, key: &ColumnKey, row: usize) -> Result<Option<&CellValue>, DataError> {
        let Some(cells) = self.cells(key) else {
            return Ok(None);
        };
        cells.get(row).map(Some).ok_or(DataError::RowOutOfRange {
            row,
            row_count: self.row_count,
        })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Columns in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = &DataColumn> {
        self.columns.iter()
    }
}

/// Incremental [`DataTable`] construction; errors are reported by [`TableBuilder::build`].
#[derive(Debug, Default)]
pub struct TableBuilder {
    columns: Vec<(DataColumn, Vec<CellValue>)>,
}

impl TableBuilder {
    pub fn column(mut self, column: DataColumn, cells: Vec<CellValue>) -> Self {
        self.columns.push((column, cells));
        self
    }

    pub fn build(self) -> Result<DataTable, DataError> {
        let row_count = self.columns.first().map_or(0, |(_, cells)| cells.len());
        let mut table = DataTable {
            row_count,
            ..DataTable::default()
        };

        for (column, cells) in self.columns {
            if table.index.contains_key(&column.key) {
                return Err(DataError::DuplicateColumn(column.key));
            }
            if cells.len() != row_count {
                return Err(DataError::ColumnLengthMismatch {
                    key: column.key,
                    expected: row_count,
                    actual: cells.len(),
                });
            }

            let cells = cells
                .into_iter()
                .enumerate()
                .map(|(row, value)| {
                    value.coerce_to(column.data_type).map_err(|original| {
                        DataError::CellTypeMismatch {
                            key: column.key.clone(),
                            row,
                            expected: column.data_type,
                            // coerce_to only rejects non-null values
                            actual: original.data_type().unwrap_or(column.data_type),
                        }
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            table.index.insert(column.key.clone(), table.columns.len());
            table.columns.push(column);
            table.cells.push(cells);
        }

        Ok(table)
    }
}
