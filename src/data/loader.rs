use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray, BooleanArray, Float32Array, Float64Array};
use arrow::datatypes::{DataType as ArrowType, Int16Type, Int32Type, Int64Type, Int8Type};
use arrow::datatypes::{UInt16Type, UInt32Type, UInt64Type, UInt8Type};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, DataColumn, DataTable, DataType};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – any flat Parquet file; column types follow the Arrow schema
/// * `.json`    – `[{ "col": value, ... }, ...]`
/// * `.csv`     – header row followed by records
pub fn load_file(path: &Path) -> Result<DataTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::debug!(
        "loaded {} rows x {} columns from {}",
        table.row_count(),
        table.column_count(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Column accumulation & type inference (JSON / CSV)
// ---------------------------------------------------------------------------

/// Collects cells column by column, in order of first appearance.
#[derive(Default)]
struct ColumnAccumulator {
    keys: Vec<String>,
    index: HashMap<String, usize>,
    cells: Vec<Vec<CellValue>>,
    rows: usize,
}

impl ColumnAccumulator {
    /// Start with known columns so they exist even if every row is empty.
    fn with_keys(keys: &[String]) -> Self {
        let mut acc = Self::default();
        for key in keys {
            if !acc.index.contains_key(key) {
                acc.index.insert(key.clone(), acc.keys.len());
                acc.keys.push(key.clone());
                acc.cells.push(Vec::new());
            }
        }
        acc
    }

    fn push_row<'a>(&mut self, row: impl IntoIterator<Item = (&'a str, CellValue)>) {
        for (key, value) in row {
            let col = match self.index.get(key) {
                Some(&col) => col,
                None => {
                    // backfill rows that predate this column
                    self.index.insert(key.to_string(), self.keys.len());
                    self.keys.push(key.to_string());
                    self.cells.push(vec![CellValue::Null; self.rows]);
                    self.keys.len() - 1
                }
            };
            self.cells[col].push(value);
        }
        self.rows += 1;
        for cells in &mut self.cells {
            cells.resize(self.rows, CellValue::Null);
        }
    }

    fn finish(self) -> Result<DataTable> {
        let columns = self.keys.into_iter().zip(self.cells).map(|(key, cells)| {
            let data_type = infer_data_type(&cells);
            let cells = if data_type == DataType::String {
                cells.into_iter().map(stringify).collect()
            } else {
                cells
            };
            (DataColumn::new(key, data_type), cells)
        });
        Ok(DataTable::try_from_columns(columns)?)
    }
}

/// Narrowest type holding every non-null cell; all-null columns are strings.
fn infer_data_type(cells: &[CellValue]) -> DataType {
    let mut seen: Option<DataType> = None;
    for value in cells.iter().filter(|v| !v.is_null()) {
        let Some(t) = value.data_type() else { continue };
        seen = Some(match (seen, t) {
            (None, t) => t,
            (Some(a), b) if a == b => a,
            (Some(DataType::Integer), DataType::Float) | (Some(DataType::Float), DataType::Integer) => {
                DataType::Float
            }
            _ => return DataType::String,
        });
    }
    seen.unwrap_or(DataType::String)
}

fn stringify(value: CellValue) -> CellValue {
    match value {
        CellValue::Null | CellValue::String(_) => value,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "age": 5,  "name": "otter",  "score": 0.5 },
///   { "age": 15, "name": "badger", "score": null },
///   ...
/// ]
/// ```
/// Keys missing from a record are null for that row.
fn load_json(path: &Path) -> Result<DataTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut acc = ColumnAccumulator::default();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        acc.push_row(obj.iter().map(|(key, val)| (key.as_str(), json_to_cell(val))));
    }

    acc.finish()
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, then one record per row.
/// Empty fields are null.
fn load_csv(path: &Path) -> Result<DataTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut seen = HashSet::new();
    if let Some(dup) = headers.iter().find(|h| !seen.insert(h.as_str())) {
        bail!("CSV header '{dup}' appears more than once");
    }

    let mut acc = ColumnAccumulator::with_keys(&headers);

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() != headers.len() {
            bail!(
                "CSV row {row_no}: {} fields but {} headers",
                record.len(),
                headers.len()
            );
        }
        acc.push_row(
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, value)| (h.as_str(), guess_cell_type(value))),
        );
    }

    acc.finish()
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file.
///
/// Integer, float, boolean, string and date columns keep their type; any
/// other Arrow type is rendered as text.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<DataTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: Vec<(DataColumn, Vec<CellValue>)> = schema
        .fields()
        .iter()
        .map(|f| (DataColumn::new(f.name().as_str(), map_arrow_type(f.data_type())), Vec::new()))
        .collect();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (col_idx, (column, cells)) in columns.iter_mut().enumerate() {
            let array = batch.column(col_idx);
            cells.reserve(batch.num_rows());
            for row in 0..batch.num_rows() {
                let value = extract_cell(array, row)
                    .with_context(|| format!("Row {row}: failed to read '{}'", column.key))?;
                cells.push(value);
            }
        }
    }

    Ok(DataTable::try_from_columns(columns)?)
}

fn map_arrow_type(data_type: &ArrowType) -> DataType {
    match data_type {
        ArrowType::Int8
        | ArrowType::Int16
        | ArrowType::Int32
        | ArrowType::Int64
        | ArrowType::UInt8
        | ArrowType::UInt16
        | ArrowType::UInt32
        | ArrowType::UInt64 => DataType::Integer,
        ArrowType::Float32 | ArrowType::Float64 => DataType::Float,
        ArrowType::Boolean => DataType::Bool,
        ArrowType::Date32 | ArrowType::Date64 => DataType::Date,
        _ => DataType::String,
    }
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let value = match col.data_type() {
        ArrowType::Int8 => CellValue::Integer(col.as_primitive::<Int8Type>().value(row) as i64),
        ArrowType::Int16 => CellValue::Integer(col.as_primitive::<Int16Type>().value(row) as i64),
        ArrowType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        ArrowType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        ArrowType::UInt8 => CellValue::Integer(col.as_primitive::<UInt8Type>().value(row) as i64),
        ArrowType::UInt16 => CellValue::Integer(col.as_primitive::<UInt16Type>().value(row) as i64),
        ArrowType::UInt32 => CellValue::Integer(col.as_primitive::<UInt32Type>().value(row) as i64),
        ArrowType::UInt64 => {
            let v = col.as_primitive::<UInt64Type>().value(row);
            CellValue::Integer(i64::try_from(v).context("u64 value exceeds i64 range")?)
        }
        ArrowType::Float32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            CellValue::Float(arr.value(row) as f64)
        }
        ArrowType::Float64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            CellValue::Float(arr.value(row))
        }
        ArrowType::Boolean => {
            let arr = col
                .as_any()
                .downcast_ref::<BooleanArray>()
                .context("expected BooleanArray")?;
            CellValue::Bool(arr.value(row))
        }
        ArrowType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        ArrowType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        ArrowType::Date32 | ArrowType::Date64 => {
            CellValue::Date(array_value_to_string(col, row).context("formatting date")?)
        }
        _ => CellValue::String(array_value_to_string(col, row).context("formatting value")?),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_data_type() {
        use CellValue::*;
        assert_eq!(infer_data_type(&[Integer(1), Null, Integer(2)]), DataType::Integer);
        assert_eq!(infer_data_type(&[Integer(1), Float(2.5)]), DataType::Float);
        assert_eq!(infer_data_type(&[Bool(true), Null]), DataType::Bool);
        assert_eq!(infer_data_type(&[Integer(1), String("a".into())]), DataType::String);
        assert_eq!(infer_data_type(&[Null, Null]), DataType::String);
    }

    #[test]
    fn test_accumulator_backfills_late_columns() {
        let mut acc = ColumnAccumulator::default();
        acc.push_row([("a", CellValue::Integer(1))]);
        acc.push_row([("a", CellValue::Integer(2)), ("b", CellValue::Bool(true))]);
        acc.push_row([("b", CellValue::Bool(false))]);
        let table = acc.finish().unwrap();

        assert_eq!(table.row_count(), 3);
        assert_eq!(table.cells(&"a".into()).unwrap()[2], CellValue::Null);
        assert_eq!(table.cells(&"b".into()).unwrap()[0], CellValue::Null);
        assert_eq!(table.column(&"b".into()).unwrap().data_type, DataType::Bool);
    }

    #[test]
    fn test_mixed_column_becomes_text() {
        let mut acc = ColumnAccumulator::default();
        acc.push_row([("id", CellValue::Integer(7))]);
        acc.push_row([("id", CellValue::String("x9".into()))]);
        let table = acc.finish().unwrap();
        assert_eq!(
            table.cells(&"id".into()).unwrap(),
            [CellValue::String("7".into()), CellValue::String("x9".into())]
        );
    }

    #[test]
    fn test_guess_cell_type() {
        assert_eq!(guess_cell_type(""), CellValue::Null);
        assert_eq!(guess_cell_type("42"), CellValue::Integer(42));
        assert_eq!(guess_cell_type("4.5"), CellValue::Float(4.5));
        assert_eq!(guess_cell_type("true"), CellValue::Bool(true));
        assert_eq!(guess_cell_type("otter"), CellValue::String("otter".into()));
    }
}
