//! Data layer: the columnar table filters are evaluated against, and loading.
//!
//! Architecture:
//! ```text
//!  .parquet / .json / .csv
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → DataTable (column types inferred)
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────┐
//!   │ DataTable  │  ColumnKey → DataColumn, ColumnKey → Vec<CellValue>
//!   └───────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  FilterSet → included row indices
//!   └──────────┘
//! ```

pub mod loader;
pub mod model;

pub use model::{CellValue, ColumnKey, DataColumn, DataTable, DataType, TableBuilder};
