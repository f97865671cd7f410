//! Composable row filters over in-memory typed tables.
//!
//! A [`FilterSet`] holds [`Filter`]s of two kinds: [`PredicateFilter`]s
//! comparing one column against a reference value, and [`SetFilter`]s holding
//! an explicit set of rows. A row is visible when every filter includes it.
//!
//! ```
//! use tabfilter::{filter_rows, CellValue, DataColumn, DataTable, DataType};
//! use tabfilter::{FilterSet, PredicateFilter, PredicateRegistry, SetFilter};
//!
//! let table = DataTable::builder()
//!     .column(
//!         DataColumn::new("age", DataType::Integer),
//!         vec![CellValue::Integer(5), CellValue::Integer(15), CellValue::Integer(25)],
//!     )
//!     .build()
//!     .unwrap();
//!
//! let age = table.column(&"age".into()).unwrap();
//! let mut filters = FilterSet::new();
//! filters.push(PredicateFilter::new(&PredicateRegistry::standard(), age, ">=", 10i64).unwrap());
//! filters.push(SetFilter::new([0, 1]));
//!
//! assert_eq!(filter_rows(&table, &filters).unwrap(), [1]);
//! ```
pub mod data;
pub mod error;
pub mod filter;
pub mod view;

pub use data::{CellValue, ColumnKey, DataColumn, DataTable, DataType};
pub use error::{DataError, FilterError, Result};
pub use filter::{
    filter_rows, Filter, FilterKind, FilterSet, FilteredRows, Predicate, PredicateFilter,
    PredicateRegistry, ScanOptions, SetFilter,
};
pub use view::{Dropped, FilteredView};
