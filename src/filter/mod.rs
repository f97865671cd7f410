//! Filter layer: per-row include/exclude decisions over a [`DataTable`].
//!
//! ```text
//!   PredicateRegistry ──validates──▶ PredicateFilter ─┐
//!                                                     ├─▶ Filter { enabled, inverted }
//!   row indices / mask ────────────▶ SetFilter ───────┘          │
//!                                                                ▼
//!                                          FilterSet (AND) ──▶ included rows
//! ```

pub mod filter_set;
pub mod predicate;
pub mod set;

use std::fmt;

use crate::data::model::DataTable;
use crate::error::Result;

pub use filter_set::{filter_rows, FilterSet, FilteredRows, ScanOptions};
pub use predicate::{CompareFn, Predicate, PredicateFilter, PredicateRegistry};
pub use set::SetFilter;

/// The variant-specific part of a [`Filter`].
#[derive(Debug, Clone)]
pub enum FilterKind {
    Predicate(PredicateFilter),
    Set(SetFilter),
}

/// A row filter with uniform `enabled` / `inverted` handling.
///
/// The kind is fixed at construction; only the flags are mutable.
#[derive(Debug, Clone)]
pub struct Filter {
    /// A disabled filter includes every row.
    pub enabled: bool,
    /// Negates the variant's own result. Has no effect while disabled.
    pub inverted: bool,
    kind: FilterKind,
}

impl Filter {
    pub fn new(kind: FilterKind) -> Self {
        Filter {
            enabled: true,
            inverted: false,
            kind,
        }
    }

    pub fn inverted(mut self) -> Self {
        self.inverted = true;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn kind(&self) -> &FilterKind {
        &self.kind
    }

    pub fn as_predicate(&self) -> Option<&PredicateFilter> {
        match &self.kind {
            FilterKind::Predicate(p) => Some(p),
            FilterKind::Set(_) => None,
        }
    }

    pub fn as_set(&self) -> Option<&SetFilter> {
        match &self.kind {
            FilterKind::Set(s) => Some(s),
            FilterKind::Predicate(_) => None,
        }
    }

    /// Whether `row` passes this filter.
    ///
    /// A disabled filter passes every row without consulting the table.
    /// Predicate filters fail when their column is missing from `table` or
    /// `row` is out of range; set filters never fail.
    pub fn apply(&self, row: usize, table: &DataTable) -> Result<bool> {
        if !self.enabled {
            return Ok(true);
        }
        let raw = match &self.kind {
            FilterKind::Predicate(p) => p.check(row, table)?,
            FilterKind::Set(s) => s.contains(row),
        };
        Ok(raw != self.inverted)
    }
}

impl From<PredicateFilter> for Filter {
    fn from(filter: PredicateFilter) -> Self {
        Filter::new(FilterKind::Predicate(filter))
    }
}

impl From<SetFilter> for Filter {
    fn from(filter: SetFilter) -> Self {
        Filter::new(FilterKind::Set(filter))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inverted {
            f.write_str("not ")?;
        }
        match &self.kind {
            FilterKind::Predicate(p) => write!(f, "{p}"),
            FilterKind::Set(s) => write!(f, "in {} ({} rows)", s.name(), s.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, DataColumn, DataType};
    use crate::error::FilterError;

    fn age_table() -> DataTable {
        DataTable::builder()
            .column(
                DataColumn::new("age", DataType::Integer),
                vec![5i64.into(), 15i64.into(), 25i64.into()],
            )
            .build()
            .unwrap()
    }

    fn adults(table: &DataTable) -> Filter {
        let age = table.column(&"age".into()).unwrap();
        PredicateFilter::new(&PredicateRegistry::standard(), age, ">=", 10i64)
            .unwrap()
            .into()
    }

    fn rows(filter: &Filter, table: &DataTable) -> Vec<bool> {
        (0..table.row_count())
            .map(|row| filter.apply(row, table).unwrap())
            .collect()
    }

    #[test]
    fn test_flags() {
        let table = age_table();
        let mut filter = adults(&table);
        assert_eq!(rows(&filter, &table), [false, true, true]);

        filter.inverted = true;
        assert_eq!(rows(&filter, &table), [true, false, false]);

        filter.enabled = false;
        assert_eq!(rows(&filter, &table), [true, true, true]);

        filter.inverted = false;
        assert_eq!(rows(&filter, &table), [true, true, true]);
    }

    #[test]
    fn test_inversion_negates_every_row() {
        let table = age_table();
        for filter in [adults(&table), SetFilter::new([0, 2]).into()] {
            let inverted = filter.clone().inverted();
            for row in 0..table.row_count() {
                assert_eq!(
                    inverted.apply(row, &table).unwrap(),
                    !filter.apply(row, &table).unwrap()
                );
            }
        }
    }

    #[test]
    fn test_disabled_filter_ignores_missing_column() {
        let table = age_table();
        let other = DataTable::builder()
            .column(DataColumn::new("name", DataType::String), vec![CellValue::Null])
            .build()
            .unwrap();
        let filter = adults(&table);
        assert_eq!(
            filter.apply(0, &other).unwrap_err(),
            FilterError::ColumnNotFound("age".into())
        );
        assert!(filter.disabled().apply(0, &other).unwrap());
    }

    #[test]
    fn test_set_filter_out_of_range_is_false() {
        let table = age_table();
        let filter: Filter = SetFilter::from_mask(&[true, false, true]).into();
        assert!(!filter.apply(3, &table).unwrap());
        assert!(!filter.apply(usize::MAX, &table).unwrap());
    }

    #[test]
    fn test_predicate_filter_out_of_range_is_error() {
        let table = age_table();
        assert!(matches!(
            adults(&table).apply(3, &table),
            Err(FilterError::Data(_))
        ));
    }

    #[test]
    fn test_kind_and_display() {
        let table = age_table();
        let filter = adults(&table).inverted();
        assert!(filter.as_predicate().is_some());
        assert!(filter.as_set().is_none());
        assert_eq!(filter.to_string(), "not age >= 10");

        let set: Filter = SetFilter::new([1, 2]).with_name("picked").into();
        assert_eq!(set.to_string(), "in picked (2 rows)");
        assert!(matches!(set.kind(), FilterKind::Set(_)));
    }
}
