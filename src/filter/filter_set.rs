use std::collections::HashSet;
use std::iter::FusedIterator;
use std::ops::Range;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::predicate::CompareFn;
use super::{Filter, FilterKind};
use crate::data::model::{CellValue, DataTable};
use crate::error::Result;

// ---------------------------------------------------------------------------
// ScanOptions – how a full-table scan is executed
// ---------------------------------------------------------------------------

/// Scan tuning. Readable from JSON; missing fields take the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Allow splitting the scan across the rayon thread pool.
    pub parallel: bool,
    /// Tables smaller than this are always scanned on the calling thread.
    pub parallel_threshold: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            parallel_threshold: 16_384,
        }
    }
}

impl ScanOptions {
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Bound – a filter with its column resolved against one table
// ---------------------------------------------------------------------------

/// Per-scan form of an enabled filter. Column lookups and type checks happen
/// once in [`bind`], leaving only the comparison per row.
#[derive(Clone, Copy)]
enum Bound<'a> {
    Predicate {
        cells: &'a [CellValue],
        compare: CompareFn,
        reference: &'a CellValue,
        inverted: bool,
    },
    Set {
        rows: &'a HashSet<usize>,
        inverted: bool,
    },
}

impl Bound<'_> {
    #[inline]
    fn test(&self, row: usize) -> bool {
        match *self {
            Bound::Predicate {
                cells,
                compare,
                reference,
                inverted,
            } => compare(&cells[row], reference) != inverted,
            Bound::Set { rows, inverted } => rows.contains(&row) != inverted,
        }
    }
}

/// Resolve every enabled filter against `table`. Disabled filters are
/// dropped: they include every row.
fn bind<'a>(filters: &'a [Filter], table: &'a DataTable) -> Result<Vec<Bound<'a>>> {
    filters
        .iter()
        .filter(|f| f.enabled)
        .map(|f| -> Result<Bound<'a>> {
            let bound = match &f.kind {
                FilterKind::Predicate(p) => Bound::Predicate {
                    cells: p.resolve(table)?,
                    compare: p.predicate().compare,
                    reference: p.reference(),
                    inverted: f.inverted,
                },
                FilterKind::Set(s) => Bound::Set {
                    rows: s.row_set(),
                    inverted: f.inverted,
                },
            };
            log::trace!("bound filter: {f}");
            Ok(bound)
        })
        .collect()
}

#[inline]
fn passes_all(bound: &[Bound<'_>], row: usize) -> bool {
    bound.iter().all(|b| b.test(row))
}

// ---------------------------------------------------------------------------
// FilterSet – ordered filters combined by AND
// ---------------------------------------------------------------------------

/// An ordered collection of filters. A row is included iff every filter
/// includes it; an empty set includes every row.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    filters: Vec<Filter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, filter: impl Into<Filter>) {
        self.filters.push(filter.into());
    }

    /// Remove and return the filter at `index`, if any.
    pub fn remove(&mut self, index: usize) -> Option<Filter> {
        (index < self.filters.len()).then(|| self.filters.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&Filter> {
        self.filters.get(index)
    }

    /// Mutable access for toggling flags; the filter kind stays fixed.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Filter> {
        self.filters.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Filter> {
        self.filters.iter()
    }

    /// The most recently pushed filter.
    pub fn last_mut(&mut self) -> Option<&mut Filter> {
        self.filters.last_mut()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn enabled_count(&self) -> usize {
        self.filters.iter().filter(|f| f.enabled).count()
    }

    /// Keep only the filters for which `keep` returns true.
    pub fn retain(&mut self, keep: impl FnMut(&Filter) -> bool) {
        self.filters.retain(keep);
    }

    /// Whether a single row passes every filter. Stops at the first exclusion.
    pub fn includes(&self, row: usize, table: &DataTable) -> Result<bool> {
        for filter in &self.filters {
            if !filter.apply(row, table)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Lazy iterator over the included rows of `table`, ascending.
    ///
    /// Columns are resolved here, so a missing column is reported before any
    /// row is produced and iteration itself cannot fail.
    pub fn rows<'a>(&'a self, table: &'a DataTable) -> Result<FilteredRows<'a>> {
        Ok(FilteredRows {
            bound: bind(&self.filters, table)?,
            rows: 0..table.row_count(),
        })
    }

    /// Included rows within `range` (clamped to the table), for chunked scans.
    pub fn filter_range(&self, table: &DataTable, range: Range<usize>) -> Result<Vec<usize>> {
        let end = range.end.min(table.row_count());
        let start = range.start.min(end);
        let bound = bind(&self.filters, table)?;
        Ok((start..end).filter(|&row| passes_all(&bound, row)).collect())
    }

    /// One inclusion flag per row of `table`.
    pub fn mask(&self, table: &DataTable) -> Result<Vec<bool>> {
        let bound = bind(&self.filters, table)?;
        Ok((0..table.row_count())
            .map(|row| passes_all(&bound, row))
            .collect())
    }

    /// Full-table scan returning included rows in ascending order.
    ///
    /// Large tables are split across the rayon pool when `options` allow it;
    /// the result is identical either way.
    pub fn scan(&self, table: &DataTable, options: &ScanOptions) -> Result<Vec<usize>> {
        let bound = bind(&self.filters, table)?;
        let row_count = table.row_count();

        let rows: Vec<usize> = if options.parallel && row_count >= options.parallel_threshold {
            (0..row_count)
                .into_par_iter()
                .filter(|&row| passes_all(&bound, row))
                .collect()
        } else {
            (0..row_count).filter(|&row| passes_all(&bound, row)).collect()
        };

        log::debug!(
            "scanned {row_count} rows with {} active filters: {} included",
            bound.len(),
            rows.len()
        );
        Ok(rows)
    }
}

impl<'a> IntoIterator for &'a FilterSet {
    type Item = &'a Filter;
    type IntoIter = std::slice::Iter<'a, Filter>;

    fn into_iter(self) -> Self::IntoIter {
        self.filters.iter()
    }
}

impl IntoIterator for FilterSet {
    type Item = Filter;
    type IntoIter = std::vec::IntoIter<Filter>;

    fn into_iter(self) -> Self::IntoIter {
        self.filters.into_iter()
    }
}

impl FromIterator<Filter> for FilterSet {
    fn from_iter<I: IntoIterator<Item = Filter>>(iter: I) -> Self {
        FilterSet {
            filters: iter.into_iter().collect(),
        }
    }
}

/// Included row indices of `table` under `filters`, ascending.
pub fn filter_rows(table: &DataTable, filters: &FilterSet) -> Result<Vec<usize>> {
    Ok(filters.rows(table)?.collect())
}

// ---------------------------------------------------------------------------
// FilteredRows – lazy row iterator
// ---------------------------------------------------------------------------

/// Lazily yields the included rows of one table. Clone it to restart from
/// the current position.
#[derive(Clone)]
pub struct FilteredRows<'a> {
    bound: Vec<Bound<'a>>,
    rows: Range<usize>,
}

impl Iterator for FilteredRows<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let bound = &self.bound;
        self.rows.find(|&row| passes_all(bound, row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.rows.len()))
    }
}

impl DoubleEndedIterator for FilteredRows<'_> {
    fn next_back(&mut self) -> Option<usize> {
        let bound = &self.bound;
        self.rows.rfind(|&row| passes_all(bound, row))
    }
}

impl FusedIterator for FilteredRows<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{DataColumn, DataType};
    use crate::error::FilterError;
    use crate::filter::{PredicateFilter, PredicateRegistry, SetFilter};

    fn age_table() -> DataTable {
        DataTable::builder()
            .column(
                DataColumn::new("age", DataType::Integer),
                vec![5i64.into(), 15i64.into(), 25i64.into()],
            )
            .build()
            .unwrap()
    }

    fn age_filter(table: &DataTable, shorthand: &str, reference: i64) -> Filter {
        let age = table.column(&"age".into()).unwrap();
        PredicateFilter::new(&PredicateRegistry::standard(), age, shorthand, reference)
            .unwrap()
            .into()
    }

    #[test]
    fn test_empty_set_includes_everything() {
        let table = age_table();
        assert_eq!(filter_rows(&table, &FilterSet::new()).unwrap(), [0, 1, 2]);
    }

    #[test]
    fn test_intersection() {
        let table = age_table();
        let mut filters = FilterSet::new();
        filters.push(age_filter(&table, ">=", 10));
        filters.push(SetFilter::new([0, 1]));
        assert_eq!(filter_rows(&table, &filters).unwrap(), [1]);
        assert!(filters.includes(1, &table).unwrap());
        assert!(!filters.includes(0, &table).unwrap());
        assert_eq!(filters.mask(&table).unwrap(), [false, true, false]);
    }

    #[test]
    fn test_lazy_rows_restart_and_reverse() {
        let table = age_table();
        let filters: FilterSet = [age_filter(&table, "!=", 15)].into_iter().collect();
        let rows = filters.rows(&table).unwrap();
        assert_eq!(rows.clone().collect::<Vec<_>>(), [0, 2]);
        assert_eq!(rows.clone().rev().collect::<Vec<_>>(), [2, 0]);
        assert_eq!(rows.count(), 2);
    }

    #[test]
    fn test_missing_column_surfaces_before_iteration() {
        let table = age_table();
        let filters: FilterSet = [age_filter(&table, ">", 0)].into_iter().collect();
        let other = DataTable::builder()
            .column(DataColumn::new("id", DataType::Integer), vec![1i64.into()])
            .build()
            .unwrap();
        assert_eq!(
            filters.rows(&other).err(),
            Some(FilterError::ColumnNotFound("age".into()))
        );
        assert!(filters.scan(&other, &ScanOptions::default()).is_err());
    }

    #[test]
    fn test_disabled_filters_are_skipped() {
        let table = age_table();
        let mut filters = FilterSet::new();
        filters.push(age_filter(&table, "<", 0).disabled());
        filters.push(Filter::from(SetFilter::new([2])).inverted());
        assert_eq!(filters.enabled_count(), 1);
        assert_eq!(filter_rows(&table, &filters).unwrap(), [0, 1]);
    }

    #[test]
    fn test_filter_range_clamps() {
        let table = age_table();
        let filters: FilterSet = [age_filter(&table, ">", 0)].into_iter().collect();
        assert_eq!(filters.filter_range(&table, 1..10).unwrap(), [1, 2]);
        assert!(filters.filter_range(&table, 5..10).unwrap().is_empty());
    }

    #[test]
    fn test_parallel_scan_matches_sequential() {
        let n = 50_000i64;
        let table = DataTable::builder()
            .column(
                DataColumn::new("v", DataType::Integer),
                (0..n).map(|i| CellValue::Integer((i * 7919) % 1000)).collect(),
            )
            .build()
            .unwrap();
        let column = table.column(&"v".into()).unwrap();
        let mut filters = FilterSet::new();
        filters.push(
            PredicateFilter::new(&PredicateRegistry::standard(), column, ">=", 500i64).unwrap(),
        );
        filters.push(SetFilter::new((0..n as usize).step_by(3)));

        let parallel = ScanOptions {
            parallel: true,
            parallel_threshold: 1,
        };
        let expected = filters.scan(&table, &ScanOptions::sequential()).unwrap();
        assert_eq!(filters.scan(&table, &parallel).unwrap(), expected);
        assert_eq!(filter_rows(&table, &filters).unwrap(), expected);
    }

    #[test]
    fn test_adding_filters_never_grows_result() {
        let table = age_table();
        let mut filters = FilterSet::new();
        let mut previous = filter_rows(&table, &filters).unwrap().len();
        for filter in [
            age_filter(&table, ">", 0),
            Filter::from(SetFilter::new([0, 2])).inverted(),
            age_filter(&table, "<=", 5),
        ] {
            filters.push(filter);
            let count = filter_rows(&table, &filters).unwrap().len();
            assert!(count <= previous);
            previous = count;
        }
    }

    #[test]
    fn test_last_mut_and_retain() {
        let table = age_table();
        let mut filters = FilterSet::new();
        assert!(filters.last_mut().is_none());

        filters.push(age_filter(&table, ">", 0));
        filters.push(SetFilter::new([0, 1]));
        if let Some(last) = filters.last_mut() {
            last.inverted = true;
        }
        assert_eq!(filter_rows(&table, &filters).unwrap(), [2]);

        filters.retain(|f| f.as_set().is_none());
        assert_eq!(filters.len(), 1);
        assert_eq!(filter_rows(&table, &filters).unwrap(), [0, 1, 2]);
    }

    #[test]
    fn test_scan_options_from_json() {
        let options: ScanOptions = serde_json::from_str(r#"{"parallel": false}"#).unwrap();
        assert_eq!(options, ScanOptions::sequential());
    }
}
