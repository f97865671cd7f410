use crate::data::model::DataTable;
use crate::error::{FilterError, Result};
use crate::filter::{Filter, FilterKind, FilterSet, ScanOptions, SetFilter};

/// Filters removed by a rescan, each with the reason it no longer applies.
pub type Dropped = Vec<(Filter, FilterError)>;

// ---------------------------------------------------------------------------
// View state
// ---------------------------------------------------------------------------

/// A table, the filters applied to it, and the cached visible rows.
///
/// This is the single writer: every mutation goes through `&mut self` and
/// ends with a rescan, so readers of [`FilteredView::visible_rows`] always see
/// rows consistent with the current filters.
#[derive(Debug, Clone)]
pub struct FilteredView {
    table: DataTable,
    filters: FilterSet,
    options: ScanOptions,
    /// Rows passing the current filters (cached).
    visible_rows: Vec<usize>,
}

impl FilteredView {
    pub fn new(table: DataTable) -> Self {
        Self::with_options(table, ScanOptions::default())
    }

    pub fn with_options(table: DataTable, options: ScanOptions) -> Self {
        let visible_rows = (0..table.row_count()).collect();
        FilteredView {
            table,
            filters: FilterSet::new(),
            options,
            visible_rows,
        }
    }

    pub fn table(&self) -> &DataTable {
        &self.table
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn visible_rows(&self) -> &[usize] {
        &self.visible_rows
    }

    /// Swap in a reloaded table and drop filters that no longer fit it.
    pub fn set_table(&mut self, table: DataTable) -> Result<Dropped> {
        self.table = table;
        self.refilter()
    }

    pub fn add_filter(&mut self, filter: impl Into<Filter>) -> Result<Dropped> {
        self.filters.push(filter);
        self.refilter()
    }

    /// Returns `None` if there is no filter at `index`.
    pub fn remove_filter(&mut self, index: usize) -> Result<Option<(Filter, Dropped)>> {
        let Some(removed) = self.filters.remove(index) else {
            return Ok(None);
        };
        let dropped = self.refilter()?;
        Ok(Some((removed, dropped)))
    }

    /// Returns `None` if there is no filter at `index`. Re-enabling a filter
    /// whose column has gone stale drops it.
    pub fn set_enabled(&mut self, index: usize, enabled: bool) -> Result<Option<Dropped>> {
        let Some(filter) = self.filters.get_mut(index) else {
            return Ok(None);
        };
        filter.enabled = enabled;
        self.refilter().map(Some)
    }

    /// Returns `None` if there is no filter at `index`.
    pub fn toggle_inverted(&mut self, index: usize) -> Result<Option<Dropped>> {
        let Some(filter) = self.filters.get_mut(index) else {
            return Ok(None);
        };
        filter.inverted = !filter.inverted;
        self.refilter().map(Some)
    }

    /// Recompute `visible_rows` after a filter or table change.
    ///
    /// Enabled predicate filters whose column is missing or retyped are
    /// removed and returned with the reason; the remaining filters are applied.
    pub fn refilter(&mut self) -> Result<Dropped> {
        let table = &self.table;
        let mut dropped = Vec::new();

        self.filters.retain(|filter| {
            let unresolved = match filter.kind() {
                FilterKind::Predicate(p) if filter.enabled => p.resolve(table).err(),
                _ => None,
            };
            match unresolved {
                Some(err) => {
                    log::warn!("dropping filter '{filter}': {err}");
                    dropped.push((filter.clone(), err));
                    false
                }
                None => true,
            }
        });

        self.visible_rows = self.filters.scan(&self.table, &self.options)?;
        Ok(dropped)
    }

    /// Capture the currently visible rows as a new set filter.
    pub fn select_visible_as_set(&self, name: Option<&str>) -> SetFilter {
        let selection = SetFilter::new(self.visible_rows.iter().copied());
        match name {
            Some(name) => selection.with_name(name),
            None => selection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{DataColumn, DataType};
    use crate::filter::{PredicateFilter, PredicateRegistry};

    fn table(key: &str) -> DataTable {
        DataTable::builder()
            .column(
                DataColumn::new(key, DataType::Integer),
                vec![5i64.into(), 15i64.into(), 25i64.into()],
            )
            .build()
            .unwrap()
    }

    fn at_least(table: &DataTable, reference: i64) -> PredicateFilter {
        let column = table.columns().next().unwrap();
        PredicateFilter::new(&PredicateRegistry::standard(), column, ">=", reference).unwrap()
    }

    #[test]
    fn test_toggles_refilter() {
        let mut view = FilteredView::new(table("age"));
        assert_eq!(view.visible_rows(), [0, 1, 2]);

        let filter = at_least(view.table(), 10);
        assert!(view.add_filter(filter).unwrap().is_empty());
        assert_eq!(view.visible_rows(), [1, 2]);

        assert!(view.toggle_inverted(0).unwrap().unwrap().is_empty());
        assert_eq!(view.visible_rows(), [0]);

        assert!(view.set_enabled(0, false).unwrap().unwrap().is_empty());
        assert_eq!(view.visible_rows(), [0, 1, 2]);

        assert!(view.toggle_inverted(7).unwrap().is_none());
        assert!(view.set_enabled(7, true).unwrap().is_none());
        let (removed, dropped) = view.remove_filter(0).unwrap().unwrap();
        assert!(removed.as_predicate().is_some());
        assert!(dropped.is_empty());
        assert!(view.filters().is_empty());
        assert!(view.remove_filter(0).unwrap().is_none());
    }

    #[test]
    fn test_reload_drops_stale_filters() {
        let mut view = FilteredView::new(table("age"));
        let filter = at_least(view.table(), 10);
        view.add_filter(filter).unwrap();
        view.add_filter(SetFilter::new([0, 1])).unwrap();
        assert_eq!(view.visible_rows(), [1]);

        let dropped = view.set_table(table("height")).unwrap();
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].1, FilterError::ColumnNotFound("age".into()));
        assert_eq!(view.filters().len(), 1);
        assert_eq!(view.visible_rows(), [0, 1]);
    }

    #[test]
    fn test_reenabling_stale_filter_reports_drop() {
        let mut view = FilteredView::new(table("age"));
        let filter = at_least(view.table(), 10);
        view.add_filter(filter).unwrap();
        view.set_enabled(0, false).unwrap();

        // disabled filters survive a reload even when their column is gone
        assert!(view.set_table(table("height")).unwrap().is_empty());
        assert_eq!(view.filters().len(), 1);

        let dropped = view.set_enabled(0, true).unwrap().unwrap();
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].0.to_string(), "age >= 10");
        assert_eq!(dropped[0].1, FilterError::ColumnNotFound("age".into()));
        assert!(view.filters().is_empty());
        assert_eq!(view.visible_rows(), [0, 1, 2]);
    }

    #[test]
    fn test_select_visible_as_set() {
        let mut view = FilteredView::new(table("age"));
        let filter = at_least(view.table(), 20);
        view.add_filter(filter).unwrap();

        let selection = view.select_visible_as_set(Some("old"));
        assert_eq!(selection.name(), "old");
        assert_eq!(selection.sorted_rows(), [2]);
    }
}
