use std::collections::HashMap;
use std::fmt;

use crate::data::model::{CellValue, ColumnKey, DataColumn, DataTable, DataType};
use crate::error::{DataError, FilterError, Result};

// ---------------------------------------------------------------------------
// Predicate – a named, type-scoped comparison
// ---------------------------------------------------------------------------

/// `(cell, reference) -> bool`. Each function only inspects the variants of
/// the one [`DataType`] it is registered for.
pub type CompareFn = fn(&CellValue, &CellValue) -> bool;

#[derive(Clone, Copy)]
pub struct Predicate {
    /// Short display form, e.g. `>=` or `contains`. Unique per data type.
    pub shorthand: &'static str,
    pub compare: CompareFn,
}

impl Predicate {
    pub const fn new(shorthand: &'static str, compare: CompareFn) -> Self {
        Predicate { shorthand, compare }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.shorthand).finish()
    }
}

/// Equality, inequality and the four orderings for one variant.
/// Null equals only Null; orderings never hold for Null.
macro_rules! ordered_predicates {
    ($variant:ident) => {
        vec![
            Predicate::new("==", |v, r| match (v, r) {
                (CellValue::$variant(a), CellValue::$variant(b)) => a == b,
                (CellValue::Null, CellValue::Null) => true,
                _ => false,
            }),
            Predicate::new("!=", |v, r| match (v, r) {
                (CellValue::$variant(a), CellValue::$variant(b)) => a != b,
                (CellValue::Null, CellValue::Null) => false,
                _ => true,
            }),
            Predicate::new("<", |v, r| match (v, r) {
                (CellValue::$variant(a), CellValue::$variant(b)) => a < b,
                _ => false,
            }),
            Predicate::new("<=", |v, r| match (v, r) {
                (CellValue::$variant(a), CellValue::$variant(b)) => a <= b,
                _ => false,
            }),
            Predicate::new(">", |v, r| match (v, r) {
                (CellValue::$variant(a), CellValue::$variant(b)) => a > b,
                _ => false,
            }),
            Predicate::new(">=", |v, r| match (v, r) {
                (CellValue::$variant(a), CellValue::$variant(b)) => a >= b,
                _ => false,
            }),
        ]
    };
}

fn string_predicates() -> Vec<Predicate> {
    fn text_op(v: &CellValue, r: &CellValue, op: fn(&str, &str) -> bool) -> bool {
        match (v, r) {
            (CellValue::String(a), CellValue::String(b)) => op(a, b),
            _ => false,
        }
    }

    vec![
        Predicate::new("==", |v, r| match (v, r) {
            (CellValue::String(a), CellValue::String(b)) => a == b,
            (CellValue::Null, CellValue::Null) => true,
            _ => false,
        }),
        Predicate::new("!=", |v, r| match (v, r) {
            (CellValue::String(a), CellValue::String(b)) => a != b,
            (CellValue::Null, CellValue::Null) => false,
            _ => true,
        }),
        Predicate::new("contains", |v, r| text_op(v, r, |a, b| a.contains(b))),
        Predicate::new("startswith", |v, r| text_op(v, r, |a, b| a.starts_with(b))),
        Predicate::new("endswith", |v, r| text_op(v, r, |a, b| a.ends_with(b))),
    ]
}

fn bool_predicates() -> Vec<Predicate> {
    vec![
        Predicate::new("==", |v, r| match (v, r) {
            (CellValue::Bool(a), CellValue::Bool(b)) => a == b,
            (CellValue::Null, CellValue::Null) => true,
            _ => false,
        }),
        Predicate::new("!=", |v, r| match (v, r) {
            (CellValue::Bool(a), CellValue::Bool(b)) => a != b,
            (CellValue::Null, CellValue::Null) => false,
            _ => true,
        }),
    ]
}

// ---------------------------------------------------------------------------
// PredicateRegistry – predicates available per data type
// ---------------------------------------------------------------------------

/// Maps each [`DataType`] to the predicates that may be used on its columns.
/// Consulted only when a [`PredicateFilter`] is built.
#[derive(Debug, Clone)]
pub struct PredicateRegistry {
    by_type: HashMap<DataType, Vec<Predicate>>,
}

impl Default for PredicateRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl PredicateRegistry {
    /// A registry with no predicates at all.
    pub fn empty() -> Self {
        PredicateRegistry {
            by_type: HashMap::new(),
        }
    }

    /// Comparisons for every built-in data type.
    pub fn standard() -> Self {
        let by_type = HashMap::from([
            (DataType::Integer, ordered_predicates!(Integer)),
            (DataType::Float, ordered_predicates!(Float)),
            (DataType::Date, ordered_predicates!(Date)),
            (DataType::String, string_predicates()),
            (DataType::Bool, bool_predicates()),
        ]);
        PredicateRegistry { by_type }
    }

    pub fn predicates_for(&self, data_type: DataType) -> &[Predicate] {
        self.by_type
            .get(&data_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn find(&self, data_type: DataType, shorthand: &str) -> Option<&Predicate> {
        self.predicates_for(data_type)
            .iter()
            .find(|p| p.shorthand == shorthand)
    }

    /// Add a predicate for `data_type`, replacing one with the same shorthand.
    pub fn register(&mut self, data_type: DataType, predicate: Predicate) {
        let predicates = self.by_type.entry(data_type).or_default();
        match predicates
            .iter_mut()
            .find(|p| p.shorthand == predicate.shorthand)
        {
            Some(existing) => *existing = predicate,
            None => predicates.push(predicate),
        }
    }
}

// ---------------------------------------------------------------------------
// PredicateFilter – compare one column against a fixed reference
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PredicateFilter {
    column: ColumnKey,
    data_type: DataType,
    predicate: Predicate,
    reference: CellValue,
}

impl PredicateFilter {
    /// Build a filter comparing `column` against `reference` with the
    /// predicate registered under `shorthand` for the column's type.
    ///
    /// Both the predicate and the reference value are validated here, so
    /// evaluation never needs to re-check types.
    pub fn new(
        registry: &PredicateRegistry,
        column: &DataColumn,
        shorthand: &str,
        reference: impl Into<CellValue>,
    ) -> Result<Self> {
        let data_type = column.data_type;
        let predicate = *registry.find(data_type, shorthand).ok_or_else(|| {
            FilterError::InvalidPredicateForType {
                shorthand: shorthand.to_string(),
                data_type,
            }
        })?;

        let reference = reference.into().coerce_to(data_type).map_err(|original| {
            FilterError::ReferenceTypeMismatch {
                key: column.key.clone(),
                expected: data_type,
                actual: original.data_type().unwrap_or(data_type),
            }
        })?;

        log::trace!(
            "built predicate filter: {} {} {}",
            column.key,
            predicate.shorthand,
            reference
        );

        Ok(PredicateFilter {
            column: column.key.clone(),
            data_type,
            predicate,
            reference,
        })
    }

    pub fn column(&self) -> &ColumnKey {
        &self.column
    }

    /// Declared type of the column at construction time.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn reference(&self) -> &CellValue {
        &self.reference
    }

    /// Look up this filter's column in `table`.
    ///
    /// Fails if the column is gone or was redeclared with another type since
    /// the filter was built.
    pub fn resolve<'t>(&self, table: &'t DataTable) -> Result<&'t [CellValue]> {
        let column = table
            .column(&self.column)
            .ok_or_else(|| FilterError::ColumnNotFound(self.column.clone()))?;
        if column.data_type != self.data_type {
            return Err(FilterError::ColumnTypeChanged {
                key: self.column.clone(),
                expected: self.data_type,
                actual: column.data_type,
            });
        }
        table
            .cells(&self.column)
            .ok_or_else(|| FilterError::ColumnNotFound(self.column.clone()))
    }

    pub(crate) fn check(&self, row: usize, table: &DataTable) -> Result<bool> {
        let cells = self.resolve(table)?;
        let cell = cells.get(row).ok_or(DataError::RowOutOfRange {
            row,
            row_count: table.row_count(),
        })?;
        Ok((self.predicate.compare)(cell, &self.reference))
    }
}

impl fmt::Display for PredicateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.predicate.shorthand, self.reference)
    }
}
