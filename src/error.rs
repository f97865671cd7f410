use thiserror::Error;

use crate::data::model::{ColumnKey, DataType};

/// Errors raised by the table collaborator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("column '{key}' has {actual} rows, expected {expected}")]
    ColumnLengthMismatch {
        key: ColumnKey,
        expected: usize,
        actual: usize,
    },

    #[error("column '{0}' is defined more than once")]
    DuplicateColumn(ColumnKey),

    #[error("column '{key}' is declared {expected} but row {row} holds {actual}")]
    CellTypeMismatch {
        key: ColumnKey,
        row: usize,
        expected: DataType,
        actual: DataType,
    },

    #[error("row {row} is out of range for a table of {row_count} rows")]
    RowOutOfRange { row: usize, row_count: usize },
}

/// Errors raised while building or evaluating filters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
    /// The chosen predicate is not registered for the column's declared type.
    #[error("predicate '{shorthand}' is not available for {data_type} columns")]
    InvalidPredicateForType {
        shorthand: String,
        data_type: DataType,
    },

    #[error("reference value of type {actual} cannot be compared with {expected} column '{key}'")]
    ReferenceTypeMismatch {
        key: ColumnKey,
        expected: DataType,
        actual: DataType,
    },

    /// The referenced column no longer exists in the supplied table.
    #[error("column '{0}' not found in table")]
    ColumnNotFound(ColumnKey),

    /// The column exists but was redeclared with a different type.
    #[error("column '{key}' changed type from {expected} to {actual}")]
    ColumnTypeChanged {
        key: ColumnKey,
        expected: DataType,
        actual: DataType,
    },

    #[error(transparent)]
    Data(#[from] DataError),
}

pub type Result<T, E = FilterError> = std::result::Result<T, E>;
