use orb_types::RowIndex;

use crate::column::{ColumnType, TableKey};

/// Errors from storage backend operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// A mutation was attempted without an open write transaction.
    #[error("cannot modify the store outside of a write transaction")]
    NotInWriteTransaction,

    /// `begin_write` was called while a write transaction is already open.
    #[error("a write transaction is already in progress")]
    AlreadyInWriteTransaction,

    /// No table exists for the requested object type.
    #[error("no table for object type '{0}'")]
    NoSuchTable(String),

    /// A table for this object type already exists.
    #[error("table for object type '{0}' already exists")]
    TableExists(String),

    /// The table key does not refer to a table.
    #[error("invalid table key {0}")]
    InvalidTable(TableKey),

    /// The column index is past the end of the table's columns.
    #[error("column {column} out of range for table {table}")]
    ColumnOutOfRange { table: TableKey, column: usize },

    /// The row index is past the end of the table.
    #[error("row {row} out of range for table {table} ({len} rows)")]
    RowOutOfRange {
        table: TableKey,
        row: RowIndex,
        len: usize,
    },

    /// The value's type does not match the column's declared type.
    #[error("type mismatch in table {table} column {column}: column is {expected}, value is {actual}")]
    TypeMismatch {
        table: TableKey,
        column: usize,
        expected: ColumnType,
        actual: &'static str,
    },

    /// A link points past the end of its target table.
    #[error("link target {row} does not exist in table {target}")]
    InvalidLinkTarget { target: TableKey, row: RowIndex },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
