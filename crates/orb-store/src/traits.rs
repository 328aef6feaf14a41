use orb_types::RowIndex;

use crate::column::{ColumnType, ColumnValue, TableKey};
use crate::error::StoreResult;

/// Table-oriented storage backend.
///
/// All implementations must satisfy these invariants:
/// - Every mutation (`add_empty_row`, `set`, link and link-list edits)
///   requires an open write transaction and fails otherwise.
/// - Rows are appended; a `RowIndex` stays valid for the table's lifetime.
/// - A freshly allocated row holds each column's type default.
/// - Reads never require a transaction.
/// - `rollback` restores the state observed by `begin_write`.
pub trait StorageBackend {
    // ---- Transactions ----

    /// Returns `true` while a write transaction is open.
    fn is_in_write_transaction(&self) -> bool;

    /// Open a write transaction.
    fn begin_write(&mut self) -> StoreResult<()>;

    /// Make all writes since `begin_write` durable and close the transaction.
    fn commit(&mut self) -> StoreResult<()>;

    /// Discard all writes since `begin_write` and close the transaction.
    fn rollback(&mut self) -> StoreResult<()>;

    // ---- Tables ----

    /// Create an empty table for `object_type` with the given columns.
    ///
    /// Table creation is schema setup and does not require a transaction.
    fn create_table(&mut self, object_type: &str, columns: &[ColumnType]) -> StoreResult<TableKey>;

    /// Append a column to a table. Existing rows receive the column default.
    fn add_column(&mut self, table: TableKey, column_type: ColumnType) -> StoreResult<usize>;

    /// Resolve the table backing `object_type`.
    fn table_for_object_type(&self, object_type: &str) -> StoreResult<TableKey>;

    /// Returns `true` if a table for `object_type` exists.
    fn has_table(&self, object_type: &str) -> bool {
        self.table_for_object_type(object_type).is_ok()
    }

    /// Declared type of a column.
    fn column_type(&self, table: TableKey, column: usize) -> StoreResult<ColumnType>;

    /// Number of rows in a table.
    fn row_count(&self, table: TableKey) -> StoreResult<usize>;

    // ---- Rows ----

    /// Append a row holding column defaults and return its index.
    fn add_empty_row(&mut self, table: TableKey) -> StoreResult<RowIndex>;

    /// First row whose string column equals `value`.
    fn find_first_string(
        &self,
        table: TableKey,
        column: usize,
        value: &str,
    ) -> StoreResult<Option<RowIndex>>;

    /// First row whose integer column equals `value`.
    fn find_first_int(&self, table: TableKey, column: usize, value: i64)
        -> StoreResult<Option<RowIndex>>;

    /// Read one cell.
    fn get(&self, table: TableKey, row: RowIndex, column: usize) -> StoreResult<ColumnValue>;

    /// Write one cell. The value must match the column type.
    fn set(
        &mut self,
        table: TableKey,
        row: RowIndex,
        column: usize,
        value: ColumnValue,
    ) -> StoreResult<()>;

    // ---- Links ----

    /// Point a link column at `target`.
    fn set_link(
        &mut self,
        table: TableKey,
        row: RowIndex,
        column: usize,
        target: RowIndex,
    ) -> StoreResult<()> {
        self.set(table, row, column, ColumnValue::Link(Some(target)))
    }

    /// Clear a link column.
    fn nullify_link(&mut self, table: TableKey, row: RowIndex, column: usize) -> StoreResult<()> {
        self.set(table, row, column, ColumnValue::Link(None))
    }

    /// Current contents of a link-list column.
    fn link_list(&self, table: TableKey, row: RowIndex, column: usize) -> StoreResult<Vec<RowIndex>>;

    /// Remove every entry from a link-list column.
    fn link_list_clear(&mut self, table: TableKey, row: RowIndex, column: usize) -> StoreResult<()>;

    /// Append `target` to a link-list column.
    fn link_list_add(
        &mut self,
        table: TableKey,
        row: RowIndex,
        column: usize,
        target: RowIndex,
    ) -> StoreResult<()>;
}
