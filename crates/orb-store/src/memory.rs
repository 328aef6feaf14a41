use orb_types::RowIndex;
use tracing::{debug, trace};

use crate::column::{ColumnType, ColumnValue, TableKey};
use crate::error::{StoreError, StoreResult};
use crate::traits::StorageBackend;

#[derive(Clone, Debug)]
struct Table {
    object_type: String,
    columns: Vec<ColumnType>,
    rows: Vec<Vec<ColumnValue>>,
}

/// In-memory, `Vec`-based table store.
///
/// Intended for tests and embedding. A write transaction snapshots every
/// table on `begin_write`; `rollback` swaps the snapshot back in.
#[derive(Default)]
pub struct InMemoryBackend {
    tables: Vec<Table>,
    snapshot: Option<Vec<Table>>,
}

impl InMemoryBackend {
    /// Create a backend with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tables.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Object type names of all tables, in creation order.
    pub fn object_types(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.object_type.as_str()).collect()
    }

    fn table(&self, key: TableKey) -> StoreResult<&Table> {
        self.tables.get(key.0).ok_or(StoreError::InvalidTable(key))
    }

    fn table_mut(&mut self, key: TableKey) -> StoreResult<&mut Table> {
        self.tables.get_mut(key.0).ok_or(StoreError::InvalidTable(key))
    }

    fn require_write(&self) -> StoreResult<()> {
        if self.snapshot.is_none() {
            return Err(StoreError::NotInWriteTransaction);
        }
        Ok(())
    }

    fn check_link_target(&self, target: TableKey, row: RowIndex) -> StoreResult<()> {
        let len = self.table(target)?.rows.len();
        if row.get() >= len {
            return Err(StoreError::InvalidLinkTarget { target, row });
        }
        Ok(())
    }

    fn cell_mut(
        &mut self,
        key: TableKey,
        row: RowIndex,
        column: usize,
    ) -> StoreResult<&mut ColumnValue> {
        let table = self.table_mut(key)?;
        let len = table.rows.len();
        table
            .rows
            .get_mut(row.get())
            .ok_or(StoreError::RowOutOfRange { table: key, row, len })?
            .get_mut(column)
            .ok_or(StoreError::ColumnOutOfRange { table: key, column })
    }

    fn find_first(
        &self,
        key: TableKey,
        column: usize,
        expected: ColumnType,
        matches: impl Fn(&ColumnValue) -> bool,
    ) -> StoreResult<Option<RowIndex>> {
        let actual = self.column_type(key, column)?;
        if actual != expected {
            return Err(StoreError::TypeMismatch {
                table: key,
                column,
                expected: actual,
                actual: match expected {
                    ColumnType::String => "string",
                    _ => "int",
                },
            });
        }
        let table = self.table(key)?;
        Ok(table
            .rows
            .iter()
            .position(|row| matches(&row[column]))
            .map(RowIndex::new))
    }

    fn link_list_target(&self, key: TableKey, column: usize) -> StoreResult<TableKey> {
        match self.column_type(key, column)? {
            ColumnType::LinkList(target) => Ok(target),
            other => Err(StoreError::TypeMismatch {
                table: key,
                column,
                expected: other,
                actual: "linklist",
            }),
        }
    }
}

impl StorageBackend for InMemoryBackend {
    fn is_in_write_transaction(&self) -> bool {
        self.snapshot.is_some()
    }

    fn begin_write(&mut self) -> StoreResult<()> {
        if self.snapshot.is_some() {
            return Err(StoreError::AlreadyInWriteTransaction);
        }
        self.snapshot = Some(self.tables.clone());
        debug!(tables = self.tables.len(), "write transaction started");
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        self.require_write()?;
        self.snapshot = None;
        debug!("write transaction committed");
        Ok(())
    }

    fn rollback(&mut self) -> StoreResult<()> {
        let snapshot = self.snapshot.take().ok_or(StoreError::NotInWriteTransaction)?;
        self.tables = snapshot;
        debug!("write transaction rolled back");
        Ok(())
    }

    fn create_table(&mut self, object_type: &str, columns: &[ColumnType]) -> StoreResult<TableKey> {
        if self.has_table(object_type) {
            return Err(StoreError::TableExists(object_type.to_string()));
        }
        let key = TableKey(self.tables.len());
        self.tables.push(Table {
            object_type: object_type.to_string(),
            columns: columns.to_vec(),
            rows: Vec::new(),
        });
        debug!(object_type, table = %key, columns = columns.len(), "created table");
        Ok(key)
    }

    fn add_column(&mut self, table: TableKey, column_type: ColumnType) -> StoreResult<usize> {
        let t = self.table_mut(table)?;
        t.columns.push(column_type);
        for row in &mut t.rows {
            row.push(column_type.default_value());
        }
        let column = t.columns.len() - 1;
        debug!(table = %table, column, %column_type, "added column");
        Ok(column)
    }

    fn table_for_object_type(&self, object_type: &str) -> StoreResult<TableKey> {
        self.tables
            .iter()
            .position(|t| t.object_type == object_type)
            .map(TableKey)
            .ok_or_else(|| StoreError::NoSuchTable(object_type.to_string()))
    }

    fn column_type(&self, table: TableKey, column: usize) -> StoreResult<ColumnType> {
        self.table(table)?
            .columns
            .get(column)
            .copied()
            .ok_or(StoreError::ColumnOutOfRange { table, column })
    }

    fn row_count(&self, table: TableKey) -> StoreResult<usize> {
        Ok(self.table(table)?.rows.len())
    }

    fn add_empty_row(&mut self, table: TableKey) -> StoreResult<RowIndex> {
        self.require_write()?;
        let t = self.table_mut(table)?;
        let row = t.columns.iter().map(ColumnType::default_value).collect();
        t.rows.push(row);
        let index = RowIndex::new(t.rows.len() - 1);
        trace!(table = %table, row = %index, "added row");
        Ok(index)
    }

    fn find_first_string(
        &self,
        table: TableKey,
        column: usize,
        value: &str,
    ) -> StoreResult<Option<RowIndex>> {
        self.find_first(table, column, ColumnType::String, |cell| {
            cell.as_str() == Some(value)
        })
    }

    fn find_first_int(
        &self,
        table: TableKey,
        column: usize,
        value: i64,
    ) -> StoreResult<Option<RowIndex>> {
        self.find_first(table, column, ColumnType::Int, |cell| cell.as_int() == Some(value))
    }

    fn get(&self, table: TableKey, row: RowIndex, column: usize) -> StoreResult<ColumnValue> {
        let t = self.table(table)?;
        let cells = t.rows.get(row.get()).ok_or(StoreError::RowOutOfRange {
            table,
            row,
            len: t.rows.len(),
        })?;
        cells
            .get(column)
            .cloned()
            .ok_or(StoreError::ColumnOutOfRange { table, column })
    }

    fn set(
        &mut self,
        table: TableKey,
        row: RowIndex,
        column: usize,
        value: ColumnValue,
    ) -> StoreResult<()> {
        self.require_write()?;
        let column_type = self.column_type(table, column)?;
        if !column_type.accepts(&value) {
            return Err(StoreError::TypeMismatch {
                table,
                column,
                expected: column_type,
                actual: value.type_name(),
            });
        }
        if let Some(target) = column_type.link_target() {
            match &value {
                ColumnValue::Link(Some(link)) => self.check_link_target(target, *link)?,
                ColumnValue::LinkList(links) => {
                    for link in links {
                        self.check_link_target(target, *link)?;
                    }
                }
                _ => {}
            }
        }
        *self.cell_mut(table, row, column)? = value;
        trace!(table = %table, row = %row, column, "set cell");
        Ok(())
    }

    fn link_list(&self, table: TableKey, row: RowIndex, column: usize) -> StoreResult<Vec<RowIndex>> {
        self.link_list_target(table, column)?;
        match self.get(table, row, column)? {
            ColumnValue::LinkList(links) => Ok(links),
            other => Err(StoreError::TypeMismatch {
                table,
                column,
                expected: ColumnType::LinkList(table),
                actual: other.type_name(),
            }),
        }
    }

    fn link_list_clear(&mut self, table: TableKey, row: RowIndex, column: usize) -> StoreResult<()> {
        self.require_write()?;
        self.link_list_target(table, column)?;
        if let ColumnValue::LinkList(links) = self.cell_mut(table, row, column)? {
            links.clear();
        }
        Ok(())
    }

    fn link_list_add(
        &mut self,
        table: TableKey,
        row: RowIndex,
        column: usize,
        target: RowIndex,
    ) -> StoreResult<()> {
        self.require_write()?;
        let target_table = self.link_list_target(table, column)?;
        self.check_link_target(target_table, target)?;
        if let ColumnValue::LinkList(links) = self.cell_mut(table, row, column)? {
            links.push(target);
        }
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("table_count", &self.tables.len())
            .field("in_write_transaction", &self.snapshot.is_some())
            .finish()
    }
}
