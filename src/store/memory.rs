use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use strum::IntoEnumIterator;

use super::{RecordStore, Row, StoreError, StoreResult, Table};

/// Process-local store used by the `memory` backend and by tests.
///
/// Each table starts with its header row, mirroring a freshly created sheet.
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, Vec<Row>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        let tables = Table::iter()
            .map(|t| (t, vec![Row::new(t.header().iter().copied())]))
            .collect();
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Seed the Employees table.
    pub fn with_employee(self, employee_id: &str, password_hash: &str) -> Self {
        if let Ok(mut tables) = self.tables.write() {
            tables
                .entry(Table::Employees)
                .or_default()
                .push(Row::new([employee_id, password_hash]));
        }
        self
    }

    /// Snapshot of the data rows of `table`, without the header.
    #[cfg(test)]
    pub fn rows(&self, table: Table) -> Vec<Row> {
        self.tables
            .read()
            .map(|t| {
                t.get(&table)
                    .map(|rows| rows.iter().skip(1).cloned().collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::unavailable("memory store lock poisoned")
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn read_all(&self, table: Table) -> StoreResult<Vec<Row>> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(tables.get(&table).cloned().unwrap_or_default())
    }

    async fn append_row(&self, table: Table, row: Row) -> StoreResult<()> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        tables.entry(table).or_default().push(row);
        Ok(())
    }

    async fn update_cell(
        &self,
        table: Table,
        row_index: usize,
        column: usize,
        value: &str,
    ) -> StoreResult<()> {
        if row_index == 0 || column == 0 {
            return Err(StoreError::unavailable("row and column are 1-based"));
        }
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let row = tables
            .get_mut(&table)
            .and_then(|rows| rows.get_mut(row_index - 1))
            .ok_or_else(|| {
                StoreError::unavailable(format!("{table} has no row {row_index}"))
            })?;
        if row.0.len() < column {
            row.0.resize(column, String::new());
        }
        row.0[column - 1] = value.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn find_rows_reports_sheet_row_numbers() {
        let store = MemoryStore::new();
        store
            .append_row(Table::LeaveRequests, Row::new(["E100", "Sick"]))
            .await
            .unwrap();
        store
            .append_row(Table::LeaveRequests, Row::new(["E200", "Annual"]))
            .await
            .unwrap();

        let found = store
            .find_rows(Table::LeaveRequests, &|row| row.cell(1) == "E200")
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, 3);
        assert_eq!(found[0].1.cell(2), "Annual");
    }

    #[actix_web::test]
    async fn update_cell_pads_short_rows() {
        let store = MemoryStore::new();
        store
            .append_row(Table::AttendanceLogs, Row::new(["E100"]))
            .await
            .unwrap();

        store
            .update_cell(Table::AttendanceLogs, 2, 4, "17:00:00")
            .await
            .unwrap();

        let rows = store.rows(Table::AttendanceLogs);
        assert_eq!(rows[0].cell(4), "17:00:00");
        assert_eq!(rows[0].cell(3), "");
    }

    #[actix_web::test]
    async fn update_cell_outside_table_fails() {
        let store = MemoryStore::new();
        let err = store
            .update_cell(Table::AttendanceLogs, 9, 4, "x")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
    }
}
