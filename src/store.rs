//! Row-oriented access to the external tabular store.
//!
//! Every table has a header in row 1, so data rows start at index 2. Row
//! indices are only meaningful until the next append or removal by another
//! writer; callers re-resolve them instead of caching them across calls.

pub mod memory;
pub mod sheets;

use async_trait::async_trait;
use derive_more::{Display, Error};
use strum_macros::{AsRefStr, Display as StrumDisplay, EnumIter};

/// The three logical tables the application works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, AsRefStr, EnumIter)]
pub enum Table {
    #[strum(serialize = "Employees")]
    Employees,
    #[strum(serialize = "Attendance Logs")]
    AttendanceLogs,
    #[strum(serialize = "Leave Requests")]
    LeaveRequests,
}

impl Table {
    /// Header row written when a table is created from scratch.
    pub fn header(&self) -> &'static [&'static str] {
        match self {
            Table::Employees => &["EmployeeID", "PasswordHash"],
            Table::AttendanceLogs => &[
                "EmployeeID",
                "Date",
                "Login Time",
                "Logout Time",
                "Location",
                "Photo",
                "Session Token",
            ],
            Table::LeaveRequests => &[
                "EmployeeID",
                "Type",
                "Start Date",
                "End Date",
                "Reason",
                "Status",
            ],
        }
    }
}

/// First row index holding data (row 1 is the header).
pub const FIRST_DATA_ROW: usize = 2;

/// One row of cells. The backing service drops trailing empty cells, so
/// reads through [`Row::cell`] treat a missing cell as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row(pub Vec<String>);

impl Row {
    pub fn new<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Row(cells.into_iter().map(Into::into).collect())
    }

    /// Cell at a 1-based column; empty when absent.
    pub fn cell(&self, column: usize) -> &str {
        column
            .checked_sub(1)
            .and_then(|i| self.0.get(i))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn cells(&self) -> &[String] {
        &self.0
    }
}

#[derive(Debug, Clone, Display, Error, PartialEq, Eq)]
pub enum StoreError {
    #[display(fmt = "record store unavailable: {}", reason)]
    Unavailable { reason: String },
}

impl StoreError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        StoreError::Unavailable {
            reason: reason.into(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Uniform read/append/update contract over the external store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Header plus every data row, in table order.
    async fn read_all(&self, table: Table) -> StoreResult<Vec<Row>>;

    /// Append one row after the last data row.
    async fn append_row(&self, table: Table, row: Row) -> StoreResult<()>;

    /// Overwrite one cell. `row_index` and `column` are 1-based.
    async fn update_cell(
        &self,
        table: Table,
        row_index: usize,
        column: usize,
        value: &str,
    ) -> StoreResult<()>;

    /// Data rows satisfying `predicate`, paired with their row index,
    /// oldest first.
    async fn find_rows(
        &self,
        table: Table,
        predicate: &(dyn for<'r> Fn(&'r Row) -> bool + Sync),
    ) -> StoreResult<Vec<(usize, Row)>> {
        let rows = self.read_all(table).await?;
        Ok(rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| (i + 1, row))
            .skip(FIRST_DATA_ROW - 1)
            .filter(|(_, row)| predicate(row))
            .collect())
    }
}

/// Column index of `name` in a header row, 1-based.
pub fn column_of(header: &Row, name: &str) -> Option<usize> {
    header
        .cells()
        .iter()
        .position(|h| h.trim() == name)
        .map(|i| i + 1)
}
