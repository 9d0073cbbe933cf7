use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::Row;

pub const STATUS_PENDING: &str = "Pending";

/// 1-based columns of the Leave Requests worksheet.
pub mod column {
    pub const EMPLOYEE_ID: usize = 1;
    pub const LEAVE_TYPE: usize = 2;
    pub const START_DATE: usize = 3;
    pub const END_DATE: usize = 4;
    pub const REASON: usize = 5;
    pub const STATUS: usize = 6;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = "E100")]
    pub employee_id: String,
    #[schema(example = "Sick")]
    pub leave_type: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: String,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: String,
    #[schema(example = "Flu")]
    pub reason: String,
    /// Advanced by an HR reviewer editing the sheet.
    #[schema(example = "Pending")]
    pub status: String,
}

impl LeaveRequest {
    pub fn from_row(row: &Row) -> Self {
        Self {
            employee_id: row.cell(column::EMPLOYEE_ID).to_string(),
            leave_type: row.cell(column::LEAVE_TYPE).to_string(),
            start_date: row.cell(column::START_DATE).to_string(),
            end_date: row.cell(column::END_DATE).to_string(),
            reason: row.cell(column::REASON).to_string(),
            status: row.cell(column::STATUS).to_string(),
        }
    }

    pub fn to_row(&self) -> Row {
        Row::new([
            self.employee_id.as_str(),
            self.leave_type.as_str(),
            self.start_date.as_str(),
            self.end_date.as_str(),
            self.reason.as_str(),
            self.status.as_str(),
        ])
    }
}
