use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::Row;

pub const PENDING_PHOTO: &str = "Pending Photo";
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// 1-based columns of the Attendance Logs worksheet.
pub mod column {
    pub const EMPLOYEE_ID: usize = 1;
    pub const DATE: usize = 2;
    pub const LOGIN_TIME: usize = 3;
    pub const LOGOUT_TIME: usize = 4;
    pub const LOCATION: usize = 5;
    pub const PHOTO: usize = 6;
    pub const SESSION_TOKEN: usize = 7;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub employee_id: String,
    pub date: String,
    pub login_time: String,
    pub logout_time: Option<String>,
    pub location: String,
    /// `Pending Photo` until a photo URL replaces it.
    pub photo_status: String,
    pub session_token: String,
}

impl AttendanceRecord {
    pub fn opened(
        employee_id: &str,
        location: &str,
        login_at: NaiveDateTime,
        session_token: String,
    ) -> Self {
        Self {
            employee_id: employee_id.to_string(),
            date: login_at.format(DATE_FORMAT).to_string(),
            login_time: login_at.format(TIME_FORMAT).to_string(),
            logout_time: None,
            location: location.to_string(),
            photo_status: PENDING_PHOTO.to_string(),
            session_token,
        }
    }

    pub fn from_row(row: &Row) -> Self {
        let logout = row.cell(column::LOGOUT_TIME);
        Self {
            employee_id: row.cell(column::EMPLOYEE_ID).to_string(),
            date: row.cell(column::DATE).to_string(),
            login_time: row.cell(column::LOGIN_TIME).to_string(),
            logout_time: (!logout.is_empty()).then(|| logout.to_string()),
            location: row.cell(column::LOCATION).to_string(),
            photo_status: row.cell(column::PHOTO).to_string(),
            session_token: row.cell(column::SESSION_TOKEN).to_string(),
        }
    }

    pub fn to_row(&self) -> Row {
        Row::new([
            self.employee_id.as_str(),
            self.date.as_str(),
            self.login_time.as_str(),
            self.logout_time.as_deref().unwrap_or(""),
            self.location.as_str(),
            self.photo_status.as_str(),
            self.session_token.as_str(),
        ])
    }

    pub fn is_open(&self) -> bool {
        self.logout_time.is_none()
    }

    #[cfg(test)]
    pub fn photo_pending(&self) -> bool {
        self.photo_status == PENDING_PHOTO
    }
}

/// Caller-held identity of one attendance row, returned by login and
/// carried in the session so later updates find the row by token rather
/// than by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceHandle {
    #[schema(example = "E100")]
    pub employee_id: String,
    #[schema(example = "2026-01-01")]
    pub date: String,
    #[schema(example = "09:00:00")]
    pub login_time: String,
    #[schema(example = "E100-20260101-5f1c2e0c9d7a4b7e8f00112233445566")]
    pub token: String,
}

/// "lat,lon" when both coordinates were supplied, otherwise empty.
pub fn format_location(lat: Option<f64>, lon: Option<f64>) -> String {
    match (lat, lon) {
        (Some(lat), Some(lon)) => format!("{lat},{lon}"),
        _ => String::new(),
    }
}
