use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::attendance::AttendanceHandle;

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "E100")]
    pub employee_id: String,
    #[schema(example = "pw1")]
    pub password: String,
    #[schema(example = 12.9)]
    pub lat: Option<f64>,
    #[schema(example = 77.6)]
    pub lon: Option<f64>,
}

#[derive(Deserialize, ToSchema)]
pub struct LeaveLoginReqDto {
    #[schema(example = "E100")]
    pub employee_id: String,
    #[schema(example = "pw1")]
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    #[schema(example = "E100")]
    pub employee_id: String,
    /// Absent for leave-only sessions.
    pub attendance: Option<AttendanceHandle>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    #[schema(example = "E100")]
    pub employee_id: String,
    pub kind: SessionKind,
    #[schema(example = "09:00:00")]
    pub login_time: String,
    #[schema(example = "12.9,77.6")]
    pub location: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LogoutResponse {
    #[schema(example = "Logged out")]
    pub message: String,
    /// Whether an open attendance row received a logout time.
    pub closed: bool,
}

/// What the session was opened for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    /// Full login: an attendance row was opened.
    Attendance,
    /// Leave portal only; no attendance row.
    Leave,
}

/// Session context carried in the bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Employee id.
    pub sub: String,
    pub kind: SessionKind,
    pub location: String,
    pub login_time: String,
    pub attendance: Option<AttendanceHandle>,
    pub exp: usize,
    pub jti: String,
}
