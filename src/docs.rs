use crate::api::attendance::{PhotoReqDto, PhotoResponse};
use crate::api::leave_request::{CreateLeave, CreateLeaveResponse, LeaveListResponse};
use crate::model::attendance::AttendanceHandle;
use crate::model::leave_request::LeaveRequest;
use crate::models::{
    LeaveLoginReqDto, LoginReqDto, LoginResponse, LogoutResponse, MeResponse, SessionKind,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Tracker API",
        version = "1.0.0",
        description = r#"
## Employee Attendance & Leave Tracking

Employees sign in, their login/logout times and location are recorded, a
selfie is attached to the day's attendance record, and leave requests are
filed for HR review. All records live in a shared spreadsheet with three
worksheets: **Employees**, **Attendance Logs** and **Leave Requests**.

### 🔐 Security
`/auth/*` returns a bearer token valid for one session (24 hours by default).
Everything under `/api` requires it.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::leave_login,
        crate::auth::handlers::me,
        crate::auth::handlers::logout,

        crate::api::attendance::attach_photo,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list
    ),
    components(
        schemas(
            LoginReqDto,
            LeaveLoginReqDto,
            LoginResponse,
            MeResponse,
            LogoutResponse,
            SessionKind,
            AttendanceHandle,
            PhotoReqDto,
            PhotoResponse,
            CreateLeave,
            CreateLeaveResponse,
            LeaveListResponse,
            LeaveRequest
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login, session and logout APIs"),
        (name = "Attendance", description = "Attendance photo APIs"),
        (name = "Leave", description = "Leave request APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/login",
            "/auth/leave-login",
            "/api/me",
            "/api/logout",
            "/api/attendance/photo",
            "/api/leave",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }
}
