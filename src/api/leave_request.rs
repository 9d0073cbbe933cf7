use crate::auth::auth::SessionUser;
use crate::error::AppError;
use crate::model::leave_request::LeaveRequest;
use crate::service::leave::{LeaveSubmission, LeaveWorkflow, NotificationOutcome};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "Sick")]
    pub leave_type: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: String,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: String,
    #[schema(example = "Flu")]
    pub reason: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct CreateLeaveResponse {
    #[schema(example = "Leave request submitted")]
    pub message: String,
    #[schema(example = "Pending")]
    pub status: String,
    /// Set when HR could not be notified; the request is still recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "Email failed: connection refused")]
    pub warning: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
}

/* =========================
Submit leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request recorded", body = CreateLeaveResponse),
        (status = 400, description = "Missing field or invalid date range"),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Record store unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    user: SessionUser,
    workflow: web::Data<LeaveWorkflow>,
    payload: web::Json<CreateLeave>,
) -> Result<HttpResponse, AppError> {
    let payload = payload.into_inner();
    let result = workflow
        .submit(
            &user.employee_id,
            LeaveSubmission {
                leave_type: payload.leave_type,
                start_date: payload.start_date,
                end_date: payload.end_date,
                reason: payload.reason,
            },
        )
        .await?;

    let warning = match result.notification {
        NotificationOutcome::Sent => None,
        NotificationOutcome::Failed { reason } => Some(format!("Email failed: {reason}")),
    };

    Ok(HttpResponse::Ok().json(CreateLeaveResponse {
        message: "Leave request submitted".to_string(),
        status: result.request.status,
        warning,
    }))
}

/* =========================
Own leave history
========================= */
#[utoipa::path(
    get,
    path = "/api/leave",
    responses(
        (status = 200, description = "Caller's leave requests, oldest first", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Record store unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    user: SessionUser,
    workflow: web::Data<LeaveWorkflow>,
) -> Result<HttpResponse, AppError> {
    let data = workflow.list_for_employee(&user.employee_id).await?;
    Ok(HttpResponse::Ok().json(LeaveListResponse { data }))
}
