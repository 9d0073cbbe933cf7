use crate::{
    auth::{
        auth::SessionUser,
        jwt::{NewSession, generate_session_token},
        revocation::SessionRevocations,
        verifier::{AuthOutcome, CredentialVerifier},
    },
    config::Config,
    error::AppError,
    model::attendance::{TIME_FORMAT, format_location},
    models::{LeaveLoginReqDto, LoginReqDto, LoginResponse, LogoutResponse, MeResponse, SessionKind},
    service::attendance::{AttendanceTracker, CloseOutcome},
};
use actix_web::{HttpResponse, web};
use chrono::Local;
use tracing::{debug, info, instrument};

async fn authenticate(
    verifier: &CredentialVerifier,
    employee_id: &str,
    password: &str,
) -> Result<String, AppError> {
    if employee_id.trim().is_empty() || password.trim().is_empty() {
        info!("Validation failed: empty employee id or password");
        return Err(AppError::Validation(
            "Employee ID and password are required".to_string(),
        ));
    }

    match verifier.verify(employee_id, password).await? {
        AuthOutcome::Authenticated(id) => Ok(id),
        AuthOutcome::NotFound => Err(AppError::EmployeeNotFound),
        AuthOutcome::WrongPassword => Err(AppError::WrongPassword),
    }
}

/// Attendance login: verifies credentials and opens today's attendance row.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in, attendance session opened", body = LoginResponse),
        (status = 400, description = "Missing employee id or password"),
        (status = 401, description = "Employee ID not found / Incorrect password"),
        (status = 409, description = "An attendance session is already open today"),
        (status = 503, description = "Record store unavailable")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(body, verifier, tracker, config),
    fields(employee_id = %body.employee_id.trim())
)]
pub async fn login(
    body: web::Json<LoginReqDto>,
    verifier: web::Data<CredentialVerifier>,
    tracker: web::Data<AttendanceTracker>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    info!("Login request received");

    let employee_id = authenticate(&verifier, &body.employee_id, &body.password).await?;
    let location = format_location(body.lat, body.lon);

    debug!(location = %location, "Opening attendance session");
    let handle = tracker
        .open_session(&employee_id, &location, Local::now().naive_local())
        .await?;

    let (token, _) = generate_session_token(
        NewSession {
            employee_id: &employee_id,
            kind: SessionKind::Attendance,
            location: &location,
            login_time: &handle.login_time,
            attendance: Some(handle.clone()),
        },
        &config.jwt_secret,
        config.session_ttl,
    )
    .map_err(|e| AppError::Internal(e.to_string()))?;

    info!("Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        employee_id,
        attendance: Some(handle),
    }))
}

/// Leave portal login: verifies credentials without touching attendance.
#[utoipa::path(
    post,
    path = "/auth/leave-login",
    request_body = LeaveLoginReqDto,
    responses(
        (status = 200, description = "Logged in to the leave portal", body = LoginResponse),
        (status = 400, description = "Missing employee id or password"),
        (status = 401, description = "Employee ID not found / Incorrect password"),
        (status = 503, description = "Record store unavailable")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_leave_login",
    skip(body, verifier, config),
    fields(employee_id = %body.employee_id.trim())
)]
pub async fn leave_login(
    body: web::Json<LeaveLoginReqDto>,
    verifier: web::Data<CredentialVerifier>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let employee_id = authenticate(&verifier, &body.employee_id, &body.password).await?;
    let login_time = Local::now().format(TIME_FORMAT).to_string();

    let (token, _) = generate_session_token(
        NewSession {
            employee_id: &employee_id,
            kind: SessionKind::Leave,
            location: "",
            login_time: &login_time,
            attendance: None,
        },
        &config.jwt_secret,
        config.session_ttl,
    )
    .map_err(|e| AppError::Internal(e.to_string()))?;

    info!("Leave portal login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        employee_id,
        attendance: None,
    }))
}

/// Current session details.
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Session details", body = MeResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(user: SessionUser) -> HttpResponse {
    HttpResponse::Ok().json(MeResponse {
        employee_id: user.employee_id,
        kind: user.kind,
        login_time: user.login_time,
        location: user.location,
    })
}

/// Records the logout time and ends the session.
///
/// Only attendance sessions touch the Attendance Logs; a leave portal
/// session just ends. The session stays usable if the store cannot be reached, so the
/// employee can retry.
#[utoipa::path(
    post,
    path = "/api/logout",
    responses(
        (status = 200, description = "Logged out", body = LogoutResponse),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Record store unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    user: SessionUser,
    tracker: web::Data<AttendanceTracker>,
    revocations: web::Data<SessionRevocations>,
) -> Result<HttpResponse, AppError> {
    let outcome = match user.kind {
        SessionKind::Attendance => {
            tracker
                .close_session(
                    &user.employee_id,
                    user.attendance.as_ref(),
                    Local::now().naive_local(),
                )
                .await?
        }
        SessionKind::Leave => CloseOutcome::NoOpenSession,
    };

    revocations.revoke(&user.jti).await;
    info!(employee_id = %user.employee_id, "Logged out");

    Ok(HttpResponse::Ok().json(LogoutResponse {
        message: "Logged out".to_string(),
        closed: matches!(outcome, CloseOutcome::Closed { .. }),
    }))
}
