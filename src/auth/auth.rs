use crate::model::attendance::AttendanceHandle;
use crate::models::{Claims, SessionKind};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};

/// The authenticated employee behind a request, put in place by
/// `auth_middleware`.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub employee_id: String,
    pub kind: SessionKind,
    pub location: String,
    pub login_time: String,

    /// Present only if this session opened an attendance row
    pub attendance: Option<AttendanceHandle>,
    pub jti: String,
}

impl From<Claims> for SessionUser {
    fn from(claims: Claims) -> Self {
        Self {
            employee_id: claims.sub,
            kind: claims.kind,
            location: claims.location,
            login_time: claims.login_time,
            attendance: claims.attendance,
            jti: claims.jti,
        }
    }
}

impl FromRequest for SessionUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<SessionUser>()
                .cloned()
                .ok_or_else(|| ErrorUnauthorized("Not logged in")),
        )
    }
}
