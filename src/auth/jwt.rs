use crate::model::attendance::AttendanceHandle;
use crate::models::{Claims, SessionKind};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

fn now() -> usize {
    chrono::Utc::now().timestamp().max(0) as usize
}

pub struct NewSession<'a> {
    pub employee_id: &'a str,
    pub kind: SessionKind,
    pub location: &'a str,
    pub login_time: &'a str,
    pub attendance: Option<AttendanceHandle>,
}

pub fn generate_session_token(
    session: NewSession<'_>,
    secret: &str,
    ttl: usize,
) -> Result<(String, Claims), Error> {
    let claims = Claims {
        sub: session.employee_id.to_string(),
        kind: session.kind,
        location: session.location.to_string(),
        login_time: session.login_time.to_string(),
        attendance: session.attendance,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok((token, claims))
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}
