use crate::auth::auth::SessionUser;
use crate::config::Config;
use crate::error::AppError;
use crate::service::attendance::{AttendanceTracker, Photo};
use actix_web::{HttpResponse, web};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::Local;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct PhotoReqDto {
    /// `data:image/<type>;base64,<payload>` as produced by a canvas capture.
    #[schema(example = "data:image/png;base64,iVBORw0KGgo=")]
    pub photo: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct PhotoResponse {
    #[schema(example = "success")]
    pub status: String,
    #[schema(example = "https://drive.google.com/uc?id=1AbC")]
    pub link: String,
}

fn decode_data_url(data_url: &str, max_bytes: usize) -> Result<Photo, AppError> {
    let malformed = || AppError::Validation("photo must be a base64 data:image URL".to_string());

    let rest = data_url.trim().strip_prefix("data:image/").ok_or_else(malformed)?;
    let (subtype, payload) = rest.split_once(";base64,").ok_or_else(malformed)?;
    if subtype.is_empty() {
        return Err(malformed());
    }

    let bytes = STANDARD.decode(payload.trim()).map_err(|_| malformed())?;
    if bytes.is_empty() {
        return Err(AppError::Validation("photo is empty".to_string()));
    }
    if bytes.len() > max_bytes {
        return Err(AppError::Validation(format!(
            "photo exceeds {max_bytes} bytes"
        )));
    }

    Ok(Photo {
        bytes,
        mime_type: format!("image/{subtype}"),
    })
}

/// Attach the login selfie to this session's attendance record
#[utoipa::path(
    post,
    path = "/api/attendance/photo",
    request_body = PhotoReqDto,
    responses(
        (status = 200, description = "Photo stored and linked", body = PhotoResponse),
        (status = 400, description = "Photo is not a valid image data URL"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "No open attendance session for this login"),
        (status = 502, description = "Photo storage failed; record keeps Pending Photo"),
        (status = 503, description = "Record store unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn attach_photo(
    user: SessionUser,
    body: web::Json<PhotoReqDto>,
    tracker: web::Data<AttendanceTracker>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let handle = user.attendance.as_ref().ok_or_else(|| {
        AppError::Conflict("This session has no attendance record".to_string())
    })?;
    let photo = decode_data_url(&body.photo, config.max_photo_bytes)?;

    let link = tracker
        .attach_photo(handle, photo, Local::now().naive_local())
        .await?;

    Ok(HttpResponse::Ok().json(PhotoResponse {
        status: "success".to_string(),
        link,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_decodes() {
        let photo = decode_data_url("data:image/jpeg;base64,AAEC", 16).unwrap();
        assert_eq!(photo.bytes, vec![0, 1, 2]);
        assert_eq!(photo.mime_type, "image/jpeg");
    }

    #[test]
    fn malformed_data_urls_are_rejected() {
        for bad in [
            "AAEC",
            "data:text/plain;base64,AAEC",
            "data:image/png,AAEC",
            "data:image/png;base64,***",
            "data:image/png;base64,",
            "data:image/;base64,AAEC",
        ] {
            assert!(
                matches!(decode_data_url(bad, 16), Err(AppError::Validation(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn oversized_photo_is_rejected() {
        assert!(decode_data_url("data:image/png;base64,AAECAw==", 3).is_err());
    }
}
