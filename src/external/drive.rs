use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use super::google::GoogleAuth;
use super::{PhotoError, PhotoStorage};

const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart&fields=id";
const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const BOUNDARY: &str = "attendance-photo-boundary";

#[derive(Deserialize)]
struct CreatedFile {
    id: String,
}

/// Uploads attendance photos into one Drive folder and shares them
/// read-only with anyone holding the link.
pub struct DrivePhotoStorage {
    folder_id: String,
    auth: Arc<GoogleAuth>,
    http: reqwest::Client,
}

impl DrivePhotoStorage {
    pub fn new(folder_id: String, auth: Arc<GoogleAuth>, http: reqwest::Client) -> Self {
        Self {
            folder_id,
            auth,
            http,
        }
    }

    async fn token(&self) -> Result<String, PhotoError> {
        self.auth.access_token().await.map_err(|e| PhotoError {
            reason: e.to_string(),
        })
    }
}

/// Drive's multipart upload wants multipart/related: JSON metadata, then
/// the media part.
fn related_body(metadata: &serde_json::Value, bytes: &[u8], mime_type: &str) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + 512);
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n--{BOUNDARY}\r\nContent-Type: {mime_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn failed(step: &'static str) -> impl Fn(reqwest::Error) -> PhotoError {
    move |e| {
        error!(step, error = %e, "Drive request failed");
        let reason = if e.is_timeout() {
            format!("{step} timed out")
        } else {
            format!("{step}: {e}")
        };
        PhotoError { reason }
    }
}

#[async_trait]
impl PhotoStorage for DrivePhotoStorage {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        mime_type: &str,
    ) -> Result<String, PhotoError> {
        let token = self.token().await?;
        let metadata = json!({ "name": filename, "parents": [self.folder_id] });

        let file: CreatedFile = self
            .http
            .post(UPLOAD_URL)
            .bearer_auth(&token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={BOUNDARY}"),
            )
            .body(related_body(&metadata, &bytes, mime_type))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(failed("upload"))?
            .json()
            .await
            .map_err(failed("decode upload response"))?;

        self.http
            .post(format!("{FILES_URL}/{}/permissions", file.id))
            .bearer_auth(&token)
            .json(&json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(failed("share"))?;

        info!(file_id = %file.id, filename, "Photo uploaded to Drive");
        Ok(format!("https://drive.google.com/uc?id={}", file.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn related_body_wraps_metadata_and_media() {
        let body = related_body(&json!({ "name": "E100.png" }), b"PNG", "image/png");
        let text = String::from_utf8(body).unwrap();

        assert!(text.starts_with(&format!("--{BOUNDARY}\r\n")));
        assert!(text.contains(r#"{"name":"E100.png"}"#));
        assert!(text.contains("Content-Type: image/png\r\n\r\nPNG\r\n"));
        assert!(text.ends_with(&format!("--{BOUNDARY}--\r\n")));
    }
}
