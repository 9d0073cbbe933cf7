use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use derive_more::{Display, Error};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

const SCOPES: &str =
    "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive";

/// Refresh this long before Google says the token expires.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    token_uri: String,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

#[derive(Debug, Display, Error)]
#[display(fmt = "google auth failed: {}", reason)]
pub struct GoogleAuthError {
    pub reason: String,
}

/// OAuth2 bearer tokens for a Google service account (JWT bearer grant).
pub struct GoogleAuth {
    client_email: String,
    token_uri: String,
    signing_key: EncodingKey,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl GoogleAuth {
    pub fn from_file(path: &str, http: reqwest::Client) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read service account file {path}"))?;
        let key: ServiceAccountKey =
            serde_json::from_str(&raw).context("service account file is not valid JSON")?;
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .context("service account private_key is not an RSA PEM key")?;

        Ok(Self {
            client_email: key.client_email,
            token_uri: key.token_uri,
            signing_key,
            http,
            cached: Mutex::new(None),
        })
    }

    fn cached_token(&self) -> Option<String> {
        let guard = self.cached.lock().ok()?;
        guard
            .as_ref()
            .filter(|t| Instant::now() < t.refresh_at)
            .map(|t| t.value.clone())
    }

    pub async fn access_token(&self) -> Result<String, GoogleAuthError> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        let now = chrono::Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope: SCOPES,
            aud: &self.token_uri,
            iat: now,
            exp: now + 3600,
        };
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .map_err(|e| GoogleAuthError {
                reason: format!("signing assertion: {e}"),
            })?;

        debug!(token_uri = %self.token_uri, "Requesting service account token");

        let response: TokenResponse = self
            .http
            .post(&self.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| GoogleAuthError {
                reason: e.to_string(),
            })?
            .json()
            .await
            .map_err(|e| GoogleAuthError {
                reason: e.to_string(),
            })?;

        let lifetime = Duration::from_secs(response.expires_in).saturating_sub(EXPIRY_MARGIN);
        if let Ok(mut guard) = self.cached.lock() {
            *guard = Some(CachedToken {
                value: response.access_token.clone(),
                refresh_at: Instant::now() + lifetime,
            });
        }

        Ok(response.access_token)
    }
}
