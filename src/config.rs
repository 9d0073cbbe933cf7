use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use strum_macros::EnumString;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum StoreBackend {
    /// Google Sheets + Drive + SMTP.
    Sheets,
    /// Everything in process; for local runs.
    Memory,
}

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    pub jwt_secret: String,
    pub session_ttl: usize,
    pub api_prefix: String,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub store_backend: StoreBackend,
    pub spreadsheet_id: Option<String>,
    pub service_account_file: String,
    pub drive_folder_id: Option<String>,

    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub mail_from: Option<String>,
    pub hr_email: Option<String>,

    pub store_timeout: Duration,
    pub notify_timeout: Duration,
    pub max_photo_bytes: usize,
    pub single_open_session: bool,
    pub log_dir: String,
}

fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid {key}: {raw}")),
        Err(_) => Ok(default),
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").context("SERVER_ADDR must be set")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            session_ttl: var_or("SESSION_TTL", 86_400)?, // 24h
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            rate_login_per_min: var_or("RATE_LOGIN_PER_MIN", 60)?,
            rate_protected_per_min: var_or("RATE_PROTECTED_PER_MIN", 1000)?,

            store_backend: var_or("STORE_BACKEND", StoreBackend::Sheets)?,
            spreadsheet_id: optional("SPREADSHEET_ID"),
            service_account_file: env::var("GOOGLE_SERVICE_ACCOUNT_FILE")
                .unwrap_or_else(|_| "service_account.json".to_string()),
            drive_folder_id: optional("DRIVE_FOLDER_ID"),

            smtp_host: env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
            smtp_port: var_or("SMTP_PORT", 465)?,
            smtp_username: optional("SMTP_USERNAME"),
            smtp_password: optional("SMTP_PASSWORD"),
            mail_from: optional("MAIL_FROM"),
            hr_email: optional("HR_EMAIL"),

            store_timeout: Duration::from_secs(var_or("STORE_TIMEOUT_SECS", 15)?),
            notify_timeout: Duration::from_secs(var_or("NOTIFY_TIMEOUT_SECS", 10)?),
            max_photo_bytes: var_or("MAX_PHOTO_BYTES", 5 * 1024 * 1024)?,
            single_open_session: var_or("SINGLE_OPEN_SESSION", false)?,
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        })
    }

    /// Largest JSON body accepted: a base64 data URL of the biggest photo.
    pub fn json_limit(&self) -> usize {
        self.max_photo_bytes / 3 * 4 + 4096
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            server_addr: "127.0.0.1:0".into(),
            jwt_secret: "test-secret".into(),
            session_ttl: 3600,
            api_prefix: "/api".into(),
            rate_login_per_min: 10_000,
            rate_protected_per_min: 10_000,
            store_backend: StoreBackend::Memory,
            spreadsheet_id: None,
            service_account_file: String::new(),
            drive_folder_id: None,
            smtp_host: String::new(),
            smtp_port: 465,
            smtp_username: None,
            smtp_password: None,
            mail_from: None,
            hr_email: Some("hr@example.com".into()),
            store_timeout: Duration::from_secs(1),
            notify_timeout: Duration::from_secs(1),
            max_photo_bytes: 64 * 1024,
            single_open_session: false,
            log_dir: "logs".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names_parse() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("sheets".parse::<StoreBackend>().unwrap(), StoreBackend::Sheets);
        assert!("mysql".parse::<StoreBackend>().is_err());
    }
}
