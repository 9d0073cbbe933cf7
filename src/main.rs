use actix_web::middleware::NormalizePath;
use actix_web::web::{Data, JsonConfig};
use actix_web::{App, HttpServer, Responder, get};
use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;

mod api;
mod auth;
mod config;
mod docs;
mod error;
mod external;
mod model;
mod models;
mod routes;
mod service;
mod store;
#[cfg(test)]
mod testing;

use auth::revocation::SessionRevocations;
use auth::verifier::CredentialVerifier;
use config::{Config, StoreBackend};
use external::drive::DrivePhotoStorage;
use external::google::GoogleAuth;
use external::mail::SmtpNotifier;
use external::{LogNotifier, MemoryPhotoStorage, Notifier, PhotoStorage};
use service::attendance::AttendanceTracker;
use service::leave::LeaveWorkflow;
use store::RecordStore;
use store::memory::MemoryStore;
use store::sheets::SheetsStore;

use crate::docs::ApiDoc;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance tracker is running"
}

/// The external collaborators every request shares.
struct Collaborators {
    store: Arc<dyn RecordStore>,
    photos: Arc<dyn PhotoStorage>,
    notifier: Arc<dyn Notifier>,
    hr_email: String,
}

fn required(value: &Option<String>, key: &str) -> Result<String> {
    value
        .clone()
        .with_context(|| format!("{key} must be set for the sheets backend"))
}

fn collaborators(config: &Config) -> Result<Collaborators> {
    match config.store_backend {
        StoreBackend::Memory => {
            warn!("Using in-memory store; records are lost on restart");
            Ok(Collaborators {
                store: Arc::new(MemoryStore::new()),
                photos: Arc::new(MemoryPhotoStorage::new("memory://photos/")),
                notifier: Arc::new(LogNotifier),
                hr_email: config
                    .hr_email
                    .clone()
                    .unwrap_or_else(|| "hr@localhost".to_string()),
            })
        }
        StoreBackend::Sheets => {
            let http = reqwest::Client::builder()
                .timeout(config.store_timeout)
                .build()
                .context("failed to build HTTP client")?;
            let google = Arc::new(GoogleAuth::from_file(
                &config.service_account_file,
                http.clone(),
            )?);

            let store = SheetsStore::new(
                required(&config.spreadsheet_id, "SPREADSHEET_ID")?,
                google.clone(),
                http.clone(),
            );
            let photos = DrivePhotoStorage::new(
                required(&config.drive_folder_id, "DRIVE_FOLDER_ID")?,
                google,
                http,
            );
            let notifier = SmtpNotifier::new(
                &config.smtp_host,
                config.smtp_port,
                &required(&config.smtp_username, "SMTP_USERNAME")?,
                &required(&config.smtp_password, "SMTP_PASSWORD")?,
                &required(&config.mail_from, "MAIL_FROM")?,
            )?;

            Ok(Collaborators {
                store: Arc::new(store),
                photos: Arc::new(photos),
                notifier: Arc::new(notifier),
                hr_email: required(&config.hr_email, "HR_EMAIL")?,
            })
        }
    }
}

/// `attendance-tracker hash-password <password>` prints an argon2 hash for
/// the Employees sheet.
fn hash_password_command() -> Option<Result<()>> {
    let mut args = std::env::args().skip(1);
    if args.next().as_deref() != Some("hash-password") {
        return None;
    }
    Some(
        args.next()
            .context("usage: attendance-tracker hash-password <password>")
            .and_then(|pw| {
                auth::password::hash_password(&pw).map_err(|e| anyhow::anyhow!("{e}"))
            })
            .map(|hash| println!("{hash}")),
    )
}

#[actix_web::main]
async fn main() -> Result<()> {
    if let Some(done) = hash_password_command() {
        return done;
    }

    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let Collaborators {
        store,
        photos,
        notifier,
        hr_email,
    } = collaborators(&config)?;

    let verifier = Data::new(CredentialVerifier::new(store.clone()));
    let tracker = Data::new(AttendanceTracker::new(
        store.clone(),
        photos,
        config.single_open_session,
    ));
    let workflow = Data::new(LeaveWorkflow::new(
        store,
        notifier,
        hr_email,
        config.notify_timeout,
    ));
    let revocations = Data::new(SessionRevocations::new(Duration::from_secs(
        config.session_ttl as u64,
    )));

    let server_addr = config.server_addr.clone();
    let json_limit = config.json_limit();

    HttpServer::new(move || {
        let config_data = config.clone();
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(JsonConfig::default().limit(json_limit))
            .app_data(Data::new(config.clone()))
            .app_data(verifier.clone())
            .app_data(tracker.clone())
            .app_data(workflow.clone())
            .app_data(revocations.clone())
            .service(index)
            .configure(move |cfg| routes::configure(cfg, &config_data))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
