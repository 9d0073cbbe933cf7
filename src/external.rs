//! Collaborators outside the record store: photo storage and the HR
//! notification channel. Components receive them as trait objects.

pub mod drive;
pub mod google;
pub mod mail;

use std::sync::Mutex;

use async_trait::async_trait;
use derive_more::{Display, Error};
use tracing::info;

#[derive(Debug, Clone, Display, Error, PartialEq, Eq)]
#[display(fmt = "photo upload failed: {}", reason)]
pub struct PhotoError {
    pub reason: String,
}

#[derive(Debug, Clone, Display, Error, PartialEq, Eq)]
#[display(fmt = "notification failed: {}", reason)]
pub struct NotificationError {
    pub reason: String,
}

/// Binary image storage returning a publicly resolvable URL.
#[async_trait]
pub trait PhotoStorage: Send + Sync {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        mime_type: &str,
    ) -> Result<String, PhotoError>;
}

/// Outbound message channel (email to HR).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, recipient: &str, subject: &str, body: &str)
    -> Result<(), NotificationError>;
}

/// Keeps uploads in memory and hands out URLs under `base_url`.
pub struct MemoryPhotoStorage {
    base_url: String,
    uploads: Mutex<Vec<(String, usize)>>,
}

impl MemoryPhotoStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            uploads: Mutex::new(Vec::new()),
        }
    }

    /// `(filename, byte length)` of every upload so far.
    pub fn uploads(&self) -> Vec<(String, usize)> {
        self.uploads.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PhotoStorage for MemoryPhotoStorage {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        _mime_type: &str,
    ) -> Result<String, PhotoError> {
        self.uploads
            .lock()
            .map_err(|_| PhotoError {
                reason: "photo store lock poisoned".into(),
            })?
            .push((filename.to_string(), bytes.len()));
        Ok(format!("{}{}", self.base_url, filename))
    }
}

/// Writes notifications to the log instead of sending them.
#[derive(Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotificationError> {
        info!(recipient, subject, body, "Notification (log only)");
        Ok(())
    }
}
