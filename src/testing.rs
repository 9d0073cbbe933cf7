//! Failing collaborators for exercising error paths in tests.

use async_trait::async_trait;

use crate::external::{NotificationError, Notifier, PhotoError, PhotoStorage};
use crate::store::{RecordStore, Row, StoreError, StoreResult, Table};

/// Every call fails as if the store were unreachable.
pub struct DownStore;

#[async_trait]
impl RecordStore for DownStore {
    async fn read_all(&self, _: Table) -> StoreResult<Vec<Row>> {
        Err(StoreError::unavailable("down"))
    }

    async fn append_row(&self, _: Table, _: Row) -> StoreResult<()> {
        Err(StoreError::unavailable("down"))
    }

    async fn update_cell(&self, _: Table, _: usize, _: usize, _: &str) -> StoreResult<()> {
        Err(StoreError::unavailable("down"))
    }
}

pub struct BrokenPhotoStorage;

#[async_trait]
impl PhotoStorage for BrokenPhotoStorage {
    async fn upload(&self, _: Vec<u8>, _: &str, _: &str) -> Result<String, PhotoError> {
        Err(PhotoError {
            reason: "quota exceeded".into(),
        })
    }
}

pub struct BrokenNotifier;

#[async_trait]
impl Notifier for BrokenNotifier {
    async fn send(&self, _: &str, _: &str, _: &str) -> Result<(), NotificationError> {
        Err(NotificationError {
            reason: "smtp auth rejected".into(),
        })
    }
}

/// Never answers; used to exercise notification timeouts.
pub struct StalledNotifier;

#[async_trait]
impl Notifier for StalledNotifier {
    async fn send(&self, _: &str, _: &str, _: &str) -> Result<(), NotificationError> {
        futures::future::pending::<()>().await;
        Ok(())
    }
}
