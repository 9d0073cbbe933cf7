//! Opening, completing and closing attendance rows.
//!
//! The store has no transactions or row identity, and other instances
//! append to the same sheet concurrently. Every row this tracker opens
//! carries a session token in its own column. Photo and logout updates
//! re-find their row by that token right before writing. They never use
//! "the last row", which can belong to another employee who logged in
//! between our append and our update.

use std::sync::Arc;

use chrono::NaiveDateTime;
use derive_more::{Display, Error};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::external::{PhotoError, PhotoStorage};
use crate::model::attendance::{
    AttendanceHandle, AttendanceRecord, DATE_FORMAT, TIME_FORMAT, column,
};
use crate::store::{RecordStore, StoreError, StoreResult, Table};

#[derive(Debug, Display, Error)]
pub enum AttendanceError {
    #[display(fmt = "{}", source)]
    Store { source: StoreError },
    #[display(fmt = "{}", source)]
    UploadFailed { source: PhotoError },
    #[display(fmt = "no attendance row carries session token {}", token)]
    SessionNotFound { token: String },
    #[display(fmt = "attendance session {} is already closed", token)]
    SessionClosed { token: String },
    #[display(fmt = "{} already has an open session on {}", employee_id, date)]
    AlreadyOpen { employee_id: String, date: String },
}

impl From<StoreError> for AttendanceError {
    fn from(source: StoreError) -> Self {
        AttendanceError::Store { source }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed { row_index: usize },
    /// Nothing matched; no row was touched.
    NoOpenSession,
}

/// A decoded selfie ready for upload.
pub struct Photo {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl Photo {
    fn extension(&self) -> &str {
        match self.mime_type.strip_prefix("image/") {
            Some("jpeg") => "jpg",
            Some(sub) if !sub.is_empty() && sub.chars().all(|c| c.is_ascii_alphanumeric()) => sub,
            _ => "png",
        }
    }
}

pub struct AttendanceTracker {
    store: Arc<dyn RecordStore>,
    photos: Arc<dyn PhotoStorage>,
    /// Refuse a login while the employee still has an open row today.
    single_open_session: bool,
}

impl AttendanceTracker {
    pub fn new(
        store: Arc<dyn RecordStore>,
        photos: Arc<dyn PhotoStorage>,
        single_open_session: bool,
    ) -> Self {
        Self {
            store,
            photos,
            single_open_session,
        }
    }

    fn new_token(employee_id: &str, login_at: NaiveDateTime) -> String {
        format!(
            "{}-{}-{}",
            employee_id,
            login_at.format("%Y%m%d"),
            Uuid::new_v4().to_simple()
        )
    }

    /// Appends a fresh open row for `employee_id` and returns its handle.
    pub async fn open_session(
        &self,
        employee_id: &str,
        location: &str,
        login_at: NaiveDateTime,
    ) -> Result<AttendanceHandle, AttendanceError> {
        let record = AttendanceRecord::opened(
            employee_id,
            location,
            login_at,
            Self::new_token(employee_id, login_at),
        );

        if self.single_open_session {
            // Two instances can still both pass this check before either
            // appends; the store offers nothing to close that window.
            let open = self
                .open_rows(employee_id, &record.date)
                .await?;
            if !open.is_empty() {
                return Err(AttendanceError::AlreadyOpen {
                    employee_id: employee_id.to_string(),
                    date: record.date,
                });
            }
        }

        self.store
            .append_row(Table::AttendanceLogs, record.to_row())
            .await?;

        info!(
            employee_id,
            date = %record.date,
            location = %record.location,
            "Attendance session opened"
        );

        Ok(AttendanceHandle {
            employee_id: record.employee_id,
            date: record.date,
            login_time: record.login_time,
            token: record.session_token,
        })
    }

    /// Uploads the photo and writes its URL into the session's own row.
    ///
    /// On upload failure the row keeps `Pending Photo`.
    pub async fn attach_photo(
        &self,
        handle: &AttendanceHandle,
        photo: Photo,
        taken_at: NaiveDateTime,
    ) -> Result<String, AttendanceError> {
        // Refuse before uploading anything for a missing or closed session.
        self.locate_open(handle).await?;

        let filename = format!(
            "{}_{}.{}",
            handle.employee_id,
            taken_at.format("%Y%m%d_%H%M%S"),
            photo.extension()
        );
        let url = self
            .photos
            .upload(photo.bytes, &filename, &photo.mime_type)
            .await
            .map_err(|source| {
                warn!(employee_id = %handle.employee_id, error = %source, "Photo upload failed");
                AttendanceError::UploadFailed { source }
            })?;

        // The upload can take seconds; the row index may have moved meanwhile.
        let (row_index, _) = self.locate_open(handle).await?;
        self.store
            .update_cell(Table::AttendanceLogs, row_index, column::PHOTO, &url)
            .await?;

        info!(employee_id = %handle.employee_id, row_index, "Attendance photo attached");
        Ok(url)
    }

    /// Sets the logout time on the session's row.
    ///
    /// With a handle the row is found by token. Without one, or when the
    /// token no longer resolves, the most recent open row for the employee
    /// on `logout_at`'s date is closed. Calling this again after the row
    /// is closed changes nothing.
    pub async fn close_session(
        &self,
        employee_id: &str,
        handle: Option<&AttendanceHandle>,
        logout_at: NaiveDateTime,
    ) -> Result<CloseOutcome, AttendanceError> {
        let logout_time = logout_at.format(TIME_FORMAT).to_string();

        let target = match handle {
            Some(handle) => match self.locate(&handle.token).await? {
                Some((row_index, record)) if record.employee_id == employee_id => {
                    if !record.is_open() {
                        debug!(employee_id, row_index, "Session already closed");
                        return Ok(CloseOutcome::NoOpenSession);
                    }
                    Some(row_index)
                }
                _ => None,
            },
            None => None,
        };

        let target = match target {
            Some(row_index) => Some(row_index),
            None => {
                let date = logout_at.format(DATE_FORMAT).to_string();
                self.open_rows(employee_id, &date)
                    .await?
                    .last()
                    .map(|(row_index, _)| *row_index)
            }
        };

        let Some(row_index) = target else {
            info!(employee_id, "No open attendance session to close");
            return Ok(CloseOutcome::NoOpenSession);
        };

        self.store
            .update_cell(Table::AttendanceLogs, row_index, column::LOGOUT_TIME, &logout_time)
            .await?;

        info!(employee_id, row_index, logout_time = %logout_time, "Attendance session closed");
        Ok(CloseOutcome::Closed { row_index })
    }

    /// Row carrying `token`, if any. Tokens are unique, but should a row be
    /// duplicated by hand the latest copy wins.
    async fn locate(&self, token: &str) -> StoreResult<Option<(usize, AttendanceRecord)>> {
        let rows = self
            .store
            .find_rows(Table::AttendanceLogs, &|row| {
                row.cell(column::SESSION_TOKEN) == token
            })
            .await?;
        Ok(rows
            .into_iter()
            .last()
            .map(|(i, row)| (i, AttendanceRecord::from_row(&row))))
    }

    async fn locate_open(
        &self,
        handle: &AttendanceHandle,
    ) -> Result<(usize, AttendanceRecord), AttendanceError> {
        match self.locate(&handle.token).await? {
            Some((_, record)) if record.employee_id != handle.employee_id => {
                Err(AttendanceError::SessionNotFound {
                    token: handle.token.clone(),
                })
            }
            Some((_, record)) if !record.is_open() => Err(AttendanceError::SessionClosed {
                token: handle.token.clone(),
            }),
            Some(found) => Ok(found),
            None => Err(AttendanceError::SessionNotFound {
                token: handle.token.clone(),
            }),
        }
    }

    async fn open_rows(
        &self,
        employee_id: &str,
        date: &str,
    ) -> StoreResult<Vec<(usize, AttendanceRecord)>> {
        let rows = self
            .store
            .find_rows(Table::AttendanceLogs, &|row| {
                row.cell(column::EMPLOYEE_ID) == employee_id
                    && row.cell(column::DATE) == date
                    && row.cell(column::LOGOUT_TIME).is_empty()
            })
            .await?;
        Ok(rows
            .into_iter()
            .map(|(i, row)| (i, AttendanceRecord::from_row(&row)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::MemoryPhotoStorage;
    use crate::model::attendance::PENDING_PHOTO;
    use crate::store::Row;
    use crate::store::memory::MemoryStore;
    use crate::testing::{BrokenPhotoStorage, DownStore};
    use chrono::NaiveDate;

    const PHOTO_PREFIX: &str = "https://photos.test/";

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn png(len: usize) -> Photo {
        Photo {
            bytes: vec![0x89; len],
            mime_type: "image/png".into(),
        }
    }

    fn tracker(store: Arc<MemoryStore>) -> AttendanceTracker {
        AttendanceTracker::new(store, Arc::new(MemoryPhotoStorage::new(PHOTO_PREFIX)), false)
    }

    #[actix_web::test]
    async fn login_appends_pending_row() {
        let store = Arc::new(MemoryStore::new());
        let handle = tracker(store.clone())
            .open_session("E100", "12.9,77.6", at(9, 0, 0))
            .await
            .unwrap();

        let rows = store.rows(Table::AttendanceLogs);
        assert_eq!(rows.len(), 1);
        let record = AttendanceRecord::from_row(&rows[0]);
        assert_eq!(record.employee_id, "E100");
        assert_eq!(record.date, "2026-03-02");
        assert_eq!(record.login_time, "09:00:00");
        assert_eq!(record.logout_time, None);
        assert_eq!(record.location, "12.9,77.6");
        assert_eq!(record.photo_status, PENDING_PHOTO);
        assert_eq!(record.session_token, handle.token);
        assert!(handle.token.starts_with("E100-20260302-"));
    }

    #[actix_web::test]
    async fn full_session_completes_one_row() {
        let store = Arc::new(MemoryStore::new());
        let tracker = tracker(store.clone());

        let handle = tracker
            .open_session("E100", "12.9,77.6", at(9, 0, 0))
            .await
            .unwrap();
        let url = tracker
            .attach_photo(&handle, png(10 * 1024), at(9, 0, 5))
            .await
            .unwrap();
        let outcome = tracker
            .close_session("E100", Some(&handle), at(17, 30, 0))
            .await
            .unwrap();

        assert_eq!(outcome, CloseOutcome::Closed { row_index: 2 });
        assert!(url.starts_with(PHOTO_PREFIX));
        assert!(url.ends_with("E100_20260302_090005.png"));

        let rows = store.rows(Table::AttendanceLogs);
        assert_eq!(rows.len(), 1);
        let record = AttendanceRecord::from_row(&rows[0]);
        assert_eq!(record.photo_status, url);
        assert_eq!(record.logout_time.as_deref(), Some("17:30:00"));
    }

    #[actix_web::test]
    async fn interleaved_logins_keep_photos_on_their_own_rows() {
        let store = Arc::new(MemoryStore::new());
        let tracker = tracker(store.clone());

        let first = tracker
            .open_session("E100", "12.9,77.6", at(9, 0, 0))
            .await
            .unwrap();
        let second = tracker
            .open_session("E200", "13.0,77.5", at(9, 0, 0))
            .await
            .unwrap();

        let url = tracker
            .attach_photo(&first, png(64), at(9, 0, 1))
            .await
            .unwrap();

        let rows = store.rows(Table::AttendanceLogs);
        let e100 = AttendanceRecord::from_row(&rows[0]);
        let e200 = AttendanceRecord::from_row(&rows[1]);
        assert_eq!(e100.session_token, first.token);
        assert_eq!(e100.photo_status, url);
        assert_eq!(e200.session_token, second.token);
        assert_eq!(e200.photo_status, PENDING_PHOTO);
    }

    #[actix_web::test]
    async fn photo_follows_row_after_rows_shift() {
        let store = Arc::new(MemoryStore::new());
        let tracker = tracker(store.clone());

        let handle = tracker
            .open_session("E100", "", at(9, 0, 0))
            .await
            .unwrap();
        store
            .append_row(Table::AttendanceLogs, Row::new(["E300", "2026-03-02"]))
            .await
            .unwrap();

        tracker
            .attach_photo(&handle, png(8), at(9, 0, 2))
            .await
            .unwrap();

        let rows = store.rows(Table::AttendanceLogs);
        assert_ne!(rows[0].cell(column::PHOTO), PENDING_PHOTO);
        assert_eq!(rows[1].cell(column::PHOTO), "");
    }

    #[actix_web::test]
    async fn failed_upload_leaves_row_pending() {
        let store = Arc::new(MemoryStore::new());
        let tracker = AttendanceTracker::new(store.clone(), Arc::new(BrokenPhotoStorage), false);

        let handle = tracker
            .open_session("E100", "", at(9, 0, 0))
            .await
            .unwrap();
        let err = tracker
            .attach_photo(&handle, png(8), at(9, 0, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, AttendanceError::UploadFailed { .. }));
        let rows = store.rows(Table::AttendanceLogs);
        assert_eq!(rows[0].cell(column::PHOTO), PENDING_PHOTO);
    }

    #[actix_web::test]
    async fn photo_after_logout_is_refused() {
        let store = Arc::new(MemoryStore::new());
        let photos = Arc::new(MemoryPhotoStorage::new(PHOTO_PREFIX));
        let tracker = AttendanceTracker::new(store.clone(), photos.clone(), false);

        let handle = tracker
            .open_session("E100", "", at(9, 0, 0))
            .await
            .unwrap();
        tracker
            .close_session("E100", Some(&handle), at(9, 30, 0))
            .await
            .unwrap();

        let err = tracker
            .attach_photo(&handle, png(8), at(9, 31, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::SessionClosed { .. }));
        assert!(photos.uploads().is_empty());
    }

    #[actix_web::test]
    async fn second_close_is_a_no_op() {
        let store = Arc::new(MemoryStore::new());
        let tracker = tracker(store.clone());

        let handle = tracker
            .open_session("E100", "", at(9, 0, 0))
            .await
            .unwrap();
        tracker
            .close_session("E100", Some(&handle), at(12, 0, 0))
            .await
            .unwrap();
        let before = store.rows(Table::AttendanceLogs);

        let with_handle = tracker
            .close_session("E100", Some(&handle), at(13, 0, 0))
            .await
            .unwrap();
        let without_handle = tracker
            .close_session("E100", None, at(13, 0, 0))
            .await
            .unwrap();

        assert_eq!(with_handle, CloseOutcome::NoOpenSession);
        assert_eq!(without_handle, CloseOutcome::NoOpenSession);
        assert_eq!(store.rows(Table::AttendanceLogs), before);
    }

    #[actix_web::test]
    async fn close_without_handle_takes_latest_open_row_of_the_day() {
        let store = Arc::new(MemoryStore::new());
        let tracker = tracker(store.clone());

        tracker.open_session("E100", "", at(8, 0, 0)).await.unwrap();
        tracker.open_session("E200", "", at(8, 30, 0)).await.unwrap();
        tracker.open_session("E100", "", at(9, 0, 0)).await.unwrap();

        let outcome = tracker
            .close_session("E100", None, at(17, 0, 0))
            .await
            .unwrap();
        assert_eq!(outcome, CloseOutcome::Closed { row_index: 4 });

        let rows = store.rows(Table::AttendanceLogs);
        assert_eq!(rows[0].cell(column::LOGOUT_TIME), "");
        assert_eq!(rows[1].cell(column::LOGOUT_TIME), "");
        assert_eq!(rows[2].cell(column::LOGOUT_TIME), "17:00:00");
    }

    #[actix_web::test]
    async fn handle_closes_its_row_across_midnight() {
        let store = Arc::new(MemoryStore::new());
        let tracker = tracker(store.clone());

        let handle = tracker
            .open_session("E100", "", at(22, 0, 0))
            .await
            .unwrap();
        let next_day = NaiveDate::from_ymd_opt(2026, 3, 3)
            .unwrap()
            .and_hms_opt(1, 0, 0)
            .unwrap();

        let outcome = tracker
            .close_session("E100", Some(&handle), next_day)
            .await
            .unwrap();
        assert_eq!(outcome, CloseOutcome::Closed { row_index: 2 });
    }

    #[actix_web::test]
    async fn close_with_nothing_open_touches_nothing() {
        let store = Arc::new(MemoryStore::new());
        let outcome = tracker(store.clone())
            .close_session("E100", None, at(17, 0, 0))
            .await
            .unwrap();

        assert_eq!(outcome, CloseOutcome::NoOpenSession);
        assert!(store.rows(Table::AttendanceLogs).is_empty());
    }

    #[actix_web::test]
    async fn repeated_logins_are_allowed_by_default() {
        let store = Arc::new(MemoryStore::new());
        let tracker = tracker(store.clone());

        tracker.open_session("E100", "", at(9, 0, 0)).await.unwrap();
        tracker.open_session("E100", "", at(9, 5, 0)).await.unwrap();

        assert_eq!(store.rows(Table::AttendanceLogs).len(), 2);
    }

    #[actix_web::test]
    async fn single_open_session_rejects_second_login() {
        let store = Arc::new(MemoryStore::new());
        let tracker = AttendanceTracker::new(
            store.clone(),
            Arc::new(MemoryPhotoStorage::new(PHOTO_PREFIX)),
            true,
        );

        let first = tracker.open_session("E100", "", at(9, 0, 0)).await.unwrap();
        let err = tracker
            .open_session("E100", "", at(9, 5, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::AlreadyOpen { .. }));

        tracker
            .close_session("E100", Some(&first), at(10, 0, 0))
            .await
            .unwrap();
        tracker.open_session("E100", "", at(10, 5, 0)).await.unwrap();
        assert_eq!(store.rows(Table::AttendanceLogs).len(), 2);
    }

    #[actix_web::test]
    async fn foreign_handle_is_not_honoured() {
        let store = Arc::new(MemoryStore::new());
        let tracker = tracker(store.clone());

        let theirs = tracker.open_session("E200", "", at(9, 0, 0)).await.unwrap();
        let forged = AttendanceHandle {
            employee_id: "E100".into(),
            ..theirs
        };

        let err = tracker
            .attach_photo(&forged, png(8), at(9, 1, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::SessionNotFound { .. }));
    }

    #[actix_web::test]
    async fn store_outage_surfaces_as_store_error() {
        let tracker = AttendanceTracker::new(
            Arc::new(DownStore),
            Arc::new(MemoryPhotoStorage::new(PHOTO_PREFIX)),
            false,
        );
        let err = tracker
            .open_session("E100", "", at(9, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::Store { .. }));
    }

    #[test]
    fn photo_extension_follows_mime_type() {
        let ext = |m: &str| {
            Photo {
                bytes: vec![],
                mime_type: m.into(),
            }
            .extension()
            .to_string()
        };
        assert_eq!(ext("image/jpeg"), "jpg");
        assert_eq!(ext("image/webp"), "webp");
        assert_eq!(ext("image/../x"), "png");
        assert_eq!(ext("text/plain"), "png");
    }
}
