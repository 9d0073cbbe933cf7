use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use derive_more::{Display, Error};
use tracing::{info, warn};

use crate::external::Notifier;
use crate::model::attendance::DATE_FORMAT;
use crate::model::leave_request::{LeaveRequest, STATUS_PENDING, column};
use crate::store::{RecordStore, StoreError, StoreResult, Table};

#[derive(Debug, Display, Error)]
pub enum LeaveError {
    #[display(fmt = "{}", reason)]
    Validation { reason: String },
    #[display(fmt = "{}", source)]
    Store { source: StoreError },
}

impl From<StoreError> for LeaveError {
    fn from(source: StoreError) -> Self {
        LeaveError::Store { source }
    }
}

fn invalid(reason: impl Into<String>) -> LeaveError {
    LeaveError::Validation {
        reason: reason.into(),
    }
}

#[derive(Debug, Clone)]
pub struct LeaveSubmission {
    pub leave_type: String,
    pub start_date: String,
    pub end_date: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Sent,
    Failed { reason: String },
}

#[derive(Debug)]
pub struct SubmissionResult {
    pub request: LeaveRequest,
    pub notification: NotificationOutcome,
}

/// Records leave requests and tells HR about them.
///
/// The appended row is the outcome of a submission. The HR mail is best
/// effort: it runs under its own timeout and its failure is reported back
/// without undoing or retrying the append.
pub struct LeaveWorkflow {
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn Notifier>,
    hr_recipient: String,
    notify_timeout: Duration,
}

impl LeaveWorkflow {
    pub fn new(
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn Notifier>,
        hr_recipient: String,
        notify_timeout: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            hr_recipient,
            notify_timeout,
        }
    }

    pub async fn submit(
        &self,
        employee_id: &str,
        submission: LeaveSubmission,
    ) -> Result<SubmissionResult, LeaveError> {
        let request = validate(employee_id, submission)?;

        self.store
            .append_row(Table::LeaveRequests, request.to_row())
            .await?;

        info!(
            employee_id,
            leave_type = %request.leave_type,
            start_date = %request.start_date,
            end_date = %request.end_date,
            "Leave request recorded"
        );

        let notification = self.notify_hr(&request).await;
        Ok(SubmissionResult {
            request,
            notification,
        })
    }

    async fn notify_hr(&self, request: &LeaveRequest) -> NotificationOutcome {
        let (subject, body) = hr_message(request);
        let send = self.notifier.send(&self.hr_recipient, &subject, &body);

        match actix_web::rt::time::timeout(self.notify_timeout, send).await {
            Ok(Ok(())) => NotificationOutcome::Sent,
            Ok(Err(e)) => {
                warn!(employee_id = %request.employee_id, error = %e, "HR notification failed");
                NotificationOutcome::Failed {
                    reason: e.reason,
                }
            }
            Err(_) => {
                warn!(employee_id = %request.employee_id, "HR notification timed out");
                NotificationOutcome::Failed {
                    reason: format!("timed out after {}s", self.notify_timeout.as_secs()),
                }
            }
        }
    }

    /// The employee's requests in table order, oldest first.
    pub async fn list_for_employee(&self, employee_id: &str) -> StoreResult<Vec<LeaveRequest>> {
        let rows = self
            .store
            .find_rows(Table::LeaveRequests, &|row| {
                row.cell(column::EMPLOYEE_ID) == employee_id
            })
            .await?;
        Ok(rows
            .iter()
            .map(|(_, row)| LeaveRequest::from_row(row))
            .collect())
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, LeaveError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| invalid(format!("{field} must be a date in YYYY-MM-DD form")))
}

/// Every field non-blank, dates in `YYYY-MM-DD` form, start not after end.
fn validate(employee_id: &str, s: LeaveSubmission) -> Result<LeaveRequest, LeaveError> {
    let fields = [
        ("leave_type", &s.leave_type),
        ("start_date", &s.start_date),
        ("end_date", &s.end_date),
        ("reason", &s.reason),
    ];
    if employee_id.trim().is_empty() {
        return Err(invalid("employee_id is required"));
    }
    if let Some((name, _)) = fields.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err(invalid(format!("{name} is required")));
    }

    let start = parse_date("start_date", s.start_date.trim())?;
    let end = parse_date("end_date", s.end_date.trim())?;
    if start > end {
        return Err(invalid("start_date cannot be after end_date"));
    }

    Ok(LeaveRequest {
        employee_id: employee_id.trim().to_string(),
        leave_type: s.leave_type.trim().to_string(),
        start_date: start.format(DATE_FORMAT).to_string(),
        end_date: end.format(DATE_FORMAT).to_string(),
        reason: s.reason.trim().to_string(),
        status: STATUS_PENDING.to_string(),
    })
}

fn hr_message(request: &LeaveRequest) -> (String, String) {
    let subject = format!("Leave Request - {}", request.employee_id);
    let body = format!(
        "Employee ID: {}\nLeave Type: {}\nDates: {} to {}\nReason: {}\nStatus: {}\nPlease review the leave request.",
        request.employee_id,
        request.leave_type,
        request.start_date,
        request.end_date,
        request.reason,
        request.status,
    );
    (subject, body)
}
