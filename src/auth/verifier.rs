use std::sync::Arc;

use tracing::{debug, info};

use super::password::verify_password;
use crate::model::employee::EmployeeColumns;
use crate::store::{RecordStore, StoreResult, Table};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated(String),
    NotFound,
    WrongPassword,
}

/// Checks employee credentials against the Employees table.
///
/// `NotFound` and `WrongPassword` stay distinct because the login pages
/// show different messages for them. That difference tells a caller
/// whether an employee id exists.
pub struct CredentialVerifier {
    store: Arc<dyn RecordStore>,
}

impl CredentialVerifier {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn verify(&self, employee_id: &str, password: &str) -> StoreResult<AuthOutcome> {
        let employee_id = employee_id.trim();
        let password = password.trim();
        if employee_id.is_empty() {
            return Ok(AuthOutcome::NotFound);
        }

        let rows = self.store.read_all(Table::Employees).await?;
        let columns = EmployeeColumns::from_header(rows.first());

        let Some(employee) = rows
            .iter()
            .skip(1)
            .map(|row| columns.employee(row))
            .find(|e| e.employee_id == employee_id)
        else {
            info!(employee_id, "Unknown employee id");
            return Ok(AuthOutcome::NotFound);
        };

        debug!(employee_id, "Employee found, checking password");

        if !employee.password_hash.is_empty() && verify_password(password, &employee.password_hash) {
            Ok(AuthOutcome::Authenticated(employee.employee_id))
        } else {
            info!(employee_id, "Password mismatch");
            Ok(AuthOutcome::WrongPassword)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::store::memory::MemoryStore;
    use crate::store::Row;
    use crate::testing::DownStore;

    fn verifier_with(employees: &[(&str, &str)]) -> CredentialVerifier {
        let store = employees
            .iter()
            .fold(MemoryStore::new(), |s, (id, hash)| s.with_employee(id, hash));
        CredentialVerifier::new(Arc::new(store))
    }

    #[actix_web::test]
    async fn matching_password_authenticates() {
        let hash = hash_password("pw1").unwrap();
        let verifier = verifier_with(&[("E100", hash.as_str())]);

        let outcome = verifier.verify(" E100 ", "pw1").await.unwrap();
        assert_eq!(outcome, AuthOutcome::Authenticated("E100".into()));
    }

    #[actix_web::test]
    async fn mismatch_and_unknown_are_distinguished() {
        let hash = hash_password("pw1").unwrap();
        let verifier = verifier_with(&[("E100", hash.as_str())]);

        assert_eq!(
            verifier.verify("E100", "nope").await.unwrap(),
            AuthOutcome::WrongPassword
        );
        assert_eq!(
            verifier.verify("E999", "pw1").await.unwrap(),
            AuthOutcome::NotFound
        );
    }

    #[actix_web::test]
    async fn ids_match_case_sensitively() {
        let hash = hash_password("pw1").unwrap();
        let verifier = verifier_with(&[("E100", hash.as_str())]);

        assert_eq!(
            verifier.verify("e100", "pw1").await.unwrap(),
            AuthOutcome::NotFound
        );
    }

    #[actix_web::test]
    async fn blank_hash_never_authenticates() {
        let verifier = verifier_with(&[("E100", "")]);
        assert_eq!(
            verifier.verify("E100", "").await.unwrap(),
            AuthOutcome::WrongPassword
        );
    }

    #[actix_web::test]
    async fn header_order_is_respected() {
        let store = MemoryStore::new();
        let hash = hash_password("pw1").unwrap();
        // Provisioning sheet with extra columns in a different order.
        store
            .update_cell(Table::Employees, 1, 1, "Name")
            .await
            .unwrap();
        store
            .update_cell(Table::Employees, 1, 2, "PasswordHash")
            .await
            .unwrap();
        store
            .update_cell(Table::Employees, 1, 3, "EmployeeID")
            .await
            .unwrap();
        store
            .append_row(Table::Employees, Row::new(["Asha", hash.as_str(), "E100"]))
            .await
            .unwrap();

        let verifier = CredentialVerifier::new(Arc::new(store));
        assert_eq!(
            verifier.verify("E100", "pw1").await.unwrap(),
            AuthOutcome::Authenticated("E100".into())
        );
    }

    #[actix_web::test]
    async fn store_failure_propagates() {
        let verifier = CredentialVerifier::new(Arc::new(DownStore));
        assert!(verifier.verify("E100", "pw1").await.is_err());
    }
}
