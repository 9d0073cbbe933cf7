use crate::store::{Row, column_of};

/// Header names in the Employees worksheet, maintained by HR provisioning.
pub const EMPLOYEE_ID_HEADER: &str = "EmployeeID";
pub const PASSWORD_HASH_HEADER: &str = "PasswordHash";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    pub employee_id: String,
    pub password_hash: String,
}

/// Where the two credential columns live. Resolved from the header so the
/// provisioning sheet may carry extra columns in any order.
#[derive(Debug, Clone, Copy)]
pub struct EmployeeColumns {
    pub employee_id: usize,
    pub password_hash: usize,
}

impl EmployeeColumns {
    pub fn from_header(header: Option<&Row>) -> Self {
        let find = |name, fallback| header.and_then(|h| column_of(h, name)).unwrap_or(fallback);
        Self {
            employee_id: find(EMPLOYEE_ID_HEADER, 1),
            password_hash: find(PASSWORD_HASH_HEADER, 2),
        }
    }

    pub fn employee(&self, row: &Row) -> Employee {
        Employee {
            employee_id: row.cell(self.employee_id).trim().to_string(),
            password_hash: row.cell(self.password_hash).trim().to_string(),
        }
    }
}
