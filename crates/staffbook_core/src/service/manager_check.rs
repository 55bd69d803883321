//! Manager reference check for employee writes.
//!
//! # Responsibility
//! - Confirm a referenced manager exists before an employee is created.
//!
//! # Invariants
//! - Read-only: never mutates the store.
//! - A missing manager is a business-rule failure; a failing lookup is an
//!   infrastructure failure. The two are never conflated.

use crate::model::employee::EmployeeId;
use crate::repo::employee_store::{EmployeeStore, StoreError};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure of a manager reference check.
#[derive(Debug)]
pub enum ManagerCheckError {
    /// No employee row has the referenced identifier.
    NotFound(EmployeeId),
    /// The lookup itself failed.
    Store(StoreError),
}

impl Display for ManagerCheckError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "manager id does not exist: {id}"),
            Self::Store(err) => write!(f, "error checking manager: {err}"),
        }
    }
}

impl Error for ManagerCheckError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Store(err) => Some(err),
        }
    }
}

/// Checks that `manager_id`, when present, names an existing employee.
///
/// `None` means no manager is being assigned and always passes without
/// touching the store.
pub fn check_manager<S: EmployeeStore + ?Sized>(
    store: &S,
    manager_id: Option<EmployeeId>,
) -> Result<(), ManagerCheckError> {
    let Some(manager_id) = manager_id else {
        return Ok(());
    };

    let exists = store
        .employee_exists(manager_id)
        .map_err(ManagerCheckError::Store)?;
    debug!("event=manager_check module=service manager_id={manager_id} found={exists}");

    if exists {
        Ok(())
    } else {
        Err(ManagerCheckError::NotFound(manager_id))
    }
}
