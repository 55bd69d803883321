//! Employee use-case service.
//!
//! # Responsibility
//! - Provide the caller-facing create/update/delete/get/list entry points.
//! - Reject malformed field values before any storage work.
//! - Delegate writes to `EmployeeWriter` and reads to `EmployeeReader`.
//!
//! # Invariants
//! - Field checks never touch the store; manager existence is checked by the
//!   writer on create only.
//! - Service APIs never bypass the writer's transaction contract.

use crate::model::employee::{
    EmployeeChanges, EmployeeId, EmployeeRecord, EmployeeValidationError, NewEmployee,
};
use crate::repo::employee_store::{EmployeeStore, StoreError};
use crate::service::employee_reader::EmployeeReader;
use crate::service::employee_writer::{EmployeeWriter, WriteError};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from employee use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// A field value has the wrong shape.
    Validation(EmployeeValidationError),
    /// Transactional write failed (already rolled back).
    Write(WriteError),
    /// Read projection failed.
    Read(StoreError),
}

impl ServiceError {
    /// Returns whether the request was well-formed transport-wise but rejected
    /// by a field or business rule.
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Validation(_) => true,
            Self::Write(err) => err.is_validation(),
            Self::Read(_) => false,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Write(err) => write!(f, "{err}"),
            Self::Read(err) => write!(f, "error fetching employees: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Write(err) => Some(err),
            Self::Read(err) => Some(err),
        }
    }
}

impl From<EmployeeValidationError> for ServiceError {
    fn from(value: EmployeeValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<WriteError> for ServiceError {
    fn from(value: WriteError) -> Self {
        Self::Write(value)
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Read(value)
    }
}

/// Use-case facade for employee records.
pub struct EmployeeService<S: EmployeeStore> {
    store: S,
}

impl<S: EmployeeStore> EmployeeService<S> {
    /// Creates a service over the provided store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validates fields, then creates the employee and its assignment.
    pub fn create(&self, employee: &NewEmployee) -> ServiceResult<EmployeeId> {
        employee.validate().inspect_err(|err| {
            warn!("event=employee_create module=service status=rejected error_code=invalid_fields error={err}");
        })?;
        Ok(self.writer().create(employee)?)
    }

    /// Validates fields, then replaces the employee and its assignment.
    ///
    /// Unknown ids succeed without effect; the manager is not re-checked.
    pub fn update(&self, id: EmployeeId, changes: &EmployeeChanges) -> ServiceResult<()> {
        changes.validate().inspect_err(|err| {
            warn!("event=employee_update module=service status=rejected employee_id={id} error_code=invalid_fields error={err}");
        })?;
        Ok(self.writer().update(id, changes)?)
    }

    /// Deletes the employee and its assignment(s).
    pub fn delete(&self, id: EmployeeId) -> ServiceResult<()> {
        Ok(self.writer().delete(id)?)
    }

    /// Loads one employee record, `None` when absent.
    pub fn get(&self, id: EmployeeId) -> ServiceResult<Option<EmployeeRecord>> {
        Ok(self.reader().get(id)?)
    }

    /// Lists every employee record.
    pub fn list_all(&self) -> ServiceResult<Vec<EmployeeRecord>> {
        Ok(self.reader().list_all()?)
    }

    fn writer(&self) -> EmployeeWriter<&S> {
        EmployeeWriter::new(&self.store)
    }

    fn reader(&self) -> EmployeeReader<&S> {
        EmployeeReader::new(&self.store)
    }
}
