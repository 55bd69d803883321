//! Read projection of employees joined with department assignments.
//!
//! Read-only and transaction-free. An employee without an assignment is
//! still returned, with `department_name = None`.

use crate::model::employee::{EmployeeId, EmployeeRecord};
use crate::repo::employee_store::{EmployeeStore, StoreError};
use log::{debug, error};

pub type ReadResult<T> = Result<T, StoreError>;

/// Read-side facade over an employee store.
pub struct EmployeeReader<S: EmployeeStore> {
    store: S,
}

impl<S: EmployeeStore> EmployeeReader<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists every employee with its department assignment.
    ///
    /// Callers needing a particular order must sort the result themselves.
    pub fn list_all(&self) -> ReadResult<Vec<EmployeeRecord>> {
        let records = self.store.list_records().inspect_err(|err| {
            error!("event=employee_list module=service status=error error={err}");
        })?;
        debug!(
            "event=employee_list module=service status=ok count={}",
            records.len()
        );
        Ok(records)
    }

    /// Loads one employee with its department assignment.
    ///
    /// Returns `Ok(None)` when no employee has this identifier.
    pub fn get(&self, id: EmployeeId) -> ReadResult<Option<EmployeeRecord>> {
        let record = self.store.get_record(id).inspect_err(|err| {
            error!("event=employee_get module=service status=error employee_id={id} error={err}");
        })?;
        debug!(
            "event=employee_get module=service status=ok employee_id={id} found={}",
            record.is_some()
        );
        Ok(record)
    }
}
