//! Transactional writer for employees and their department assignments.
//!
//! # Responsibility
//! - Run create/update/delete as ordered statement sequences inside one
//!   store transaction.
//! - Resolve every opened transaction to exactly one of commit or rollback
//!   before returning to the caller. A failed begin issues neither.
//!
//! # Invariants
//! - Create inserts the employee before its department row (the department
//!   row needs the generated id).
//! - Delete removes department rows before the employee row.
//! - Update does not re-check the manager reference; only create does.
//! - Zero affected rows on update/delete is success, not `NotFound`.
//! - A failed rollback is reported, never swallowed.
//!
//! Concurrent writers on the same employee are serialized by the store's
//! own locking; the last statement to commit wins.

use crate::model::employee::{EmployeeChanges, EmployeeId, NewEmployee};
use crate::repo::employee_store::{EmployeeStore, StoreError, StoreResult};
use crate::service::manager_check::{check_manager, ManagerCheckError};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type WriteResult<T> = Result<T, WriteError>;

/// Lifecycle of one write invocation.
///
/// `Idle -> TransactionOpen -> [Validating ->] Writing -> Committed | RolledBack`.
/// Any failure after the transaction opens moves to `RolledBack`; a failed
/// begin never leaves `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    Idle,
    TransactionOpen,
    /// Manager reference check (create only).
    Validating,
    Writing,
    Committed,
    RolledBack,
}

impl WriteState {
    /// Returns whether no further transition is allowed.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack)
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::TransactionOpen => "transaction_open",
            Self::Validating => "validating",
            Self::Writing => "writing",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        }
    }
}

/// Store interaction a write failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStep {
    Begin,
    CheckManager,
    InsertEmployee,
    InsertDepartment,
    UpdateEmployee,
    UpdateDepartment,
    DeleteDepartment,
    DeleteEmployee,
    Commit,
}

impl WriteStep {
    fn as_str(self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::CheckManager => "check_manager",
            Self::InsertEmployee => "insert_employee",
            Self::InsertDepartment => "insert_department",
            Self::UpdateEmployee => "update_employee",
            Self::UpdateDepartment => "update_department",
            Self::DeleteDepartment => "delete_department",
            Self::DeleteEmployee => "delete_employee",
            Self::Commit => "commit",
        }
    }
}

impl Display for WriteStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::Begin => "transaction error",
            Self::CheckManager => "error checking manager",
            Self::InsertEmployee => "error adding employee",
            Self::InsertDepartment => "error adding department",
            Self::UpdateEmployee => "error updating employee",
            Self::UpdateDepartment => "error updating department",
            Self::DeleteDepartment => "error deleting department",
            Self::DeleteEmployee => "error deleting employee",
            Self::Commit => "transaction commit error",
        };
        f.write_str(message)
    }
}

/// Failure of a transactional write. The transaction is already resolved
/// when this value reaches the caller.
#[derive(Debug)]
pub enum WriteError {
    /// Business rule: the referenced manager does not exist.
    ManagerNotFound(EmployeeId),
    /// Infrastructure: a store call failed at `step`.
    Store { step: WriteStep, source: StoreError },
    /// Infrastructure: rolling back after `cause` failed as well.
    RollbackFailed {
        cause: Box<WriteError>,
        source: StoreError,
    },
}

impl WriteError {
    /// Returns whether this is a business-rule rejection.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ManagerNotFound(_))
    }

    /// Returns whether this is an infrastructure failure.
    pub fn is_infra(&self) -> bool {
        !self.is_validation()
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ManagerNotFound(_) => "manager_not_found",
            Self::Store { step, .. } => step.as_str(),
            Self::RollbackFailed { .. } => "rollback_failed",
        }
    }
}

impl Display for WriteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ManagerNotFound(id) => write!(f, "manager id does not exist: {id}"),
            Self::Store { step, source } => write!(f, "{step}: {source}"),
            Self::RollbackFailed { cause, source } => {
                write!(f, "rollback failed after `{cause}`: {source}")
            }
        }
    }
}

impl Error for WriteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ManagerNotFound(_) => None,
            Self::Store { source, .. } => Some(source),
            Self::RollbackFailed { source, .. } => Some(source),
        }
    }
}

impl From<ManagerCheckError> for WriteError {
    fn from(value: ManagerCheckError) -> Self {
        match value {
            ManagerCheckError::NotFound(id) => Self::ManagerNotFound(id),
            ManagerCheckError::Store(source) => Self::Store {
                step: WriteStep::CheckManager,
                source,
            },
        }
    }
}

/// One open store transaction and its lifecycle state.
///
/// Dropping a scope that has not reached a terminal state rolls the
/// transaction back, so an abandoned invocation never leaves it open.
struct TransactionScope<'s, S: EmployeeStore + ?Sized> {
    store: &'s S,
    operation: &'static str,
    state: WriteState,
}

impl<'s, S: EmployeeStore + ?Sized> TransactionScope<'s, S> {
    /// Begins a transaction. A failed begin owns nothing, so it returns
    /// without a rollback and any transaction already open on the
    /// connection is left as it was.
    fn open(store: &'s S, operation: &'static str) -> WriteResult<Self> {
        store.begin().map_err(|source| WriteError::Store {
            step: WriteStep::Begin,
            source,
        })?;
        let mut scope = Self {
            store,
            operation,
            state: WriteState::Idle,
        };
        scope.enter(WriteState::TransactionOpen);
        Ok(scope)
    }

    fn enter(&mut self, next: WriteState) {
        debug!(
            "event={} module=service state_from={} state_to={}",
            self.operation,
            self.state.as_str(),
            next.as_str()
        );
        self.state = next;
    }

    fn run<T>(
        &self,
        step: WriteStep,
        statement: impl FnOnce(&S) -> StoreResult<T>,
    ) -> WriteResult<T> {
        statement(self.store).map_err(|source| WriteError::Store { step, source })
    }

    /// Commits on `Ok`, rolls back on `Err`. The single exit of every scope.
    fn finish<T>(self, result: WriteResult<T>) -> WriteResult<T> {
        let value = match result {
            Ok(value) => value,
            Err(cause) => return Err(self.abort(cause)),
        };
        match self.store.commit() {
            Ok(()) => {
                let mut scope = self;
                scope.enter(WriteState::Committed);
                Ok(value)
            }
            Err(source) => Err(self.abort(WriteError::Store {
                step: WriteStep::Commit,
                source,
            })),
        }
    }

    fn abort(mut self, cause: WriteError) -> WriteError {
        let rollback = self.store.rollback();
        self.enter(WriteState::RolledBack);
        match rollback {
            Ok(()) => cause,
            Err(source) => {
                error!(
                    "event=tx_rollback module=service status=error operation={} cause_code={} error={source}",
                    self.operation,
                    cause.error_code()
                );
                WriteError::RollbackFailed {
                    cause: Box::new(cause),
                    source,
                }
            }
        }
    }
}

impl<S: EmployeeStore + ?Sized> Drop for TransactionScope<'_, S> {
    fn drop(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        warn!(
            "event=tx_rollback module=service status=start operation={} reason=scope_dropped state={}",
            self.operation,
            self.state.as_str()
        );
        if let Err(err) = self.store.rollback() {
            error!(
                "event=tx_rollback module=service status=error operation={} reason=scope_dropped error={err}",
                self.operation
            );
        }
        self.state = WriteState::RolledBack;
    }
}

/// Runs employee writes as atomic two-table units over an injected store.
pub struct EmployeeWriter<S: EmployeeStore> {
    store: S,
}

impl<S: EmployeeStore> EmployeeWriter<S> {
    /// Creates a writer over the provided store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates one employee and its department assignment.
    ///
    /// # Contract
    /// - Checks the manager reference inside the transaction, before any write.
    /// - Returns the generated employee id after commit.
    ///
    /// # Errors
    /// - `ManagerNotFound` when `manager_id` names no employee; nothing is written.
    /// - `Store`/`RollbackFailed` on infrastructure failure.
    pub fn create(&self, employee: &NewEmployee) -> WriteResult<EmployeeId> {
        let started_at = Instant::now();
        let result = TransactionScope::open(&self.store, "employee_create").and_then(|mut scope| {
            let steps = create_steps(&mut scope, employee);
            scope.finish(steps)
        });

        match &result {
            Ok(id) => info!(
                "event=employee_create module=service status=ok employee_id={id} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("employee_create", None, err, started_at),
        }
        result
    }

    /// Replaces employee fields and renames its department assignment(s).
    ///
    /// The manager reference is written as given, without an existence check.
    /// An unknown `id` affects no rows and still succeeds.
    pub fn update(&self, id: EmployeeId, changes: &EmployeeChanges) -> WriteResult<()> {
        let started_at = Instant::now();
        let result = TransactionScope::open(&self.store, "employee_update").and_then(|mut scope| {
            scope.enter(WriteState::Writing);
            let steps = scope
                .run(WriteStep::UpdateEmployee, |store| store.update_employee(id, changes))
                .and_then(|employees| {
                    let departments = scope.run(WriteStep::UpdateDepartment, |store| {
                        store.update_departments(id, &changes.department_name)
                    })?;
                    Ok((employees, departments))
                });
            scope.finish(steps)
        });

        match &result {
            Ok((employees, departments)) => info!(
                "event=employee_update module=service status=ok employee_id={id} employee_rows={employees} department_rows={departments} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("employee_update", Some(id), err, started_at),
        }
        result.map(|_| ())
    }

    /// Deletes the department assignment(s) of `id`, then the employee.
    ///
    /// Filters by identifier only. An unknown `id` affects no rows and still
    /// succeeds.
    pub fn delete(&self, id: EmployeeId) -> WriteResult<()> {
        let started_at = Instant::now();
        let result = TransactionScope::open(&self.store, "employee_delete").and_then(|mut scope| {
            scope.enter(WriteState::Writing);
            let steps = scope
                .run(WriteStep::DeleteDepartment, |store| store.delete_departments(id))
                .and_then(|departments| {
                    let employees =
                        scope.run(WriteStep::DeleteEmployee, |store| store.delete_employee(id))?;
                    Ok((employees, departments))
                });
            scope.finish(steps)
        });

        match &result {
            Ok((employees, departments)) => info!(
                "event=employee_delete module=service status=ok employee_id={id} employee_rows={employees} department_rows={departments} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => log_failure("employee_delete", Some(id), err, started_at),
        }
        result.map(|_| ())
    }
}

fn create_steps<S: EmployeeStore + ?Sized>(
    scope: &mut TransactionScope<'_, S>,
    employee: &NewEmployee,
) -> WriteResult<EmployeeId> {
    if employee.manager_id.is_some() {
        scope.enter(WriteState::Validating);
        check_manager(scope.store, employee.manager_id)?;
    }

    scope.enter(WriteState::Writing);
    let id = scope.run(WriteStep::InsertEmployee, |store| {
        store.insert_employee(employee)
    })?;
    scope.run(WriteStep::InsertDepartment, |store| {
        store.insert_department(id, &employee.department_name)
    })?;
    Ok(id)
}

fn log_failure(event: &str, id: Option<EmployeeId>, err: &WriteError, started_at: Instant) {
    let target = id.map_or_else(String::new, |id| format!(" employee_id={id}"));
    if err.is_validation() {
        warn!(
            "event={event} module=service status=rejected{target} duration_ms={} error_code={}",
            started_at.elapsed().as_millis(),
            err.error_code()
        );
    } else {
        error!(
            "event={event} module=service status=error{target} duration_ms={} error_code={} error={err}",
            started_at.elapsed().as_millis(),
            err.error_code()
        );
    }
}
