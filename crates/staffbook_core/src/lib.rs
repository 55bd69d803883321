//! Core domain logic for staffbook.
//! Employees and their department assignments, written as atomic units.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::employee::{
    EmployeeChanges, EmployeeId, EmployeeRecord, EmployeeValidationError, NewEmployee,
};
pub use repo::employee_store::{EmployeeStore, SqliteEmployeeStore, StoreError, StoreResult};
pub use service::employee_reader::{EmployeeReader, ReadResult};
pub use service::employee_service::{EmployeeService, ServiceError, ServiceResult};
pub use service::employee_writer::{
    EmployeeWriter, WriteError, WriteResult, WriteState, WriteStep,
};
pub use service::manager_check::{check_manager, ManagerCheckError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
