//! Core use-case services.
//!
//! # Responsibility
//! - Check manager references, sequence transactional writes, and project
//!   joined reads on top of an injected `EmployeeStore`.
//! - Keep callers decoupled from storage details.

pub mod employee_reader;
pub mod employee_service;
pub mod employee_writer;
pub mod manager_check;
