//! Domain model for employees and their department assignments.
//!
//! # Responsibility
//! - Define the write inputs and the joined read projection.
//! - Own field-shape validation rules.
//!
//! # Invariants
//! - Every employee is identified by a system-assigned `EmployeeId`.
//! - A department assignment never exists without its employee.

pub mod employee;
