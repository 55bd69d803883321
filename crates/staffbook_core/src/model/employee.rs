//! Employee domain model.
//!
//! # Responsibility
//! - Define create/update inputs and the employee + department read model.
//! - Provide field-shape validation for caller-supplied values.
//!
//! # Invariants
//! - `id` is assigned by storage and never changes.
//! - `employee_code` is the external, user-facing code; it is set on create
//!   and is not part of updates.
//! - `manager_id` is only checked for existence on create.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\p{L}+(?: \p{L}+)*$").expect("valid name regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@.]+(?:\.[^\s@.]+)*\.[A-Za-z]{2,}$").expect("valid email regex")
});
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{10,15}$").expect("valid phone regex"));
static EMPLOYEE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("valid employee code regex"));

/// System-assigned employee identifier (`employees.id`).
///
/// Distinct from the external employee code.
pub type EmployeeId = i64;

/// Input for creating one employee together with its department assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    /// Serialized as `employee_id` to match the external schema.
    #[serde(rename = "employee_id")]
    pub employee_code: String,
    pub phone_number: String,
    #[serde(default)]
    pub manager_id: Option<EmployeeId>,
    pub department_name: String,
}

/// Replacement values for an existing employee and its department assignment.
///
/// Full replacement: every field is written, including `manager_id = None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeChanges {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(default)]
    pub manager_id: Option<EmployeeId>,
    pub department_name: String,
}

/// Employee row outer-joined with its department assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub id: EmployeeId,
    pub name: String,
    pub email: String,
    #[serde(rename = "employee_id")]
    pub employee_code: String,
    pub phone_number: String,
    pub manager_id: Option<EmployeeId>,
    /// `None` when the employee has no department assignment.
    pub department_name: Option<String>,
}

/// Field-shape violations detected before any storage work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmployeeValidationError {
    /// Name is empty or contains characters other than letters and single spaces.
    InvalidName,
    /// Email is not shaped like `local@domain.tld`.
    InvalidEmail,
    /// Phone number is not 10 to 15 digits.
    InvalidPhoneNumber,
    /// External employee code is empty or not ASCII alphanumeric.
    InvalidEmployeeCode,
    /// Department name is blank.
    EmptyDepartmentName,
}

impl Display for EmployeeValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "name should only contain alphabets"),
            Self::InvalidEmail => write!(f, "invalid email format"),
            Self::InvalidPhoneNumber => write!(f, "invalid phone number"),
            Self::InvalidEmployeeCode => write!(f, "employee id must be alphanumeric"),
            Self::EmptyDepartmentName => write!(f, "department name must not be blank"),
        }
    }
}

impl Error for EmployeeValidationError {}

impl NewEmployee {
    /// Checks field shapes. Does not touch storage, so the manager reference
    /// is not resolved here.
    pub fn validate(&self) -> Result<(), EmployeeValidationError> {
        validate_contact(&self.name, &self.email, &self.phone_number)?;
        if !EMPLOYEE_CODE_RE.is_match(&self.employee_code) {
            return Err(EmployeeValidationError::InvalidEmployeeCode);
        }
        validate_department(&self.department_name)
    }
}

impl EmployeeChanges {
    /// Checks field shapes of the replacement values.
    pub fn validate(&self) -> Result<(), EmployeeValidationError> {
        validate_contact(&self.name, &self.email, &self.phone_number)?;
        validate_department(&self.department_name)
    }
}

impl From<&NewEmployee> for EmployeeChanges {
    fn from(value: &NewEmployee) -> Self {
        Self {
            name: value.name.clone(),
            email: value.email.clone(),
            phone_number: value.phone_number.clone(),
            manager_id: value.manager_id,
            department_name: value.department_name.clone(),
        }
    }
}

fn validate_contact(
    name: &str,
    email: &str,
    phone_number: &str,
) -> Result<(), EmployeeValidationError> {
    if !NAME_RE.is_match(name) {
        return Err(EmployeeValidationError::InvalidName);
    }
    if !EMAIL_RE.is_match(email) {
        return Err(EmployeeValidationError::InvalidEmail);
    }
    if !PHONE_RE.is_match(phone_number) {
        return Err(EmployeeValidationError::InvalidPhoneNumber);
    }
    Ok(())
}

fn validate_department(department_name: &str) -> Result<(), EmployeeValidationError> {
    if department_name.trim().is_empty() {
        return Err(EmployeeValidationError::EmptyDepartmentName);
    }
    Ok(())
}
