//! Employee storage contract and SQLite implementation.
//!
//! # Responsibility
//! - Expose transaction control and the single statements the writer
//!   sequences (`employees` and `departments` tables).
//! - Project employee rows outer-joined with their department assignment.
//!
//! # Invariants
//! - `begin`/`commit`/`rollback` are explicit; no method starts a
//!   transaction on its own.
//! - `rollback` with no open transaction is a successful no-op.
//! - Reads never filter out dangling manager references; the join is on
//!   department assignments only.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::employee::{EmployeeChanges, EmployeeId, EmployeeRecord, NewEmployee};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const RECORD_SELECT_SQL: &str = "SELECT
    e.id AS id,
    e.name AS name,
    e.email AS email,
    e.employee_id AS employee_code,
    e.phone_number AS phone_number,
    e.manager_id AS manager_id,
    d.department_name AS department_name
FROM employees e
LEFT JOIN departments d ON e.id = d.employee_id";

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    (
        "employees",
        &[
            "id",
            "name",
            "email",
            "employee_id",
            "phone_number",
            "manager_id",
        ],
    ),
    ("departments", &["employee_id", "department_name"]),
];

pub type StoreResult<T> = Result<T, StoreError>;

/// Infrastructure failure raised by a storage collaborator.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "employee store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "employee store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "employee store requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage collaborator used by the employee write and read paths.
///
/// Implementations run each call as one statement against the current
/// transaction (if any). Sequencing, validation and rollback policy belong
/// to the caller.
pub trait EmployeeStore {
    /// Opens a write transaction.
    fn begin(&self) -> StoreResult<()>;
    /// Commits the open transaction.
    fn commit(&self) -> StoreResult<()>;
    /// Rolls back the open transaction, if one is still open.
    fn rollback(&self) -> StoreResult<()>;
    /// Returns whether an employee row with `id` exists.
    fn employee_exists(&self, id: EmployeeId) -> StoreResult<bool>;
    /// Inserts one employee row and returns its generated identifier.
    fn insert_employee(&self, employee: &NewEmployee) -> StoreResult<EmployeeId>;
    /// Inserts one department assignment for `employee_id`.
    fn insert_department(&self, employee_id: EmployeeId, department_name: &str)
        -> StoreResult<()>;
    /// Rewrites scalar fields and manager of one employee. Returns affected rows.
    fn update_employee(&self, id: EmployeeId, changes: &EmployeeChanges) -> StoreResult<usize>;
    /// Renames every assignment owned by `employee_id`. Returns affected rows.
    fn update_departments(
        &self,
        employee_id: EmployeeId,
        department_name: &str,
    ) -> StoreResult<usize>;
    /// Deletes every assignment owned by `employee_id`. Returns affected rows.
    fn delete_departments(&self, employee_id: EmployeeId) -> StoreResult<usize>;
    /// Deletes one employee row. Returns affected rows.
    fn delete_employee(&self, id: EmployeeId) -> StoreResult<usize>;
    /// Lists every employee joined with its assignment.
    fn list_records(&self) -> StoreResult<Vec<EmployeeRecord>>;
    /// Loads one employee joined with its assignment.
    fn get_record(&self, id: EmployeeId) -> StoreResult<Option<EmployeeRecord>>;
}

impl<S: EmployeeStore + ?Sized> EmployeeStore for &S {
    fn begin(&self) -> StoreResult<()> {
        (**self).begin()
    }

    fn commit(&self) -> StoreResult<()> {
        (**self).commit()
    }

    fn rollback(&self) -> StoreResult<()> {
        (**self).rollback()
    }

    fn employee_exists(&self, id: EmployeeId) -> StoreResult<bool> {
        (**self).employee_exists(id)
    }

    fn insert_employee(&self, employee: &NewEmployee) -> StoreResult<EmployeeId> {
        (**self).insert_employee(employee)
    }

    fn insert_department(
        &self,
        employee_id: EmployeeId,
        department_name: &str,
    ) -> StoreResult<()> {
        (**self).insert_department(employee_id, department_name)
    }

    fn update_employee(&self, id: EmployeeId, changes: &EmployeeChanges) -> StoreResult<usize> {
        (**self).update_employee(id, changes)
    }

    fn update_departments(
        &self,
        employee_id: EmployeeId,
        department_name: &str,
    ) -> StoreResult<usize> {
        (**self).update_departments(employee_id, department_name)
    }

    fn delete_departments(&self, employee_id: EmployeeId) -> StoreResult<usize> {
        (**self).delete_departments(employee_id)
    }

    fn delete_employee(&self, id: EmployeeId) -> StoreResult<usize> {
        (**self).delete_employee(id)
    }

    fn list_records(&self) -> StoreResult<Vec<EmployeeRecord>> {
        (**self).list_records()
    }

    fn get_record(&self, id: EmployeeId) -> StoreResult<Option<EmployeeRecord>> {
        (**self).get_record(id)
    }
}

/// SQLite-backed employee store.
pub struct SqliteEmployeeStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEmployeeStore<'conn> {
    /// Creates a store from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is not the latest.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` when the schema does
    ///   not have the expected shape.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl EmployeeStore for SqliteEmployeeStore<'_> {
    fn begin(&self) -> StoreResult<()> {
        // IMMEDIATE takes the write lock now, so writers on the same row
        // serialize here instead of failing at their first statement.
        self.conn.execute_batch("BEGIN IMMEDIATE;")?;
        Ok(())
    }

    fn commit(&self) -> StoreResult<()> {
        self.conn.execute_batch("COMMIT;")?;
        Ok(())
    }

    fn rollback(&self) -> StoreResult<()> {
        // SQLite may already have aborted the transaction on its own.
        if self.conn.is_autocommit() {
            return Ok(());
        }
        self.conn.execute_batch("ROLLBACK;")?;
        Ok(())
    }

    fn employee_exists(&self, id: EmployeeId) -> StoreResult<bool> {
        let found = self
            .conn
            .query_row("SELECT id FROM employees WHERE id = ?1;", [id], |row| {
                row.get::<_, EmployeeId>(0)
            })
            .optional()?;
        Ok(found.is_some())
    }

    fn insert_employee(&self, employee: &NewEmployee) -> StoreResult<EmployeeId> {
        self.conn.execute(
            "INSERT INTO employees (name, email, employee_id, phone_number, manager_id)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                employee.name.as_str(),
                employee.email.as_str(),
                employee.employee_code.as_str(),
                employee.phone_number.as_str(),
                employee.manager_id,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn insert_department(
        &self,
        employee_id: EmployeeId,
        department_name: &str,
    ) -> StoreResult<()> {
        self.conn.execute(
            "INSERT INTO departments (employee_id, department_name)
             VALUES (?1, ?2);",
            params![employee_id, department_name],
        )?;
        Ok(())
    }

    fn update_employee(&self, id: EmployeeId, changes: &EmployeeChanges) -> StoreResult<usize> {
        let changed = self.conn.execute(
            "UPDATE employees
             SET name = ?1, email = ?2, phone_number = ?3, manager_id = ?4
             WHERE id = ?5;",
            params![
                changes.name.as_str(),
                changes.email.as_str(),
                changes.phone_number.as_str(),
                changes.manager_id,
                id,
            ],
        )?;
        Ok(changed)
    }

    fn update_departments(
        &self,
        employee_id: EmployeeId,
        department_name: &str,
    ) -> StoreResult<usize> {
        let changed = self.conn.execute(
            "UPDATE departments
             SET department_name = ?1
             WHERE employee_id = ?2;",
            params![department_name, employee_id],
        )?;
        Ok(changed)
    }

    fn delete_departments(&self, employee_id: EmployeeId) -> StoreResult<usize> {
        let changed = self.conn.execute(
            "DELETE FROM departments WHERE employee_id = ?1;",
            [employee_id],
        )?;
        Ok(changed)
    }

    fn delete_employee(&self, id: EmployeeId) -> StoreResult<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM employees WHERE id = ?1;", [id])?;
        Ok(changed)
    }

    fn list_records(&self) -> StoreResult<Vec<EmployeeRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RECORD_SELECT_SQL} ORDER BY e.id ASC, d.id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }
        Ok(records)
    }

    fn get_record(&self, id: EmployeeId) -> StoreResult<Option<EmployeeRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{RECORD_SELECT_SQL}
             WHERE e.id = ?1
             ORDER BY d.id ASC
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_record_row(row)?));
        }
        Ok(None)
    }
}

fn parse_record_row(row: &Row<'_>) -> StoreResult<EmployeeRecord> {
    Ok(EmployeeRecord {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        employee_code: row.get("employee_code")?,
        phone_number: row.get("phone_number")?,
        manager_id: row.get("manager_id")?,
        department_name: row.get("department_name")?,
    })
}

fn ensure_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &(table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(StoreError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(StoreError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
