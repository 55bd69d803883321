//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `staffbook_core` linkage without any other runtime.
//! - With a database path argument, open (and migrate) that database and
//!   print every employee record as one JSON line.

use staffbook_core::db::open_db;
use staffbook_core::{EmployeeService, SqliteEmployeeStore};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("staffbook_core ping={}", staffbook_core::ping());
    println!("staffbook_core version={}", staffbook_core::core_version());

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    match dump_employees(&db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("staffbook_cli: {err}");
            ExitCode::FAILURE
        }
    }
}

fn dump_employees(db_path: &str) -> Result<(), Box<dyn Error>> {
    let conn = open_db(db_path)?;
    let service = EmployeeService::new(SqliteEmployeeStore::try_new(&conn)?);
    for record in service.list_all()? {
        println!("{}", serde_json::to_string(&record)?);
    }
    Ok(())
}
