use rusqlite::Connection;
use staffbook_core::db::migrations::latest_version;
use staffbook_core::db::open_db_in_memory;
use staffbook_core::{
    EmployeeChanges, EmployeeId, EmployeeReader, EmployeeService, EmployeeValidationError,
    EmployeeWriter, NewEmployee, ServiceError, SqliteEmployeeStore, StoreError, WriteError,
};

fn new_employee(name: &str, code: &str, manager_id: Option<EmployeeId>, dept: &str) -> NewEmployee {
    NewEmployee {
        name: name.to_string(),
        email: format!("{}@x.com", name.to_lowercase()),
        employee_code: code.to_string(),
        phone_number: "5551234567".to_string(),
        manager_id,
        department_name: dept.to_string(),
    }
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| row.get(0)).unwrap()
}

fn department_rows_for(conn: &Connection, id: EmployeeId) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM departments WHERE employee_id = ?1;",
        [id],
        |row| row.get(0),
    )
    .unwrap()
}

#[test]
fn create_chain_scenario_assigns_ids_and_rejects_unknown_manager() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEmployeeStore::try_new(&conn).unwrap();
    let service = EmployeeService::new(store);

    let ana = service
        .create(&new_employee("Ana", "E1", None, "Eng"))
        .unwrap();
    assert_eq!(ana, 1);

    let loaded = service.get(1).unwrap().expect("employee 1 should exist");
    assert_eq!(loaded.name, "Ana");
    assert_eq!(loaded.email, "ana@x.com");
    assert_eq!(loaded.employee_code, "E1");
    assert_eq!(loaded.phone_number, "5551234567");
    assert_eq!(loaded.manager_id, None);
    assert_eq!(loaded.department_name.as_deref(), Some("Eng"));

    let bo = service
        .create(&new_employee("Bo", "E2", Some(1), "Eng"))
        .unwrap();
    assert_eq!(bo, 2);
    assert_eq!(service.get(2).unwrap().unwrap().manager_id, Some(1));

    let err = service
        .create(&new_employee("Cy", "E3", Some(999), "Eng"))
        .unwrap_err();
    assert!(err.is_validation());
    assert!(matches!(
        err,
        ServiceError::Write(WriteError::ManagerNotFound(999))
    ));

    assert!(service.get(3).unwrap().is_none());
    assert_eq!(service.list_all().unwrap().len(), 2);
    assert_eq!(count(&conn, "departments"), 2);
}

#[test]
fn create_commits_employee_and_department_together() {
    let conn = open_db_in_memory().unwrap();
    let writer = EmployeeWriter::new(SqliteEmployeeStore::try_new(&conn).unwrap());

    let id = writer
        .create(&new_employee("Ana", "E1", None, "Eng"))
        .unwrap();

    assert_eq!(count(&conn, "employees"), 1);
    assert_eq!(department_rows_for(&conn, id), 1);
    assert!(conn.is_autocommit(), "transaction must not stay open");
}

#[test]
fn duplicate_employee_code_rolls_back_as_infra_error() {
    let conn = open_db_in_memory().unwrap();
    let writer = EmployeeWriter::new(SqliteEmployeeStore::try_new(&conn).unwrap());

    writer
        .create(&new_employee("Ana", "E1", None, "Eng"))
        .unwrap();
    let err = writer
        .create(&new_employee("Bo", "E1", None, "Ops"))
        .unwrap_err();

    assert!(err.is_infra());
    assert!(matches!(
        err,
        WriteError::Store {
            step: staffbook_core::WriteStep::InsertEmployee,
            ..
        }
    ));
    assert_eq!(count(&conn, "employees"), 1);
    assert_eq!(count(&conn, "departments"), 1);
    assert!(conn.is_autocommit());
}

#[test]
fn unknown_manager_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let writer = EmployeeWriter::new(SqliteEmployeeStore::try_new(&conn).unwrap());

    let err = writer
        .create(&new_employee("Cy", "E3", Some(7), "Eng"))
        .unwrap_err();

    assert!(matches!(err, WriteError::ManagerNotFound(7)));
    assert_eq!(count(&conn, "employees"), 0);
    assert_eq!(count(&conn, "departments"), 0);
    assert!(conn.is_autocommit());
}

#[test]
fn update_rewrites_employee_and_department() {
    let conn = open_db_in_memory().unwrap();
    let service = EmployeeService::new(SqliteEmployeeStore::try_new(&conn).unwrap());
    let ana = service
        .create(&new_employee("Ana", "E1", None, "Eng"))
        .unwrap();
    let bo = service
        .create(&new_employee("Bo", "E2", None, "Eng"))
        .unwrap();

    let changes = EmployeeChanges {
        name: "Bo Silva".to_string(),
        email: "bo.silva@x.com".to_string(),
        phone_number: "5559876543".to_string(),
        manager_id: Some(ana),
        department_name: "Ops".to_string(),
    };
    service.update(bo, &changes).unwrap();

    let loaded = service.get(bo).unwrap().unwrap();
    assert_eq!(loaded.name, "Bo Silva");
    assert_eq!(loaded.email, "bo.silva@x.com");
    assert_eq!(loaded.phone_number, "5559876543");
    assert_eq!(loaded.manager_id, Some(ana));
    assert_eq!(loaded.department_name.as_deref(), Some("Ops"));
    assert_eq!(loaded.employee_code, "E2", "external code is immutable");

    let untouched = service.get(ana).unwrap().unwrap();
    assert_eq!(untouched.department_name.as_deref(), Some("Eng"));
}

#[test]
fn update_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let service = EmployeeService::new(SqliteEmployeeStore::try_new(&conn).unwrap());
    let id = service
        .create(&new_employee("Ana", "E1", None, "Eng"))
        .unwrap();

    let changes = EmployeeChanges::from(&new_employee("Ana", "E1", None, "Research"));
    service.update(id, &changes).unwrap();
    let once = service.list_all().unwrap();
    service.update(id, &changes).unwrap();
    let twice = service.list_all().unwrap();

    assert_eq!(once, twice);
}

#[test]
fn update_of_unknown_id_is_a_silent_no_op() {
    let conn = open_db_in_memory().unwrap();
    let service = EmployeeService::new(SqliteEmployeeStore::try_new(&conn).unwrap());

    let changes = EmployeeChanges::from(&new_employee("Ghost", "E9", None, "Eng"));
    service.update(42, &changes).unwrap();

    assert!(service.get(42).unwrap().is_none());
    assert!(service.list_all().unwrap().is_empty());
    assert_eq!(count(&conn, "departments"), 0);
}

#[test]
fn update_does_not_check_manager_reference() {
    let conn = open_db_in_memory().unwrap();
    let service = EmployeeService::new(SqliteEmployeeStore::try_new(&conn).unwrap());
    let id = service
        .create(&new_employee("Ana", "E1", None, "Eng"))
        .unwrap();

    // Create rejects manager 999; update writes it as given.
    let changes = EmployeeChanges::from(&new_employee("Ana", "E1", Some(999), "Eng"));
    service.update(id, &changes).unwrap();

    assert_eq!(service.get(id).unwrap().unwrap().manager_id, Some(999));
}

#[test]
fn delete_removes_employee_and_assignment() {
    let conn = open_db_in_memory().unwrap();
    let service = EmployeeService::new(SqliteEmployeeStore::try_new(&conn).unwrap());
    let id = service
        .create(&new_employee("Ana", "E1", None, "Eng"))
        .unwrap();

    service.delete(id).unwrap();

    assert!(service.get(id).unwrap().is_none());
    assert_eq!(department_rows_for(&conn, id), 0);
    assert!(conn.is_autocommit());
}

#[test]
fn deleting_a_manager_leaves_reports_with_dangling_reference() {
    let conn = open_db_in_memory().unwrap();
    let service = EmployeeService::new(SqliteEmployeeStore::try_new(&conn).unwrap());
    let ana = service
        .create(&new_employee("Ana", "E1", None, "Eng"))
        .unwrap();
    let bo = service
        .create(&new_employee("Bo", "E2", Some(ana), "Eng"))
        .unwrap();

    service.delete(ana).unwrap();

    assert!(service.get(ana).unwrap().is_none());
    assert_eq!(department_rows_for(&conn, ana), 0);

    let report = service.get(bo).unwrap().unwrap();
    assert_eq!(report.manager_id, Some(ana));
    assert_eq!(report.department_name.as_deref(), Some("Eng"));
}

#[test]
fn delete_of_unknown_id_succeeds() {
    let conn = open_db_in_memory().unwrap();
    let service = EmployeeService::new(SqliteEmployeeStore::try_new(&conn).unwrap());

    service.delete(42).unwrap();
    assert!(service.list_all().unwrap().is_empty());
}

#[test]
fn delete_removes_every_assignment_row_of_the_employee() {
    let conn = open_db_in_memory().unwrap();
    let service = EmployeeService::new(SqliteEmployeeStore::try_new(&conn).unwrap());
    let id = service
        .create(&new_employee("Ana", "E1", None, "Eng"))
        .unwrap();
    conn.execute(
        "INSERT INTO departments (employee_id, department_name) VALUES (?1, 'Ops');",
        [id],
    )
    .unwrap();

    service.delete(id).unwrap();

    assert_eq!(count(&conn, "departments"), 0);
    assert_eq!(count(&conn, "employees"), 0);
}

#[test]
fn several_assignment_rows_project_and_rename_together() {
    let conn = open_db_in_memory().unwrap();
    let service = EmployeeService::new(SqliteEmployeeStore::try_new(&conn).unwrap());
    let id = service
        .create(&new_employee("Ana", "E1", None, "Eng"))
        .unwrap();
    conn.execute(
        "INSERT INTO departments (employee_id, department_name) VALUES (?1, 'Ops');",
        [id],
    )
    .unwrap();

    assert_eq!(
        service.get(id).unwrap().unwrap().department_name.as_deref(),
        Some("Eng")
    );
    let rows: Vec<_> = service
        .list_all()
        .unwrap()
        .into_iter()
        .filter(|record| record.id == id)
        .collect();
    assert_eq!(rows.len(), 2);

    let changes = EmployeeChanges::from(&new_employee("Ana", "E1", None, "Research"));
    service.update(id, &changes).unwrap();

    let mut stmt = conn
        .prepare("SELECT department_name FROM departments WHERE employee_id = ?1 ORDER BY id;")
        .unwrap();
    let names: Vec<String> = stmt
        .query_map([id], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(names, ["Research", "Research"]);
}

#[test]
fn reads_include_employees_without_assignment() {
    let conn = open_db_in_memory().unwrap();
    let service = EmployeeService::new(SqliteEmployeeStore::try_new(&conn).unwrap());
    let ana = service
        .create(&new_employee("Ana", "E1", None, "Eng"))
        .unwrap();
    conn.execute(
        "INSERT INTO employees (name, email, employee_id, phone_number)
         VALUES ('Lone', 'lone@x.com', 'E7', '5550000000');",
        [],
    )
    .unwrap();
    let lone = conn.last_insert_rowid();

    let mut all = service.list_all().unwrap();
    all.sort_by_key(|record| record.id);
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, ana);
    assert_eq!(all[1].id, lone);
    assert_eq!(all[1].department_name, None);

    let single = service.get(lone).unwrap().unwrap();
    assert_eq!(single.employee_code, "E7");
    assert_eq!(single.department_name, None);
}

#[test]
fn reader_works_directly_over_store() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEmployeeStore::try_new(&conn).unwrap();
    let writer = EmployeeWriter::new(&store);
    let reader = EmployeeReader::new(&store);

    let id = writer
        .create(&new_employee("Ana", "E1", None, "Eng"))
        .unwrap();

    assert_eq!(reader.get(id).unwrap().unwrap().id, id);
    assert!(reader.get(id + 1).unwrap().is_none());
    assert_eq!(reader.list_all().unwrap().len(), 1);
}

#[test]
fn service_rejects_malformed_fields_before_storage() {
    let conn = open_db_in_memory().unwrap();
    let service = EmployeeService::new(SqliteEmployeeStore::try_new(&conn).unwrap());

    let mut input = new_employee("Ana", "E1", None, "Eng");
    input.phone_number = "12ab".to_string();
    let err = service.create(&input).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(EmployeeValidationError::InvalidPhoneNumber)
    ));
    assert!(err.is_validation());
    assert_eq!(count(&conn, "employees"), 0);

    let id = service
        .create(&new_employee("Ana", "E1", None, "Eng"))
        .unwrap();
    let mut changes = EmployeeChanges::from(&new_employee("Ana", "E1", None, "Eng"));
    changes.email = "not-an-email".to_string();
    let err = service.update(id, &changes).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(EmployeeValidationError::InvalidEmail)
    ));
    assert_eq!(service.get(id).unwrap().unwrap().email, "ana@x.com");
}

#[test]
fn record_serializes_with_external_field_names() {
    let conn = open_db_in_memory().unwrap();
    let service = EmployeeService::new(SqliteEmployeeStore::try_new(&conn).unwrap());
    let id = service
        .create(&new_employee("Ana", "E1", None, "Eng"))
        .unwrap();

    let record = service.get(id).unwrap().unwrap();
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["id"], 1);
    assert_eq!(value["employee_id"], "E1");
    assert_eq!(value["department_name"], "Eng");
    assert!(value["manager_id"].is_null());
}

#[test]
fn new_employee_deserializes_without_manager() {
    let input: NewEmployee = serde_json::from_str(
        r#"{
            "name": "Ana",
            "email": "ana@x.com",
            "employee_id": "E1",
            "phone_number": "5551234567",
            "department_name": "Eng"
        }"#,
    )
    .unwrap();
    assert_eq!(input.employee_code, "E1");
    assert_eq!(input.manager_id, None);
}

#[test]
fn store_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteEmployeeStore::try_new(&conn) {
        Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn store_rejects_connection_without_departments_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE employees (
            id INTEGER PRIMARY KEY,
            name TEXT,
            email TEXT,
            employee_id TEXT,
            phone_number TEXT,
            manager_id INTEGER
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteEmployeeStore::try_new(&conn),
        Err(StoreError::MissingRequiredTable("departments"))
    ));
}

#[test]
fn store_rejects_connection_missing_manager_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE employees (
            id INTEGER PRIMARY KEY,
            name TEXT,
            email TEXT,
            employee_id TEXT,
            phone_number TEXT
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteEmployeeStore::try_new(&conn),
        Err(StoreError::MissingRequiredColumn {
            table: "employees",
            column: "manager_id"
        })
    ));
}
