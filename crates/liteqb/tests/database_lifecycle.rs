//! Opening, creating, introspecting and transactions.

use liteqb::prelude::*;
use liteqb::{JournalMode, TransactionKind};
use std::time::Duration;

#[test]
fn create_open_and_reopen_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("app.db");

    assert!(!Database::file_exists(&path));
    Database::create(&path).unwrap();
    assert!(Database::file_exists(&path));
    assert!(Database::exists(&path));
    assert!(matches!(Database::create(&path), Err(QbError::Io(_))));

    {
        let db = Database::open(&path, DatabaseConfig::default()).unwrap();
        db.table("notes").create(["id INTEGER PRIMARY KEY", "body TEXT"]).unwrap();
        db.table("notes").insert_row([("body", "hello")]).unwrap();
        db.close().unwrap();
    }

    let db = Database::open(&path, DatabaseConfig::default()).unwrap();
    assert_eq!(db.name(), path.display().to_string());
    assert_eq!(db.table("notes").select("*").count().unwrap(), 1);
}

#[test]
fn exists_rejects_non_database_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.txt");
    std::fs::write(&path, "definitely not sqlite, just some text that is long enough").unwrap();
    assert!(Database::file_exists(&path));
    assert!(!Database::exists(&path));
    assert!(!Database::exists(dir.path().join("missing.db")));
}

#[test]
fn open_without_create_fails_for_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Database::open(
        dir.path().join("missing.db"),
        DatabaseConfig::new().create(false),
    )
    .unwrap_err();
    assert!(err.is_engine_error());
}

#[test]
fn read_only_rejects_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ro.db");
    {
        let db = Database::open(&path, DatabaseConfig::new().journal_mode(JournalMode::Delete)).unwrap();
        db.exec("CREATE TABLE t (a INTEGER)").unwrap();
    }

    let db = Database::open(&path, DatabaseConfig::new().read_only()).unwrap();
    assert_eq!(db.table("t").select("*").count().unwrap(), 0);
    let err = db.table("t").insert("a").unwrap().row([1]).unwrap_err();
    // SQLITE_READONLY
    assert_eq!(err.engine_code().map(|c| c & 0xff), Some(8));
}

#[test]
fn pragma_and_config_are_applied() {
    let db = Database::open_in_memory(
        DatabaseConfig::new().busy_timeout(Duration::from_millis(250)),
    )
    .unwrap();
    db.pragma("foreign_keys", "ON").unwrap();
    let mut cursor = db.query("PRAGMA foreign_keys").unwrap();
    let rows = cursor.get_rows().unwrap();
    assert_eq!(rows[0].try_get::<i64>("foreign_keys").unwrap(), 1);
    assert_eq!(db.config().busy_timeout, Duration::from_millis(250));
}

#[test]
fn lists_user_tables() {
    let db = Database::open_in_memory(DatabaseConfig::default()).unwrap();
    db.exec(
        "CREATE TABLE zebra (id INTEGER PRIMARY KEY AUTOINCREMENT);
         CREATE TABLE apple (id INTEGER);",
    )
    .unwrap();
    let names: Vec<String> = db
        .tables()
        .unwrap()
        .iter()
        .map(|row| row.try_get("name").unwrap())
        .collect();
    // AUTOINCREMENT creates sqlite_sequence, which is filtered out.
    assert_eq!(names, vec!["apple".to_string(), "zebra".to_string()]);

    let info = db.table("apple").info().unwrap().unwrap();
    assert_eq!(info.try_get::<String>("tbl_name").unwrap(), "apple");
    assert!(db.table("apple").exists().unwrap());
    assert!(!db.table("pear").exists().unwrap());
}

#[test]
fn table_columns_from_schema() {
    let db = Database::open_in_memory(DatabaseConfig::default()).unwrap();
    db.exec("CREATE TABLE t (id INTEGER PRIMARY KEY, name VARCHAR(20) NOT NULL DEFAULT 'x', misc)")
        .unwrap();
    let t = db.table("t");
    let columns = t.columns().unwrap();
    assert_eq!(columns.len(), 3);

    let name = t.column("name").unwrap().unwrap();
    assert_eq!(name.declared_type, "VARCHAR(20)");
    assert!(name.not_null);
    assert_eq!(name.default_value.as_deref(), Some("'x'"));
    assert_eq!(name.storage_type(), Some(liteqb::StorageType::Text));
    assert_eq!(t.column("misc").unwrap().unwrap().storage_type(), None);
    assert!(t.column("absent").unwrap().is_none());
}

#[test]
fn transaction_rollback_and_commit() {
    let db = Database::open_in_memory(DatabaseConfig::default()).unwrap();
    db.table("t").create(["a INTEGER"]).unwrap();

    db.transaction_begin(TransactionKind::Immediate, None).unwrap();
    assert!(!db.is_autocommit());
    db.table("t").insert_row([("a", 1)]).unwrap();
    db.transaction_rollback(None).unwrap();
    assert!(db.is_autocommit());
    assert_eq!(db.table("t").select("*").count().unwrap(), 0);

    db.transaction_begin(TransactionKind::Deferred, Some("batch")).unwrap();
    db.table("t").insert("a").unwrap().rows([[1], [2]]).unwrap();
    db.transaction_commit(Some("batch")).unwrap();
    assert_eq!(db.table("t").select("*").count().unwrap(), 2);

    db.transaction_begin(TransactionKind::Exclusive, None).unwrap();
    db.table("t").delete().rows().unwrap();
    db.transaction_end(None).unwrap();
    assert_eq!(db.table("t").select("*").count().unwrap(), 0);
}

#[test]
fn commit_without_transaction_is_an_engine_error() {
    let db = Database::open_in_memory(DatabaseConfig::default()).unwrap();
    let err = db.transaction_commit(None).unwrap_err();
    assert!(err.is_engine_error());
}

#[test]
fn syntax_errors_keep_engine_code_and_message() {
    let db = Database::open_in_memory(DatabaseConfig::default()).unwrap();
    let err = db.query("SELEC 1").unwrap_err();
    // SQLITE_ERROR
    assert_eq!(err.engine_code(), Some(1));
    match err {
        QbError::Engine { message, .. } => {
            assert_eq!(message, "near \"SELEC\": syntax error");
        }
        other => panic!("expected an engine error, got {other:?}"),
    }
}

#[test]
fn single_returns_first_value_or_row() {
    let db = Database::open_in_memory(DatabaseConfig::default()).unwrap();
    db.table("t").create(["a INTEGER", "b TEXT"]).unwrap();
    db.exec("INSERT INTO t VALUES (1, 'one'), (2, 'two')").unwrap();
    db.queries().listen(true);

    assert_eq!(
        db.single("SELECT a FROM t ORDER BY a DESC").unwrap(),
        Some(Value::Integer(2))
    );
    assert_eq!(db.single("SELECT a FROM t WHERE a > 5").unwrap(), None);

    let row = db.single_row("SELECT a, b FROM t ORDER BY a").unwrap().unwrap();
    assert_eq!(row.columns(), ["a".to_string(), "b".to_string()]);
    assert_eq!(row.try_get::<String>("b").unwrap(), "one");

    assert_eq!(db.queries().len(), 3);
    assert!(db.single("SELECT nope FROM t").unwrap_err().is_engine_error());
}
