//! Query transcript and tracing output.

use liteqb::prelude::*;
use liteqb::{QueryRecord, QueryType};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

fn db(config: DatabaseConfig) -> Database {
    let db = Database::open_in_memory(config).unwrap();
    db.table("users").create(["id INTEGER PRIMARY KEY", "name TEXT"]).unwrap();
    // Warm the schema cache so only builder statements are recorded below.
    db.table("users").columns().unwrap();
    db
}

#[test]
fn nothing_is_recorded_until_listening() {
    let db = db(DatabaseConfig::default());
    db.table("users").insert_row([("name", "Ann")]).unwrap();
    assert!(db.queries().is_empty());
    assert!(db.table("users").queries().is_empty());
}

#[test]
fn records_executed_sql_per_table() {
    let db = db(DatabaseConfig::default());
    db.queries().listen(true);

    db.table("users").insert_row([("name", "Ann")]).unwrap();
    db.table("users").select("*").where_eq("id", 1).unwrap().rows().unwrap();
    db.exec("CREATE TABLE other (a)").unwrap();

    let records = db.table("users").queries();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].sql, "INSERT INTO users (name) VALUES (:name0)");
    assert_eq!(records[0].query_type(), QueryType::Insert);
    assert_eq!(records[1].sql, "SELECT * FROM users WHERE id = :id0");

    let all = db.queries().records();
    assert_eq!(all.len(), 3);
    assert_eq!(all[2].table, None);
    assert_eq!(all[2].query_type(), QueryType::Other);
    assert!(db.queries().total_duration() >= records[0].duration);

    db.queries().clear();
    assert!(db.queries().is_empty());
}

#[test]
fn failed_statements_are_recorded_too() {
    let db = db(DatabaseConfig::new().record_queries());
    assert!(db.queries().is_listening());
    db.queries().clear();

    let _ = db.exec("NOT SQL AT ALL");
    assert_eq!(db.queries().len(), 1);
    assert_eq!(db.queries().last().unwrap().sql, "NOT SQL AT ALL");
}

#[test]
fn listener_is_called_per_statement() {
    let db = db(DatabaseConfig::default());
    let seen: Rc<RefCell<Vec<QueryRecord>>> = Rc::default();
    let sink = Rc::clone(&seen);
    db.queries()
        .listen_with(move |record| sink.borrow_mut().push(record.clone()));

    db.table("users").delete().where_eq("id", 7).unwrap().rows().unwrap();
    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].table.as_deref(), Some("users"));
    assert_eq!(seen[0].query_type(), QueryType::Delete);
}

#[test]
fn tracing_subscriber_sees_sql_events() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("liteqb=trace"))
        .with_test_writer()
        .try_init();

    let db = db(DatabaseConfig::new().slow_query_threshold(Duration::ZERO));
    let mut qb = db.table("users").select("*").where_eq("id", 1).unwrap();
    assert!(qb.rows().unwrap().is_empty());
    assert!(db.exec("SELECT * FROM missing").is_err());
}
