//! SELECT execution against an in-memory database.

use liteqb::prelude::*;
use liteqb::{QueryType, ResultCursor};

fn seeded() -> Database {
    let db = Database::open_in_memory(DatabaseConfig::default()).unwrap();
    db.exec(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, age INTEGER, status TEXT);
         INSERT INTO users (id, name, age, status) VALUES
            (1, 'Ann', 31, 'active'),
            (2, 'Bob', 17, 'active'),
            (3, 'Cid', 45, 'banned'),
            (4, 'Dee', 12, 'pending'),
            (5, 'Eve', 22, 'pending');
         CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER, total REAL, status TEXT);
         INSERT INTO orders (user_id, total, status) VALUES
            (1, 10.5, 'paid'), (1, 99.5, 'paid'), (3, 5.0, 'open'), (5, 42.0, 'paid');",
    )
    .unwrap();
    db
}

fn ids(rows: &[Row]) -> Vec<i64> {
    rows.iter().map(|r| r.try_get::<i64>("id").unwrap()).collect()
}

#[test]
fn where_or_order_limit() {
    let db = seeded();
    let mut qb = db
        .table("users")
        .select("*")
        .and_where("age", ">", 18)
        .unwrap()
        .or_where_eq("status", "active")
        .unwrap()
        .order_by("id", SortDir::Asc)
        .limit(10);

    assert_eq!(qb.sql(), None);
    let rows = qb.rows().unwrap();
    assert_eq!(ids(&rows), vec![1, 2, 3, 5]);
    assert_eq!(
        qb.sql(),
        Some("SELECT * FROM users WHERE age > :age0 OR status = :status0 ORDER BY id ASC LIMIT 10")
    );
    assert!(qb.execution_time().is_some());
}

#[test]
fn second_execution_is_rejected() {
    let db = seeded();
    let mut qb = db.table("users").select("id");
    qb.rows().unwrap();
    let err = qb.rows().unwrap_err();
    assert!(matches!(err, QbError::StatementAlreadyExecuted(sql) if sql == "SELECT id FROM users"));
}

#[test]
fn row_and_row_value() {
    let db = seeded();
    let row = db
        .table("users")
        .select("name, age")
        .where_eq("id", 3)
        .unwrap()
        .row()
        .unwrap()
        .unwrap();
    assert_eq!(row.try_get::<String>("name").unwrap(), "Cid");
    assert_eq!(row.columns(), ["name".to_string(), "age".to_string()]);

    let name = db
        .table("users")
        .select("name")
        .where_eq("id", 5)
        .unwrap()
        .row_value("name")
        .unwrap();
    assert_eq!(name, Some(Value::Text("Eve".into())));

    let missing = db
        .table("users")
        .select("name")
        .where_eq("id", 99)
        .unwrap()
        .row_value("name")
        .unwrap();
    assert_eq!(missing, None);

    let err = db
        .table("users")
        .select("name")
        .row_value("age")
        .unwrap_err();
    assert!(matches!(err, QbError::ColumnNotFound(c) if c == "age"));
}

#[test]
fn count_leaves_builder_runnable() {
    let db = seeded();
    let mut qb = db
        .table("users")
        .select("id")
        .and_where("status", "!=", "banned")
        .unwrap()
        .order_by_desc("id")
        .limit(2)
        .offset(1);

    assert_eq!(qb.count().unwrap(), 4);
    assert_eq!(qb.count().unwrap(), 4);
    assert_eq!(ids(&qb.rows().unwrap()), vec![4, 2]);
    // Counting still works after the builder itself has run.
    assert_eq!(qb.count().unwrap(), 4);
}

#[test]
fn in_between_like_null() {
    let db = seeded();
    db.exec("UPDATE users SET status = NULL WHERE id = 4").unwrap();

    let rows = db.table("users").select("id").where_in("id", [1, 3, 5]).unwrap().rows().unwrap();
    assert_eq!(ids(&rows), vec![1, 3, 5]);

    let rows = db
        .table("users")
        .select("id")
        .and_where("age", "NOT BETWEEN", vec![18, 40])
        .unwrap()
        .order_by_asc("id")
        .rows()
        .unwrap();
    assert_eq!(ids(&rows), vec![2, 3, 4]);

    let rows = db.table("users").select("id").where_like("name", "%e%").unwrap().rows().unwrap();
    assert_eq!(ids(&rows), vec![4, 5]);

    let rows = db.table("users").select("id").where_null("status").unwrap().rows().unwrap();
    assert_eq!(ids(&rows), vec![4]);

    let rows = db
        .table("users")
        .select("id")
        .and_where("name", "GLOB", "[AB]*")
        .unwrap()
        .rows()
        .unwrap();
    assert_eq!(ids(&rows), vec![1, 2]);
}

#[test]
fn empty_in_list_matches_nothing() {
    let db = seeded();
    let rows = db
        .table("users")
        .select("id")
        .where_in("id", Vec::<i64>::new())
        .unwrap()
        .rows()
        .unwrap();
    assert!(rows.is_empty());
}

#[test]
fn join_with_alias_and_grouping() {
    let db = seeded();
    let mut qb = db
        .table("users")
        .select("u.name, SUM(o.total) AS spent")
        .short("u")
        .inner_join("orders o", "o.user_id = u.id")
        .where_eq("o.status", "paid")
        .unwrap()
        .group_by("u.name")
        .having("SUM(o.total)", ">", 50)
        .unwrap()
        .order_by_asc("u.name");

    let rows = qb.rows().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].try_get::<String>("name").unwrap(), "Ann");
    assert_eq!(rows[0].try_get::<f64>("spent").unwrap(), 110.0);
}

#[test]
fn unknown_qualifier_fails_before_running() {
    let db = seeded();
    db.queries().listen(true);
    let err = db
        .table("users")
        .select("*")
        .where_eq("x.id", 1)
        .unwrap()
        .rows()
        .unwrap_err();
    assert!(matches!(err, QbError::UnknownTable(q) if q == "x"));
    assert!(db.queries().for_table("users").is_empty());
}

#[test]
fn missing_table_is_an_engine_error() {
    let db = seeded();
    let err = db.table("nope").select("*").where_eq("id", 1).unwrap().rows().unwrap_err();
    assert!(err.is_engine_error());
    assert_eq!(err.engine_code(), Some(1));
    assert!(err.to_string().contains("no such table"));
}

#[test]
fn cursor_access_and_finalize() {
    let db = seeded();
    let mut cursor: ResultCursor = db.table("users").select("id, name").cursor().unwrap();
    assert_eq!(cursor.num_columns(), 2);
    assert_eq!(cursor.count().unwrap(), 5);

    let first = cursor.next_row().unwrap().unwrap();
    assert_eq!(first.try_get::<i64>("id").unwrap(), 1);
    assert_eq!(cursor.get_rows().unwrap().len(), 4);

    cursor.finalize();
    assert!(cursor.is_finalized());
    assert!(matches!(cursor.next_row(), Err(QbError::ResultAlreadyFinalized)));
}

#[derive(Debug, PartialEq)]
struct User {
    id: i64,
    name: String,
    age: Option<i64>,
}

impl FromRow for User {
    fn from_row(row: &Row) -> QbResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            age: row.try_get("age")?,
        })
    }
}

#[test]
fn fetch_into_structs() {
    let db = seeded();
    let users: Vec<User> = db
        .table("users")
        .select("id, name, age")
        .and_where("id", "<=", 2)
        .unwrap()
        .fetch_all()
        .unwrap();
    assert_eq!(
        users,
        vec![
            User { id: 1, name: "Ann".into(), age: Some(31) },
            User { id: 2, name: "Bob".into(), age: Some(17) },
        ]
    );

    let none: Option<User> = db
        .table("users")
        .select("id, name, age")
        .where_eq("name", "Zed")
        .unwrap()
        .fetch_optional()
        .unwrap();
    assert!(none.is_none());
}

#[test]
fn rows_serialize_as_objects() {
    let db = seeded();
    let rows = db.table("users").select("id, name").where_eq("id", 1).unwrap().rows().unwrap();
    let json = serde_json::to_value(&rows).unwrap();
    assert_eq!(json, serde_json::json!([{ "id": 1, "name": "Ann" }]));
}

#[test]
fn raw_query_returns_cursor() {
    let db = seeded();
    let mut cursor = db.query("SELECT COUNT(*) AS n FROM orders").unwrap();
    let rows = cursor.get_rows().unwrap();
    assert_eq!(rows[0].try_get::<i64>("n").unwrap(), 4);
    assert_eq!(QueryType::from_sql("SELECT 1"), QueryType::Select);
}

#[test]
fn grouped_count_is_per_group() {
    let db = seeded();
    let mut qb = db
        .table("users")
        .select("status")
        .and_where("age", ">", 20)
        .unwrap()
        .group_by("status");
    // Ann, Cid and Eve each sit alone in their status group.
    assert_eq!(qb.count().unwrap(), 1);
    assert_eq!(qb.rows().unwrap().len(), 3);
}
