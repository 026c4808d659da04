//! # liteqb
//!
//! A fluent SQL statement builder for SQLite.
//!
//! ## Features
//!
//! - **Named placeholders**: every bound value gets a readable, collision-free
//!   name (`:age0`, `:uid1`) and is never spliced into SQL text
//! - **Schema-aware binding**: values bind with the column's storage type,
//!   from an explicit override, the declared schema type, or the value itself
//! - **One statement, one run**: builders render without side effects and
//!   execute exactly once
//! - **Query transcript**: executed SQL and timings are recorded on demand and
//!   traced on target `liteqb::sql`
//!
//! ## Usage
//!
//! ```ignore
//! use liteqb::prelude::*;
//!
//! let db = Database::open("app.db", DatabaseConfig::default())?;
//! let users = db.table("users");
//!
//! // SELECT
//! let adults = users
//!     .select("*")
//!     .and_where("age", ">", 18)?
//!     .or_where_eq("status", "active")?
//!     .order_by("id", SortDir::Asc)
//!     .limit(10)
//!     .rows()?;
//!
//! // INSERT
//! let id = users
//!     .insert_row([("name", Value::from("Ann")), ("age", Value::from(31))])?
//!     .row_id();
//!
//! // UPDATE
//! users.update(["name"])?.set(["Bob"])?.where_eq("id", 5)?.rows()?;
//!
//! // DELETE
//! users.delete().where_eq("id", 5)?.rows()?;
//! ```

pub mod condition;
pub mod config;
pub mod cursor;
pub mod database;
pub mod error;
mod execute;
pub mod monitor;
pub mod prelude;
pub mod qb;
pub mod row;
pub mod table;
pub mod value;

pub use condition::{Arg, BoolOp, Operator};
pub use config::{DatabaseConfig, JournalMode, Synchronous, TransactionKind};
pub use cursor::ResultCursor;
pub use database::Database;
pub use error::{QbError, QbResult};
pub use monitor::{QueryLog, QueryRecord, QueryType};
pub use row::{FromRow, Row};
pub use table::{ColumnInfo, Table, TableRegistry};
pub use value::{FromValue, StorageType, Value};

// Re-export qb builders for easy access
pub use qb::{
    ConflictPolicy, DeleteQb, FilterQb, InsertOutcome, InsertQb, IntoColumns, JoinKind, SelectQb,
    SortDir, SqlQb, UpdateQb,
};
