//! Statement builders.
//!
//! Every builder is created from a [`Table`](crate::Table) and renders SQL with
//! named placeholders (`:age0`, `:status0`, ...). Values are recorded as they
//! are added and bound by name at execution, each with the storage type
//! resolved for its column (see [`resolve`]).
//!
//! # Usage
//!
//! ```ignore
//! use liteqb::prelude::*;
//!
//! let users = db.table("users");
//!
//! // SELECT
//! let rows = users
//!     .select("id, name")
//!     .and_where("age", ">", 18)?
//!     .order_by_desc("id")
//!     .limit(20)
//!     .rows()?;
//!
//! // INSERT
//! let outcome = users.insert("name, age")?.row([Value::from("alice"), Value::from(30)])?;
//!
//! // UPDATE
//! let changed = users.update("name")?.set(["bob"])?.where_eq("id", 5)?.rows()?;
//!
//! // DELETE
//! let deleted = users.delete().and_where("age", "<", 18)?.rows()?;
//! ```
//!
//! Terminal methods (`rows`, `row`, `cursor`, `execute`, ...) run the
//! statement once; calling another terminal on the same builder fails with
//! [`QbError::StatementAlreadyExecuted`](crate::QbError::StatementAlreadyExecuted).

mod delete;
mod insert;
mod param;
pub mod resolve;
mod select;
mod stmt;
mod traits;
mod update;


pub use delete::DeleteQb;
pub use insert::{ConflictPolicy, InsertOutcome, InsertQb};
pub use param::{BoundParam, ParameterBinder};
pub use resolve::{AliasMap, TypeResolver, resolve_storage_type};
pub use select::{JoinKind, SelectQb};
pub use stmt::{ClauseState, FilterQb, IntoColumns, SortDir};
pub use traits::SqlQb;
pub use update::UpdateQb;
