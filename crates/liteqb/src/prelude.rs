//! Convenient imports for typical `liteqb` usage.
//!
//! ```ignore
//! use liteqb::prelude::*;
//! ```

pub use crate::{
    Database, DatabaseConfig, FilterQb, FromRow, InsertOutcome, JoinKind, QbError, QbResult, Row,
    SortDir, SqlQb, Table, Value,
};
