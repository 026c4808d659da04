//! WHERE/HAVING clause assembly.
//!
//! A clause set is an append-only list of [`Clause`]s. Each clause carries the
//! boolean prefix it was added with (`None` for the first clause of a set) and a
//! [`Predicate`] whose placeholders were reserved from the statement's
//! [`ParameterBinder`] when it was added. Text is produced only by
//! [`ClauseSet::render`].

use crate::error::{QbError, QbResult};
use crate::qb::ParameterBinder;
use crate::value::Value;
use std::fmt;

/// Condition operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
    Glob,
    NotGlob,
    Between,
    NotBetween,
    In,
    NotIn,
    Is,
    IsNot,
}

/// How many placeholders an operator takes and how its fragment is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorFamily {
    /// `col OP :ph`
    Single,
    /// `col OP :ph1 AND :ph2`
    Range,
    /// `col OP (:ph0,:ph1,...)`
    List,
    /// `col OP NULL`
    Null,
}

impl Operator {
    /// Parse an operator string (case and inner whitespace insensitive).
    pub fn parse(op: &str) -> Option<Self> {
        let normalized = op.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_uppercase();
        let parsed = match normalized.as_str() {
            "=" => Self::Eq,
            "!=" => Self::Ne,
            ">" => Self::Gt,
            ">=" => Self::Gte,
            "<" => Self::Lt,
            "<=" => Self::Lte,
            "LIKE" => Self::Like,
            "NOT LIKE" => Self::NotLike,
            "GLOB" => Self::Glob,
            "NOT GLOB" => Self::NotGlob,
            "BETWEEN" => Self::Between,
            "NOT BETWEEN" => Self::NotBetween,
            "IN" => Self::In,
            "NOT IN" => Self::NotIn,
            "IS" => Self::Is,
            "IS NOT" => Self::IsNot,
            _ => return None,
        };
        Some(parsed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::Glob => "GLOB",
            Self::NotGlob => "NOT GLOB",
            Self::Between => "BETWEEN",
            Self::NotBetween => "NOT BETWEEN",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Is => "IS",
            Self::IsNot => "IS NOT",
        }
    }

    pub fn family(self) -> OperatorFamily {
        match self {
            Self::Eq
            | Self::Ne
            | Self::Gt
            | Self::Gte
            | Self::Lt
            | Self::Lte
            | Self::Like
            | Self::NotLike
            | Self::Glob
            | Self::NotGlob => OperatorFamily::Single,
            Self::Between | Self::NotBetween => OperatorFamily::Range,
            Self::In | Self::NotIn => OperatorFamily::List,
            Self::Is | Self::IsNot => OperatorFamily::Null,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean prefix joining a clause to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
}

impl BoolOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// Operand of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// No bind value: the column string is a complete predicate and is used verbatim.
    Absent,
    Value(Value),
    List(Vec<Value>),
}

impl From<Value> for Arg {
    fn from(v: Value) -> Self {
        Arg::Value(v)
    }
}

macro_rules! impl_arg_from_scalar {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Arg {
                fn from(v: $t) -> Self {
                    Arg::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_arg_from_scalar!(i8, i16, i32, i64, u8, u16, u32, bool, f32, f64, &str, String, &String);

impl<T: Into<Value>> From<Option<T>> for Arg {
    fn from(v: Option<T>) -> Self {
        Arg::Value(Value::from(v))
    }
}

/// Sequences become list operands. Bind a blob with `Value::Blob`.
impl<T: Into<Value>> From<Vec<T>> for Arg {
    fn from(v: Vec<T>) -> Self {
        Arg::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Arg {
    fn from(v: [T; N]) -> Self {
        Arg::List(v.into_iter().map(Into::into).collect())
    }
}

/// A single predicate, already bound to its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Caller-supplied expression, rendered verbatim.
    Raw(String),
    Compare {
        column: String,
        op: Operator,
        placeholders: Vec<String>,
    },
}

impl Predicate {
    pub fn render(&self) -> String {
        match self {
            Predicate::Raw(sql) => sql.clone(),
            Predicate::Compare {
                column,
                op,
                placeholders,
            } => match op.family() {
                OperatorFamily::Single => format!("{column} {op} {}", placeholders[0]),
                OperatorFamily::Range => {
                    format!("{column} {op} {} AND {}", placeholders[0], placeholders[1])
                }
                OperatorFamily::List => format!("{column} {op} ({})", placeholders.join(",")),
                OperatorFamily::Null => format!("{column} {op} NULL"),
            },
        }
    }
}

/// A predicate plus the boolean prefix it was added with.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub prefix: Option<BoolOp>,
    pub predicate: Predicate,
}

impl Clause {
    pub fn render(&self) -> String {
        match self.prefix {
            Some(prefix) => format!("{} {}", prefix.as_str(), self.predicate.render()),
            None => self.predicate.render(),
        }
    }
}

/// Ordered WHERE or HAVING clause list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClauseSet {
    clauses: Vec<Clause>,
}

impl ClauseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a predicate. The first predicate of a set is stored without a prefix.
    pub fn push(&mut self, prefix: BoolOp, predicate: Predicate) {
        let prefix = if self.clauses.is_empty() {
            None
        } else {
            Some(prefix)
        };
        self.clauses.push(Clause { prefix, predicate });
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Clauses joined by single spaces, without the `WHERE`/`HAVING` keyword.
    pub fn render(&self) -> String {
        self.clauses
            .iter()
            .map(Clause::render)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Which clause set a condition targets. Used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseKind {
    Where,
    Having,
}

impl ClauseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Where => "where",
            Self::Having => "having",
        }
    }
}

/// Dispatches conditions by operator family into a clause set, reserving
/// placeholders from the statement's binder.
pub struct ConditionBuilder<'a> {
    clauses: &'a mut ClauseSet,
    binder: &'a mut ParameterBinder,
    kind: ClauseKind,
}

impl<'a> ConditionBuilder<'a> {
    pub fn new(clauses: &'a mut ClauseSet, binder: &'a mut ParameterBinder, kind: ClauseKind) -> Self {
        Self {
            clauses,
            binder,
            kind,
        }
    }

    /// Parse `op` and add the condition.
    ///
    /// [`Arg::Absent`] short-circuits to a raw predicate before the operator is
    /// looked at. Unknown operators fail with [`QbError::InvalidOperator`].
    pub fn add_condition(self, column: &str, arg: Arg, op: &str, prefix: BoolOp) -> QbResult<()> {
        if arg == Arg::Absent {
            self.clauses.push(prefix, Predicate::Raw(column.to_string()));
            return Ok(());
        }
        let parsed = Operator::parse(op)
            .ok_or_else(|| QbError::invalid_operator(self.kind.as_str(), op.trim(), column))?;
        self.add(column, arg, parsed, prefix)
    }

    /// Add a condition with an already parsed operator.
    ///
    /// Operands are checked against the operator family before any placeholder
    /// is reserved, so a rejected condition leaves the statement untouched.
    pub fn add(self, column: &str, arg: Arg, op: Operator, prefix: BoolOp) -> QbResult<()> {
        let values = match (op.family(), arg) {
            (_, Arg::Absent) => {
                self.clauses.push(prefix, Predicate::Raw(column.to_string()));
                return Ok(());
            }
            (OperatorFamily::Null, _) => Vec::new(),
            (OperatorFamily::Single, Arg::Value(v)) => vec![v],
            (OperatorFamily::Single, Arg::List(_)) => {
                return Err(QbError::validation(format!(
                    "{} operator {op} for column {column} takes a single value, got a list",
                    self.kind.as_str()
                )));
            }
            (OperatorFamily::Range, Arg::List(values)) if values.len() == 2 => values,
            (OperatorFamily::Range, _) => {
                return Err(QbError::validation(format!(
                    "{} operator {op} for column {column} takes exactly 2 values",
                    self.kind.as_str()
                )));
            }
            (OperatorFamily::List, Arg::List(values)) => values,
            (OperatorFamily::List, Arg::Value(v)) => vec![v],
        };

        let placeholders = values
            .into_iter()
            .map(|value| self.binder.bind(column, value))
            .collect();
        self.clauses.push(
            prefix,
            Predicate::Compare {
                column: column.to_string(),
                op,
                placeholders,
            },
        );
        Ok(())
    }
}
