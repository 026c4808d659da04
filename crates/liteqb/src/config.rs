//! Connection configuration.

use std::fmt;
use std::time::Duration;

/// `PRAGMA journal_mode` value applied on open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JournalMode {
    Delete,
    Truncate,
    Persist,
    Memory,
    #[default]
    Wal,
    Off,
}

impl JournalMode {
    pub fn as_str(self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Persist => "PERSIST",
            JournalMode::Memory => "MEMORY",
            JournalMode::Wal => "WAL",
            JournalMode::Off => "OFF",
        }
    }
}

/// `PRAGMA synchronous` value applied on open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Synchronous {
    Off,
    #[default]
    Normal,
    Full,
    Extra,
}

impl Synchronous {
    pub fn as_str(self) -> &'static str {
        match self {
            Synchronous::Off => "OFF",
            Synchronous::Normal => "NORMAL",
            Synchronous::Full => "FULL",
            Synchronous::Extra => "EXTRA",
        }
    }
}

/// Locking behavior of `BEGIN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionKind {
    #[default]
    Deferred,
    Immediate,
    Exclusive,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransactionKind::Deferred => "DEFERRED",
            TransactionKind::Immediate => "IMMEDIATE",
            TransactionKind::Exclusive => "EXCLUSIVE",
        })
    }
}

/// Configuration for [`Database`](crate::Database).
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Open the file read-only. Pragmas are not applied in this mode.
    pub read_only: bool,
    /// Create the file if it does not exist (ignored when `read_only`).
    pub create: bool,
    /// How long a statement waits on a locked database before failing.
    pub busy_timeout: Duration,
    pub journal_mode: JournalMode,
    pub synchronous: Synchronous,
    /// Executions at or above this duration are logged at `warn`.
    pub slow_query_threshold: Option<Duration>,
    /// Initial listening state of the query transcript.
    pub record_queries: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            read_only: false,
            create: true,
            busy_timeout: Duration::from_secs(30),
            journal_mode: JournalMode::default(),
            synchronous: Synchronous::default(),
            slow_query_threshold: None,
            record_queries: false,
        }
    }
}

impl DatabaseConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = mode;
        self
    }

    pub fn synchronous(mut self, mode: Synchronous) -> Self {
        self.synchronous = mode;
        self
    }

    /// Set slow query threshold.
    pub fn slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    /// Start with the query transcript listening.
    pub fn record_queries(mut self) -> Self {
        self.record_queries = true;
        self
    }

    pub(crate) fn open_flags(&self) -> rusqlite::OpenFlags {
        use rusqlite::OpenFlags;

        let mut flags = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if self.read_only {
            flags |= OpenFlags::SQLITE_OPEN_READ_ONLY;
        } else {
            flags |= OpenFlags::SQLITE_OPEN_READ_WRITE;
            if self.create {
                flags |= OpenFlags::SQLITE_OPEN_CREATE;
            }
        }
        flags
    }
}
