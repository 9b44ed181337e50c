//! Database seams consumed by the runner.
//!
//! The runner is generic over [`ScriptConnection`] so the statement executor,
//! warning policy, and transaction handling can be exercised against any
//! backend (or a mock). The shipped backend is [`crate::sqlite`].

use crate::error::Error;

/// A warning reported by the database after executing a statement.
///
/// Some engines report stored-procedure compilation errors as warnings rather
/// than errors; the executor's warning policy decides whether such a warning
/// aborts the run.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlWarning {
    pub code: i32,
    pub message: String,
}

/// A materialized result set, already rendered to strings for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Everything the database reported for one executed statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatementOutput {
    pub result_set: Option<ResultSet>,
    pub warning: Option<SqlWarning>,
}

/// A live database connection as the runner sees it.
///
/// The connection is borrowed for the duration of a run and shared with
/// dispatched migration units; the runner never closes it.
pub trait ScriptConnection {
    /// Execute one SQL statement. `escape_processing` is a driver hint;
    /// backends without the concept ignore it.
    fn execute(&mut self, sql: &str, escape_processing: bool) -> Result<StatementOutput, Error>;

    /// Execute a statement through the vendor wrapper: bind the raw statement
    /// text as the single parameter of the wrapper template and run that as an
    /// update. Used for statements the vendor cannot compile directly.
    fn execute_wrapped(&mut self, sql: &str) -> Result<(), Error>;

    fn auto_commit(&self) -> Result<bool, Error>;

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<(), Error>;

    fn commit(&mut self) -> Result<(), Error>;

    fn rollback(&mut self) -> Result<(), Error>;
}

/// A factory for additional connections to the same database.
///
/// Passed whole to dispatched migration units, which may open sibling
/// connections for their own (internal) concurrency. The runner itself only
/// ever uses the single connection it was given, and never closes the source.
pub trait DataSource<C> {
    fn connection(&self) -> Result<C, Error>;
}
