//! `scriptio` executes SQL migration scripts: plain-text files of statements
//! separated by a configurable delimiter, interspersed with directive comments
//! the runner interprets itself.
//!
//! Core concepts:
//! - Scripts are consumed line by line; a statement runs as soon as its
//!   delimiter is reached, so large scripts never need to fit in one buffer.
//! - Comment lines (`//` or `--`) may carry directives: `@DELIMITER x`
//!   changes the active delimiter mid-script, and `@RunJar <path>` hands
//!   control to an externally packaged migration unit with a live connection,
//!   the shared data source, and an environment map.
//! - The runner is generic over the [`ScriptConnection`] seam; the shipped
//!   backend is [`sqlite`] (behind the default-on `sqlite` feature).
//!
//! # Example
//!
//! ```
//! use scriptio::sqlite::{SqliteDataSource, SqliteScriptConnection, SqliteScriptRunner};
//!
//! let mut conn = SqliteScriptConnection::open_in_memory().unwrap();
//! let script = "\
//! CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);
//! INSERT INTO users VALUES (1, 'alice');
//! ";
//!
//! let mut runner = SqliteScriptRunner::new();
//! let report = runner
//!     .run_script(&mut conn, &SqliteDataSource::memory(), script.as_bytes())
//!     .unwrap();
//! assert_eq!(report.statements_executed, 2);
//!
//! let name: String = conn
//!     .inner()
//!     .query_row("SELECT name FROM users WHERE id = 1", [], |row| row.get(0))
//!     .unwrap();
//! assert_eq!(name, "alice");
//! ```
//!
//! # Dispatching migration units
//!
//! A `@RunJar` directive resolves a migration unit through the
//! [`MigrationLoader`] the runner was configured with and invokes its
//! `migrate` entry point. Units may open additional connections from the
//! shared [`DataSource`] and use their own concurrency; the runner blocks on
//! the invocation and restores the connection's auto-commit mode afterward
//! regardless of outcome.
//!
//! # Behavior flags
//!
//! The `with_*` builders on [`ScriptRunner`] cover the run options: stop on
//! error, throw on warning, auto-commit, whole-script mode, carriage-return
//! stripping, escape processing, delimiter, and full-line-delimiter matching.
//!
//! Tracing integration is available with the `tracing` feature flag.

mod connection;
pub use connection::{DataSource, ResultSet, ScriptConnection, SqlWarning, StatementOutput};

mod error;
pub use error::Error;

mod log;
pub use log::{BufferLog, ConsoleLog, LogSink};

mod directive;

mod parser;
pub use parser::{LineOutcome, ParserState};

mod executor;
pub use executor::ExecutionOutcome;

mod dispatch;
pub use dispatch::{MigrationLoader, ScriptMigration, StaticLoader};

mod transaction;

mod stopwatch;

mod runner;
pub use runner::{RunReport, ScriptRunner};

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
pub(crate) mod test_support;
