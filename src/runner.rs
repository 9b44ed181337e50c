//! The script runner: reads a script, splits it into statements, and executes
//! them in order against a live connection.

use std::io::BufRead;
use std::sync::Arc;

use crate::connection::{DataSource, ScriptConnection};
use crate::dispatch::{self, MigrationLoader};
use crate::error::Error;
use crate::executor::{self, ExecOptions};
use crate::log::{ConsoleLog, LogSink};
use crate::parser::{LineOutcome, ParserState};
use crate::transaction;

/// A report of actions performed during a script run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunReport {
    pub statements_executed: u32,
    /// Statements that failed but were swallowed because stop-on-error is off.
    pub statements_failed: u32,
    pub units_dispatched: u32,
}

/// The entrypoint for executing a SQL script.
///
/// Construct with [`ScriptRunner::new`], adjust behavior with the `with_*`
/// builders, then call [`run_script`](ScriptRunner::run_script) with a live
/// connection and a data source. Statements are separated by the configured
/// delimiter (default `;`); comment lines starting with `//` or `--` may carry
/// `@DELIMITER` and `@RunJar` directives.
pub struct ScriptRunner<C> {
    stop_on_error: bool,
    throw_warning: bool,
    auto_commit: bool,
    send_full_script: bool,
    remove_crs: bool,
    escape_processing: bool,
    delimiter: String,
    full_line_delimiter: bool,
    log: Box<dyn LogSink>,
    loader: Option<Arc<dyn MigrationLoader<C>>>,
}

impl<C: ScriptConnection> ScriptRunner<C> {
    pub fn new() -> Self {
        Self {
            stop_on_error: false,
            throw_warning: false,
            auto_commit: false,
            send_full_script: false,
            remove_crs: false,
            escape_processing: true,
            delimiter: ";".to_string(),
            full_line_delimiter: false,
            log: Box::new(ConsoleLog),
            loader: None,
        }
    }

    /// Abort the run on the first failing statement instead of logging and
    /// continuing.
    pub fn with_stop_on_error(mut self, stop_on_error: bool) -> Self {
        self.stop_on_error = stop_on_error;
        self
    }

    /// Treat post-execution warnings as fatal (except the known benign one).
    /// Only takes effect together with stop-on-error.
    pub fn with_throw_warning(mut self, throw_warning: bool) -> Self {
        self.throw_warning = throw_warning;
        self
    }

    /// Run the script in auto-commit mode. Off by default: the run commits
    /// once at the end and rolls back on failure.
    pub fn with_auto_commit(mut self, auto_commit: bool) -> Self {
        self.auto_commit = auto_commit;
        self
    }

    /// Whole-script mode: send the entire script as a single statement. No
    /// delimiter splitting occurs and directives are not recognized.
    pub fn with_send_full_script(mut self, send_full_script: bool) -> Self {
        self.send_full_script = send_full_script;
        self
    }

    /// Normalize `\r\n` to `\n` in each statement before sending it.
    pub fn with_remove_crs(mut self, remove_crs: bool) -> Self {
        self.remove_crs = remove_crs;
        self
    }

    /// Driver-level escape processing hint. On by default; backends without
    /// the concept ignore it.
    pub fn with_escape_processing(mut self, escape_processing: bool) -> Self {
        self.escape_processing = escape_processing;
        self
    }

    /// Set the initial statement delimiter. Defaults to `;`.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Require the delimiter to appear alone on its own line to terminate a
    /// statement, instead of anywhere within a line.
    pub fn with_full_line_delimiter(mut self, full_line_delimiter: bool) -> Self {
        self.full_line_delimiter = full_line_delimiter;
        self
    }

    /// Set the sink receiving echoed statements, result rows, and swallowed
    /// errors. Defaults to stdout/stderr.
    pub fn with_log_sink(mut self, log: Box<dyn LogSink>) -> Self {
        self.log = log;
        self
    }

    /// Set the loader that resolves `@RunJar` unit locators. Without one,
    /// any dispatch directive fails the run.
    pub fn with_loader(mut self, loader: Arc<dyn MigrationLoader<C>>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Execute a script against `conn`.
    ///
    /// The connection's auto-commit mode is aligned with the configuration at
    /// the start; a rollback is attempted on every exit path (errors ignored)
    /// when not in auto-commit mode. `data_source` is only used to hand
    /// sibling-connection capability to dispatched migration units.
    pub fn run_script<R: BufRead>(
        &mut self,
        conn: &mut C,
        data_source: &dyn DataSource<C>,
        reader: R,
    ) -> Result<RunReport, Error> {
        transaction::apply_auto_commit(conn, self.auto_commit)?;
        let result = if self.send_full_script {
            self.execute_full_script(conn, reader)
        } else {
            self.execute_line_by_line(conn, data_source, reader)
        };
        transaction::rollback_quietly(conn);
        result
    }

    fn exec_options(&self) -> ExecOptions {
        ExecOptions {
            stop_on_error: self.stop_on_error,
            throw_warning: self.throw_warning,
            remove_crs: self.remove_crs,
            escape_processing: self.escape_processing,
        }
    }

    fn execute_full_script<R: BufRead>(
        &mut self,
        conn: &mut C,
        reader: R,
    ) -> Result<RunReport, Error> {
        let mut script = String::new();
        for line in reader.lines() {
            script.push_str(&line?);
            script.push('\n');
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(bytes = script.len(), "Executing script as a single statement");
        self.log.info(&script);
        let outcome =
            executor::execute_statement(conn, &script, self.exec_options(), self.log.as_mut())?;
        transaction::commit_if_manual(conn)?;
        Ok(RunReport {
            statements_executed: 1,
            statements_failed: u32::from(outcome.error.is_some()),
            units_dispatched: 0,
        })
    }

    fn execute_line_by_line<R: BufRead>(
        &mut self,
        conn: &mut C,
        data_source: &dyn DataSource<C>,
        reader: R,
    ) -> Result<RunReport, Error> {
        let mut state = ParserState::new(self.delimiter.clone(), self.full_line_delimiter);
        let mut report = RunReport::default();
        for line in reader.lines() {
            let line = line?;
            match state.handle_line(&line)? {
                LineOutcome::Continue => {}
                LineOutcome::Comment(text) => self.log.info(&text),
                LineOutcome::Statement(sql) => {
                    self.log.info(&sql);
                    let outcome = executor::execute_statement(
                        conn,
                        &sql,
                        self.exec_options(),
                        self.log.as_mut(),
                    )?;
                    report.statements_executed += 1;
                    if outcome.error.is_some() {
                        report.statements_failed += 1;
                    }
                }
                LineOutcome::Dispatch(text) => {
                    self.log.info(&text);
                    let loader = self.loader.clone().ok_or_else(|| {
                        Error::dispatch(text.clone(), "no migration loader configured")
                    })?;
                    dispatch::run_unit(
                        &text,
                        conn,
                        data_source,
                        loader.as_ref(),
                        self.log.as_mut(),
                    )?;
                    report.units_dispatched += 1;
                }
            }
        }
        transaction::commit_if_manual(conn)?;
        state.finish()?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            statements = report.statements_executed,
            failed = report.statements_failed,
            dispatched = report.units_dispatched,
            "Script run complete"
        );
        Ok(report)
    }
}

impl<C: ScriptConnection> Default for ScriptRunner<C> {
    fn default() -> Self {
        Self::new()
    }
}
