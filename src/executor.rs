//! Statement execution: vendor-wrapper routing, error policy, warning policy,
//! and result printing.

use crate::connection::{ScriptConnection, SqlWarning, StatementOutput};
use crate::error::Error;
use crate::log::LogSink;
use crate::stopwatch::StopWatch;

/// Warning signature that is demoted to a log line instead of raised under
/// throw-warning mode. Oracle reports this for some statements that succeed.
const BENIGN_WARNING_CODE: i32 = 17110;
const BENIGN_WARNING_MESSAGE: &str = "Warning: execution completed with warning";

/// Per-statement result. Swallowed failures (stop-on-error disabled) land in
/// `error`; they are logged, not propagated.
#[derive(Debug, PartialEq, Default)]
pub struct ExecutionOutcome {
    pub had_result_set: bool,
    pub warning: Option<SqlWarning>,
    pub error: Option<Error>,
}

/// Execution flags, a borrow of the runner's configuration.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ExecOptions {
    pub stop_on_error: bool,
    pub throw_warning: bool,
    pub remove_crs: bool,
    pub escape_processing: bool,
}

/// Execute one completed statement. The elapsed-time report is written after
/// execution regardless of outcome.
pub(crate) fn execute_statement<C: ScriptConnection>(
    conn: &mut C,
    command: &str,
    opts: ExecOptions,
    log: &mut dyn LogSink,
) -> Result<ExecutionOutcome, Error> {
    let watch = StopWatch::start();
    let result = run_statement(conn, command, opts, log);
    watch.report(log);
    result
}

fn run_statement<C: ScriptConnection>(
    conn: &mut C,
    command: &str,
    opts: ExecOptions,
    log: &mut dyn LogSink,
) -> Result<ExecutionOutcome, Error> {
    let sql = if opts.remove_crs {
        command.replace("\r\n", "\n")
    } else {
        command.to_string()
    };

    if requires_vendor_wrapper(&sql) {
        // Statements creating Java stored procedures don't compile when sent
        // directly; they go through the vendor wrapper template instead.
        return match conn.execute_wrapped(&sql) {
            Ok(()) => Ok(ExecutionOutcome::default()),
            Err(e) => {
                let error = Error::statement(command, e);
                if opts.stop_on_error {
                    Err(error)
                } else {
                    log.error(&error.to_string());
                    Ok(ExecutionOutcome {
                        error: Some(error),
                        ..ExecutionOutcome::default()
                    })
                }
            }
        };
    }

    if opts.stop_on_error {
        let output = conn
            .execute(&sql, opts.escape_processing)
            .map_err(|e| Error::statement(command, e))?;
        if opts.throw_warning {
            // Some engines report stored-procedure compilation errors as
            // warnings instead of raising errors.
            if let Some(warning) = &output.warning {
                if is_benign(warning) {
                    log.error(&warning.message);
                } else {
                    return Err(Error::WarningEscalation {
                        code: warning.code,
                        message: warning.message.clone(),
                        sql: command.to_string(),
                    });
                }
            }
        }
        print_results(&output, log);
        Ok(ExecutionOutcome {
            had_result_set: output.result_set.is_some(),
            warning: output.warning,
            error: None,
        })
    } else {
        match conn.execute(&sql, opts.escape_processing) {
            Ok(output) => {
                print_results(&output, log);
                Ok(ExecutionOutcome {
                    had_result_set: output.result_set.is_some(),
                    warning: output.warning,
                    error: None,
                })
            }
            Err(e) => {
                let error = Error::statement(command, e);
                log.error(&error.to_string());
                Ok(ExecutionOutcome {
                    error: Some(error),
                    ..ExecutionOutcome::default()
                })
            }
        }
    }
}

fn is_benign(warning: &SqlWarning) -> bool {
    warning.code == BENIGN_WARNING_CODE && warning.message == BENIGN_WARNING_MESSAGE
}

/// A statement is assumed to create a Java stored procedure, and therefore
/// needs vendor wrapping, when its lowercased text contains all five keywords.
pub(crate) fn requires_vendor_wrapper(sql: &str) -> bool {
    let lowered = sql.to_lowercase();
    ["java", "source", "create", "class", "compile"]
        .iter()
        .all(|keyword| lowered.contains(keyword))
}

/// Print column labels, then each row's values, tab-separated. Observational
/// output only; never affects the execution result.
fn print_results(output: &StatementOutput, log: &mut dyn LogSink) {
    if let Some(result_set) = &output.result_set {
        let header: String = result_set
            .columns
            .iter()
            .map(|name| format!("{}\t", name))
            .collect();
        log.info(&header);
        for row in &result_set.rows {
            let line: String = row.iter().map(|value| format!("{}\t", value)).collect();
            log.info(&line);
        }
    }
}
