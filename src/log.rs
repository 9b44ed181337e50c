//! Log sinks for script output.
//!
//! The runner never writes to a process-wide stream directly. Echoed statements,
//! result rows, and swallowed errors go through a [`LogSink`] supplied by the
//! caller, so embedding applications can capture or redirect script output.

use std::io::Write;

/// Receives the observable output of a script run.
///
/// `info` carries echoed statements, comments, result rows, and timing reports.
/// `error` carries swallowed statement failures and demoted warnings.
pub trait LogSink {
    fn info(&mut self, message: &str);
    fn error(&mut self, message: &str);
}

/// Default sink: `info` to stdout, `error` to stderr.
#[derive(Debug, Default)]
pub struct ConsoleLog;

impl LogSink for ConsoleLog {
    fn info(&mut self, message: &str) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        let _ = writeln!(lock, "{}", message);
        let _ = lock.flush();
    }

    fn error(&mut self, message: &str) {
        let stderr = std::io::stderr();
        let mut lock = stderr.lock();
        let _ = writeln!(lock, "{}", message);
        let _ = lock.flush();
    }
}

/// Capturing sink, useful for tests and for embedding applications that want
/// to inspect script output after the run.
#[derive(Debug, Default)]
pub struct BufferLog {
    pub infos: Vec<String>,
    pub errors: Vec<String>,
}

impl BufferLog {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Shared handle to a sink, for callers that need to read captured output
/// after handing the sink to a runner.
impl<T: LogSink> LogSink for std::sync::Arc<std::sync::Mutex<T>> {
    fn info(&mut self, message: &str) {
        if let Ok(mut sink) = self.lock() {
            sink.info(message);
        }
    }

    fn error(&mut self, message: &str) {
        if let Ok(mut sink) = self.lock() {
            sink.error(message);
        }
    }
}

impl LogSink for BufferLog {
    fn info(&mut self, message: &str) {
        self.infos.push(message.to_string());
    }

    fn error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}
