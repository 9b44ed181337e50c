//! Shared test doubles for the runner's database seam.

use std::collections::VecDeque;

use crate::connection::{
    DataSource, ResultSet, ScriptConnection, SqlWarning, StatementOutput,
};
use crate::error::Error;

enum Scripted {
    Output(StatementOutput),
    Fail(String),
    FailWrapped(String),
}

/// A scriptable [`ScriptConnection`]: records everything sent to it and
/// replays queued outputs, failures, and warnings.
#[derive(Default)]
pub(crate) struct MockConnection {
    pub executed: Vec<String>,
    pub wrapped: Vec<String>,
    pub auto_commit: bool,
    pub commits: usize,
    pub rollbacks: usize,
    pub auto_commit_changes: Vec<bool>,
    queue: VecDeque<Scripted>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self {
            auto_commit: true,
            ..Self::default()
        }
    }

    /// Queue a failure for the next executed statement.
    pub fn fail_next(&mut self, message: &str) {
        self.queue.push_back(Scripted::Fail(message.to_string()));
    }

    /// Queue a failure for the next wrapped execution.
    pub fn fail_next_wrapped(&mut self, message: &str) {
        self.queue
            .push_back(Scripted::FailWrapped(message.to_string()));
    }

    /// Queue a warning for the next executed statement.
    pub fn warn_next(&mut self, code: i32, message: &str) {
        self.queue.push_back(Scripted::Output(StatementOutput {
            result_set: None,
            warning: Some(SqlWarning {
                code,
                message: message.to_string(),
            }),
        }));
    }

    /// Queue a result set for the next executed statement.
    pub fn respond_next(&mut self, result_set: ResultSet) {
        self.queue.push_back(Scripted::Output(StatementOutput {
            result_set: Some(result_set),
            warning: None,
        }));
    }
}

impl ScriptConnection for MockConnection {
    fn execute(&mut self, sql: &str, _escape_processing: bool) -> Result<StatementOutput, Error> {
        self.executed.push(sql.to_string());
        match self.queue.pop_front() {
            Some(Scripted::Output(output)) => Ok(output),
            Some(Scripted::Fail(message)) => Err(Error::Generic(message)),
            Some(Scripted::FailWrapped(message)) => Err(Error::Generic(message)),
            None => Ok(StatementOutput::default()),
        }
    }

    fn execute_wrapped(&mut self, sql: &str) -> Result<(), Error> {
        self.wrapped.push(sql.to_string());
        match self.queue.pop_front() {
            Some(Scripted::FailWrapped(message)) | Some(Scripted::Fail(message)) => {
                Err(Error::Generic(message))
            }
            Some(Scripted::Output(_)) | None => Ok(()),
        }
    }

    fn auto_commit(&self) -> Result<bool, Error> {
        Ok(self.auto_commit)
    }

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<(), Error> {
        self.auto_commit = auto_commit;
        self.auto_commit_changes.push(auto_commit);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), Error> {
        self.commits += 1;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), Error> {
        self.rollbacks += 1;
        Ok(())
    }
}

/// A [`DataSource`] yielding fresh, unscripted mock connections.
#[derive(Default)]
pub(crate) struct MockDataSource;

impl DataSource<MockConnection> for MockDataSource {
    fn connection(&self) -> Result<MockConnection, Error> {
        Ok(MockConnection::new())
    }
}
