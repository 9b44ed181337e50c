//! SQLite backend for the script runner, built on [`rusqlite`].
//!
//! [`SqliteScriptConnection`] adapts a [`rusqlite::Connection`] to the
//! [`ScriptConnection`] seam. SQLite has no driver-level auto-commit switch,
//! so manual-commit mode is emulated with explicit `BEGIN`/`COMMIT`/`ROLLBACK`
//! against [`rusqlite::Connection::is_autocommit`]. SQLite reports no
//! statement warnings, so the warning policy never triggers on this backend.

use std::path::PathBuf;

use rusqlite::types::ValueRef;
use rusqlite::Connection;

use crate::connection::{DataSource, ResultSet, ScriptConnection, StatementOutput};
use crate::error::Error;
use crate::runner::ScriptRunner;

/// The bundled vendor wrapper template (see `vendor_wrapper.sql`). Targets the
/// vendor whose engine needs Java stored-procedure sources wrapped; override
/// per connection when executing against anything else.
pub const VENDOR_WRAPPER_TEMPLATE: &str = include_str!("vendor_wrapper.sql");

/// A script runner over SQLite connections.
pub type SqliteScriptRunner = ScriptRunner<SqliteScriptConnection>;

/// [`ScriptConnection`] implementation over a live [`rusqlite::Connection`].
pub struct SqliteScriptConnection {
    conn: Connection,
    wrapper_template: String,
}

impl SqliteScriptConnection {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            wrapper_template: VENDOR_WRAPPER_TEMPLATE.to_string(),
        }
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, Error> {
        Ok(Self::new(Connection::open(path.into())?))
    }

    pub fn open_in_memory() -> Result<Self, Error> {
        Ok(Self::new(Connection::open_in_memory()?))
    }

    /// Replace the vendor wrapper template. The template must carry exactly
    /// one bind parameter, which receives the raw statement text.
    pub fn with_wrapper_template(mut self, template: impl Into<String>) -> Self {
        self.wrapper_template = template.into();
        self
    }

    /// Access the underlying connection, e.g. to inspect state after a run.
    pub fn inner(&self) -> &Connection {
        &self.conn
    }

    pub fn inner_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    pub fn into_inner(self) -> Connection {
        self.conn
    }
}

impl ScriptConnection for SqliteScriptConnection {
    fn execute(&mut self, sql: &str, _escape_processing: bool) -> Result<StatementOutput, Error> {
        let mut stmt = self.conn.prepare(sql)?;
        if stmt.column_count() > 0 {
            let columns: Vec<String> = stmt
                .column_names()
                .iter()
                .map(|name| name.to_string())
                .collect();
            let mut result_rows = Vec::new();
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let mut rendered = Vec::with_capacity(columns.len());
                for index in 0..columns.len() {
                    rendered.push(render_value(row.get_ref(index)?));
                }
                result_rows.push(rendered);
            }
            Ok(StatementOutput {
                result_set: Some(ResultSet {
                    columns,
                    rows: result_rows,
                }),
                warning: None,
            })
        } else {
            stmt.execute([])?;
            Ok(StatementOutput::default())
        }
    }

    fn execute_wrapped(&mut self, sql: &str) -> Result<(), Error> {
        let template = self.wrapper_template.clone();
        self.conn.execute(&template, rusqlite::params![sql])?;
        Ok(())
    }

    fn auto_commit(&self) -> Result<bool, Error> {
        Ok(self.conn.is_autocommit())
    }

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<(), Error> {
        if auto_commit {
            if !self.conn.is_autocommit() {
                self.conn.execute_batch("COMMIT")?;
            }
        } else if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), Error> {
        self.conn.execute_batch("COMMIT")?;
        // stay in manual-commit mode: open the next transaction immediately
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), Error> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "null".to_string(),
        ValueRef::Integer(value) => value.to_string(),
        ValueRef::Real(value) => value.to_string(),
        ValueRef::Text(text) => String::from_utf8_lossy(text).into_owned(),
        ValueRef::Blob(blob) => blob.iter().map(|byte| format!("{:02x}", byte)).collect(),
    }
}

/// Opens sibling connections to a SQLite database, handed to dispatched
/// migration units.
pub struct SqliteDataSource {
    path: Option<PathBuf>,
}

impl SqliteDataSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Each connection from this source is an independent in-memory database.
    /// Mainly useful for examples and tests that never dispatch units.
    pub fn memory() -> Self {
        Self { path: None }
    }
}

impl DataSource<SqliteScriptConnection> for SqliteDataSource {
    fn connection(&self) -> Result<SqliteScriptConnection, Error> {
        let conn = match &self.path {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };
        Ok(SqliteScriptConnection::new(conn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{ScriptMigration, StaticLoader};
    use crate::log::{BufferLog, LogSink};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    fn shared_log() -> (Arc<Mutex<BufferLog>>, Box<dyn LogSink>) {
        let shared = Arc::new(Mutex::new(BufferLog::new()));
        (shared.clone(), Box::new(shared))
    }

    fn table_names(conn: &SqliteScriptConnection) -> Vec<String> {
        let mut stmt = conn
            .inner()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get::<_, String>(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn runs_a_script_end_to_end() {
        let mut conn = SqliteScriptConnection::open_in_memory().unwrap();
        let (log, sink) = shared_log();
        let mut runner = SqliteScriptRunner::new().with_log_sink(sink);
        let script = "\
CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);
INSERT INTO users VALUES (1, 'alice');
INSERT INTO users VALUES (2, 'bob');
SELECT name FROM users ORDER BY id;
";
        let report = runner
            .run_script(&mut conn, &SqliteDataSource::memory(), script.as_bytes())
            .unwrap();
        assert_eq!(report.statements_executed, 4);
        assert_eq!(report.statements_failed, 0);
        let infos = &log.lock().unwrap().infos;
        // the SELECT's result set is printed tab-separated after its echo
        let header_at = infos.iter().position(|line| line == "name\t").unwrap();
        assert_eq!(infos[header_at + 1], "alice\t");
        assert_eq!(infos[header_at + 2], "bob\t");
    }

    #[test]
    fn delimiter_change_applies_from_the_directive_onward() {
        let mut conn = SqliteScriptConnection::open_in_memory().unwrap();
        let mut runner =
            SqliteScriptRunner::new().with_log_sink(Box::new(BufferLog::new()));
        let script = "\
CREATE TABLE a (x INT);
-- @DELIMITER $
CREATE TABLE b (x INT)$
CREATE TABLE c (x INT)$
";
        runner
            .run_script(&mut conn, &SqliteDataSource::memory(), script.as_bytes())
            .unwrap();
        assert_eq!(table_names(&conn), vec!["a", "b", "c"]);
    }

    #[test]
    fn missing_terminator_fails_and_names_the_dangling_text() {
        let mut conn = SqliteScriptConnection::open_in_memory().unwrap();
        let mut runner =
            SqliteScriptRunner::new().with_log_sink(Box::new(BufferLog::new()));
        let script = "CREATE TABLE a (x INT);\nINSERT INTO a VALUES (1)\n";
        let err = runner
            .run_script(&mut conn, &SqliteDataSource::memory(), script.as_bytes())
            .unwrap_err();
        assert_eq!(
            err,
            Error::MissingTerminator {
                command: "INSERT INTO a VALUES (1)\n".to_string(),
                delimiter: ";".to_string(),
            }
        );
    }

    #[test]
    fn stop_on_error_disabled_continues_past_failures() {
        let mut conn = SqliteScriptConnection::open_in_memory().unwrap();
        let (log, sink) = shared_log();
        let mut runner = SqliteScriptRunner::new().with_log_sink(sink);
        let script = "\
CREATE TABLE a (x INT);
INSERT INTO missing VALUES (1);
CREATE TABLE b (x INT);
";
        let report = runner
            .run_script(&mut conn, &SqliteDataSource::memory(), script.as_bytes())
            .unwrap();
        assert_eq!(report.statements_executed, 3);
        assert_eq!(report.statements_failed, 1);
        assert_eq!(table_names(&conn), vec!["a", "b"]);
        assert_eq!(log.lock().unwrap().errors.len(), 1);
    }

    #[test]
    fn stop_on_error_aborts_and_rolls_back() {
        let mut conn = SqliteScriptConnection::open_in_memory().unwrap();
        let mut runner = SqliteScriptRunner::new()
            .with_stop_on_error(true)
            .with_log_sink(Box::new(BufferLog::new()));
        let script = "\
CREATE TABLE a (x INT);
INSERT INTO missing VALUES (1);
CREATE TABLE b (x INT);
";
        let err = runner
            .run_script(&mut conn, &SqliteDataSource::memory(), script.as_bytes())
            .unwrap_err();
        match err {
            Error::Statement { sql, .. } => assert_eq!(sql, "INSERT INTO missing VALUES (1)"),
            other => panic!("expected Statement error, got {:?}", other),
        }
        // manual-commit mode: the failed run was rolled back entirely
        assert_eq!(table_names(&conn), Vec::<String>::new());
    }

    #[test]
    fn manual_commit_mode_persists_data_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("scripts.db");
        let mut conn = SqliteScriptConnection::open(&db_path).unwrap();
        let mut runner =
            SqliteScriptRunner::new().with_log_sink(Box::new(BufferLog::new()));
        let script = "CREATE TABLE a (x INT);\nINSERT INTO a VALUES (7);\n";
        runner
            .run_script(&mut conn, &SqliteDataSource::new(&db_path), script.as_bytes())
            .unwrap();
        drop(conn);
        // a fresh connection sees the committed data
        let check = Connection::open(&db_path).unwrap();
        let x: i64 = check
            .query_row("SELECT x FROM a", [], |row| row.get(0))
            .unwrap();
        assert_eq!(x, 7);
    }

    #[test]
    fn whole_script_mode_executes_once_without_splitting() {
        let mut conn = SqliteScriptConnection::open_in_memory().unwrap();
        let mut runner = SqliteScriptRunner::new()
            .with_send_full_script(true)
            .with_log_sink(Box::new(BufferLog::new()));
        // a single statement spanning the whole script; no trailing delimiter
        // is needed because nothing is split
        let script = "CREATE TABLE a (\n  x INT\n)\n";
        let report = runner
            .run_script(&mut conn, &SqliteDataSource::memory(), script.as_bytes())
            .unwrap();
        assert_eq!(report.statements_executed, 1);
        assert_eq!(table_names(&conn), vec!["a"]);
    }

    struct SeedUnit;

    impl ScriptMigration<SqliteScriptConnection> for SeedUnit {
        fn migrate(
            &self,
            conn: &mut SqliteScriptConnection,
            directive_text: &str,
            environment: &HashMap<String, String>,
            data_source: &dyn crate::DataSource<SqliteScriptConnection>,
        ) -> Result<(), Error> {
            assert_eq!(directive_text, "@RunJar seed.jar");
            assert!(environment.is_empty());
            // write through the runner's connection
            conn.execute("INSERT INTO t VALUES (100)", true)?;
            // and through a sibling connection from the shared data source
            let mut sibling = data_source.connection()?;
            sibling.execute("INSERT INTO t VALUES (200)", true)?;
            Ok(())
        }
    }

    #[test]
    fn dispatch_runs_unit_between_statements_and_restores_auto_commit() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("dispatch.db");
        let mut conn = SqliteScriptConnection::open(&db_path).unwrap();
        let loader: StaticLoader<SqliteScriptConnection> =
            StaticLoader::new().with_unit("seed.jar", Arc::new(SeedUnit));
        let mut runner = SqliteScriptRunner::new()
            .with_auto_commit(true)
            .with_loader(Arc::new(loader))
            .with_log_sink(Box::new(BufferLog::new()));
        let script = "\
CREATE TABLE t (x INT);
-- @RunJar seed.jar
INSERT INTO t VALUES (1);
";
        let report = runner
            .run_script(&mut conn, &SqliteDataSource::new(&db_path), script.as_bytes())
            .unwrap();
        assert_eq!(report.statements_executed, 2);
        assert_eq!(report.units_dispatched, 1);
        assert!(conn.auto_commit().unwrap());
        let mut stmt = conn.inner().prepare("SELECT x FROM t ORDER BY x").unwrap();
        let values: Vec<i64> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(values, vec![1, 100, 200]);
    }

    #[test]
    fn unknown_unit_path_fails_with_dispatch_error() {
        let mut conn = SqliteScriptConnection::open_in_memory().unwrap();
        let loader: StaticLoader<SqliteScriptConnection> = StaticLoader::new();
        let mut runner = SqliteScriptRunner::new()
            .with_auto_commit(true)
            .with_loader(Arc::new(loader))
            .with_log_sink(Box::new(BufferLog::new()));
        let before = conn.auto_commit().unwrap();
        let err = runner
            .run_script(
                &mut conn,
                &SqliteDataSource::memory(),
                "-- @RunJar missing.jar\n".as_bytes(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Dispatch { .. }));
        assert_eq!(conn.auto_commit().unwrap(), before);
    }

    #[test]
    fn vendor_wrapped_statement_binds_text_into_the_template() {
        let mut conn = SqliteScriptConnection::open_in_memory().unwrap();
        conn.inner()
            .execute("CREATE TABLE wrapped_statements (body TEXT)", [])
            .unwrap();
        let mut conn =
            conn.with_wrapper_template("INSERT INTO wrapped_statements (body) VALUES (?1)");
        let mut runner = SqliteScriptRunner::new()
            .with_auto_commit(true)
            .with_log_sink(Box::new(BufferLog::new()));
        let statement = "create or replace and compile java source named \"A\" as class A {}";
        let script = format!("{};\n", statement);
        runner
            .run_script(&mut conn, &SqliteDataSource::memory(), script.as_bytes())
            .unwrap();
        let body: String = conn
            .inner()
            .query_row("SELECT body FROM wrapped_statements", [], |row| row.get(0))
            .unwrap();
        assert_eq!(body, statement);
    }

    #[test]
    fn remove_crs_strips_carriage_returns_inside_statements() {
        let mut conn = SqliteScriptConnection::open_in_memory().unwrap();
        let mut runner = SqliteScriptRunner::new()
            .with_remove_crs(true)
            .with_log_sink(Box::new(BufferLog::new()));
        // lines() strips one trailing \r per line; a doubled \r leaves one
        // behind, which pairs with the buffer's \n and gets normalized
        let script = "CREATE TABLE a\r\r\n (x INT);\n";
        runner
            .run_script(&mut conn, &SqliteDataSource::memory(), script.as_bytes())
            .unwrap();
        assert_eq!(table_names(&conn), vec!["a"]);
    }

    #[test]
    fn null_and_blob_values_render_in_result_sets() {
        let mut conn = SqliteScriptConnection::open_in_memory().unwrap();
        conn.inner()
            .execute_batch(
                "CREATE TABLE v (a TEXT, b BLOB);
                 INSERT INTO v VALUES (NULL, X'0A0B');",
            )
            .unwrap();
        let output = conn.execute("SELECT a, b FROM v", true).unwrap();
        let result_set = output.result_set.unwrap();
        assert_eq!(result_set.rows, vec![vec!["null".to_string(), "0a0b".to_string()]]);
    }
}
