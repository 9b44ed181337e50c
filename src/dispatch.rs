//! Dispatch of externally packaged migration units.
//!
//! A `@RunJar <path>` directive hands control to a migration unit resolved by
//! a [`MigrationLoader`]. The runner depends only on this capability
//! interface; how units are packaged and resolved is the loader's concern.
//! The shipped [`StaticLoader`] is an in-process registry, for embedded units
//! and tests; a dynamic-library loader would implement the same trait.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::connection::{DataSource, ScriptConnection};
use crate::directive::RUN_UNIT_MARKER;
use crate::error::Error;
use crate::log::LogSink;
use crate::stopwatch::StopWatch;

/// The entry-point contract of a packaged migration unit.
///
/// A unit receives the runner's live connection, the raw directive text it was
/// dispatched with, an environment map (currently always empty), and the
/// shared data source. Units are free to open additional connections from the
/// data source and use their own concurrency; the runner blocks on the single
/// `migrate` call and treats it as atomic.
pub trait ScriptMigration<C> {
    fn migrate(
        &self,
        conn: &mut C,
        directive_text: &str,
        environment: &HashMap<String, String>,
        data_source: &dyn DataSource<C>,
    ) -> Result<(), Error>;
}

/// Resolves a unit locator to its entry point.
///
/// Every resolution failure — unreadable unit, no declared entry point,
/// entry point without the required `migrate` signature — surfaces as
/// [`Error::Dispatch`].
pub trait MigrationLoader<C> {
    fn load(&self, path: &Path) -> Result<Arc<dyn ScriptMigration<C>>, Error>;
}

/// In-process unit registry: locator paths mapped to registered entry points.
pub struct StaticLoader<C> {
    units: HashMap<PathBuf, Arc<dyn ScriptMigration<C>>>,
}

impl<C> StaticLoader<C> {
    pub fn new() -> Self {
        Self {
            units: HashMap::new(),
        }
    }

    /// Register a unit under the locator path scripts will reference.
    pub fn with_unit(
        mut self,
        path: impl Into<PathBuf>,
        unit: Arc<dyn ScriptMigration<C>>,
    ) -> Self {
        self.units.insert(path.into(), unit);
        self
    }
}

impl<C> Default for StaticLoader<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> MigrationLoader<C> for StaticLoader<C> {
    fn load(&self, path: &Path) -> Result<Arc<dyn ScriptMigration<C>>, Error> {
        self.units.get(path).cloned().ok_or_else(|| {
            Error::dispatch(
                path.display().to_string(),
                "no migration unit registered at this path",
            )
        })
    }
}

/// Resolve and invoke the unit named by `directive`, restoring the
/// connection's auto-commit mode afterward regardless of outcome.
///
/// Errors returned by the unit itself are re-raised unchanged.
pub(crate) fn run_unit<C: ScriptConnection>(
    directive: &str,
    conn: &mut C,
    data_source: &dyn DataSource<C>,
    loader: &dyn MigrationLoader<C>,
    log: &mut dyn LogSink,
) -> Result<(), Error> {
    if !directive.starts_with(RUN_UNIT_MARKER) {
        return Err(Error::dispatch(
            directive,
            format!("directive does not start with '{}'", RUN_UNIT_MARKER),
        ));
    }
    let locator = directive[RUN_UNIT_MARKER.len()..].trim();
    if locator.is_empty() {
        return Err(Error::dispatch(directive, "directive names no unit path"));
    }

    // Resolution happens before the auto-commit mode is recorded, so a failed
    // load leaves the connection untouched.
    let unit = loader.load(Path::new(locator))?;

    let auto_commit = conn.auto_commit()?;
    log.info(&format!("Running migration unit {}", locator));
    #[cfg(feature = "tracing")]
    tracing::info!(unit = locator, "Dispatching migration unit");

    let watch = StopWatch::start();
    // None of the known scripts carry environment entries on the directive
    // line, so the unit always receives an empty map.
    let environment = HashMap::new();
    let result = unit.migrate(conn, directive, &environment, data_source);
    // Restore auto-commit on every path; a restore failure must not mask the
    // unit's own result.
    let _ = conn.set_auto_commit(auto_commit);
    watch.report(log);

    #[cfg(feature = "tracing")]
    if let Err(error) = &result {
        tracing::error!(unit = locator, error = %error, "Migration unit failed");
    }
    result
}
