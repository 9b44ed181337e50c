//! Transaction boundaries around a script run.
//!
//! Auto-commit is set once at run start, commits happen after the script (or
//! after the line-by-line loop) completes, and a rollback is attempted on
//! every exit path when not in auto-commit mode.

use crate::connection::ScriptConnection;
use crate::error::Error;

/// Align the connection's auto-commit mode with the configured one. Only
/// touches the connection when the modes differ.
pub(crate) fn apply_auto_commit<C: ScriptConnection>(
    conn: &mut C,
    auto_commit: bool,
) -> Result<(), Error> {
    let current = conn.auto_commit()?;
    if current != auto_commit {
        conn.set_auto_commit(auto_commit).map_err(|e| {
            Error::Generic(format!(
                "Could not set auto-commit to {}. Cause: {}",
                auto_commit, e
            ))
        })?;
    }
    Ok(())
}

pub(crate) fn commit_if_manual<C: ScriptConnection>(conn: &mut C) -> Result<(), Error> {
    if !conn.auto_commit()? {
        conn.commit()
            .map_err(|e| Error::Generic(format!("Could not commit transaction. Cause: {}", e)))?;
    }
    Ok(())
}

/// Best-effort rollback at run exit; errors are ignored so cleanup never masks
/// the run's own result.
pub(crate) fn rollback_quietly<C: ScriptConnection>(conn: &mut C) {
    if let Ok(false) = conn.auto_commit() {
        let _ = conn.rollback();
    }
}
