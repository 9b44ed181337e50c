/// Error type for the scriptio crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The script ended while a statement was still buffered without its
    /// terminating delimiter. Always fatal.
    #[error("Line missing end-of-line terminator ({delimiter}) => {command}")]
    MissingTerminator { command: String, delimiter: String },
    /// A statement failed at the database. Carries the literal command text.
    /// Fatal only when the runner is configured to stop on error.
    #[error("Error executing: {sql}.  Cause: {source}")]
    Statement {
        sql: String,
        #[source]
        source: Box<Error>,
    },
    /// A post-execution warning that did not match the known benign signature,
    /// raised only when the runner is configured to throw on warnings.
    #[error("Error executing: {sql}.  Cause: warning {code}: {message}")]
    WarningEscalation {
        code: i32,
        message: String,
        sql: String,
    },
    /// A migration-unit dispatch failed: malformed directive, unresolvable
    /// unit, or missing entry point. Always fatal.
    #[error("Error dispatching migration unit ({directive}): {reason}")]
    Dispatch { directive: String, reason: String },
    #[cfg(feature = "sqlite")]
    #[error("{0}")]
    Sqlite(rusqlite::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Generic(String),
}

impl Error {
    pub(crate) fn dispatch(directive: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Dispatch {
            directive: directive.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn statement(sql: impl Into<String>, source: Error) -> Self {
        Self::Statement {
            sql: sql.into(),
            source: Box::new(source),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Self::Generic(value)
    }
}

// Manual PartialEq implementation because std::io::Error doesn't implement PartialEq
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::MissingTerminator {
                    command: a,
                    delimiter: b,
                },
                Self::MissingTerminator {
                    command: c,
                    delimiter: d,
                },
            ) => a == c && b == d,
            (
                Self::Statement { sql: a, source: b },
                Self::Statement { sql: c, source: d },
            ) => a == c && b == d,
            (
                Self::WarningEscalation {
                    code: a,
                    message: b,
                    sql: c,
                },
                Self::WarningEscalation {
                    code: d,
                    message: e,
                    sql: f,
                },
            ) => a == d && b == e && c == f,
            (
                Self::Dispatch {
                    directive: a,
                    reason: b,
                },
                Self::Dispatch {
                    directive: c,
                    reason: d,
                },
            ) => a == c && b == d,
            #[cfg(feature = "sqlite")]
            (Self::Sqlite(a), Self::Sqlite(b)) => a == b,
            (Self::Io(a), Self::Io(b)) => a.kind() == b.kind(),
            (Self::Generic(a), Self::Generic(b)) => a == b,
            _ => false,
        }
    }
}
