//! Line-by-line statement buffering.
//!
//! [`ParserState`] consumes a script one line at a time, accumulating a pending
//! command buffer until the active delimiter marks a statement boundary. The
//! parser decides *what* should happen to each line ([`LineOutcome`]); the
//! runner performs the execution, dispatch, and logging.

use crate::directive::{self, Directive, RUN_UNIT_MARKER};
use crate::error::Error;

/// What the runner should do after feeding one line to the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// Nothing to do; the line was blank, buffered, or consumed by a directive.
    Continue,
    /// An ordinary comment line; echo it to the log unchanged.
    Comment(String),
    /// A complete statement; execute it against the database.
    Statement(String),
    /// Directive text to forward to the migration-unit dispatcher.
    Dispatch(String),
}

/// Mutable parse state for one run: the pending command buffer and the active
/// delimiter. Created at run start, fed every line, checked at run end.
#[derive(Debug)]
pub struct ParserState {
    command: String,
    delimiter: String,
    full_line_delimiter: bool,
}

impl ParserState {
    pub fn new(delimiter: impl Into<String>, full_line_delimiter: bool) -> Self {
        Self {
            command: String::new(),
            delimiter: delimiter.into(),
            full_line_delimiter,
        }
    }

    /// The currently active delimiter (may change mid-script via `@DELIMITER`).
    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Consume one raw script line.
    ///
    /// Comment lines never contribute to the buffer: they either mutate parser
    /// state (`@DELIMITER`), trigger a dispatch (`@RunJar`), or come back as
    /// [`LineOutcome::Comment`]. A line containing the delimiter closes the
    /// buffer; everything on that line after the *last* delimiter occurrence
    /// is discarded.
    pub fn handle_line(&mut self, line: &str) -> Result<LineOutcome, Error> {
        let trimmed = line.trim();
        if directive::line_is_comment(trimmed) {
            return match directive::parse(trimmed)? {
                Some(Directive::Delimiter(delimiter)) => {
                    self.delimiter = delimiter;
                    Ok(LineOutcome::Continue)
                }
                Some(Directive::RunUnit(text)) => Ok(LineOutcome::Dispatch(text)),
                None => Ok(LineOutcome::Comment(trimmed.to_string())),
            };
        }
        if self.ready_to_execute(trimmed) {
            if let Some(index) = line.rfind(&self.delimiter) {
                self.command.push_str(&line[..index]);
            }
            let command = std::mem::take(&mut self.command);
            if command.contains(RUN_UNIT_MARKER) {
                Ok(LineOutcome::Dispatch(command))
            } else {
                Ok(LineOutcome::Statement(command))
            }
        } else if !trimmed.is_empty() {
            self.command.push_str(line);
            self.command.push('\n');
            Ok(LineOutcome::Continue)
        } else {
            Ok(LineOutcome::Continue)
        }
    }

    fn ready_to_execute(&self, trimmed_line: &str) -> bool {
        if self.full_line_delimiter {
            trimmed_line == self.delimiter
        } else {
            trimmed_line.contains(&self.delimiter)
        }
    }

    /// End-of-script check: a non-whitespace leftover buffer means the script
    /// is missing its final terminator.
    pub fn finish(&self) -> Result<(), Error> {
        if !self.command.trim().is_empty() {
            return Err(Error::MissingTerminator {
                command: self.command.clone(),
                delimiter: self.delimiter.clone(),
            });
        }
        Ok(())
    }
}
