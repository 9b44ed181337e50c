//! Recognition of runner directives embedded in comment lines.
//!
//! Scripts are hand-authored against the exact historical syntax, so the
//! `@DELIMITER` value is extracted positionally (one byte at a fixed offset)
//! rather than tokenized. Do not generalize this without auditing existing
//! scripts.

use crate::error::Error;

/// Marker that routes a flushed command buffer to the dispatcher instead of
/// the database.
pub(crate) const RUN_UNIT_MARKER: &str = "@RunJar";

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Directive {
    /// Replace the active statement delimiter for subsequent lines.
    Delimiter(String),
    /// Dispatch a packaged migration unit; carries the cleaned directive text.
    RunUnit(String),
}

pub(crate) fn line_is_comment(trimmed_line: &str) -> bool {
    trimmed_line.starts_with("//") || trimmed_line.starts_with("--")
}

/// Interpret a trimmed comment line. Returns `Ok(None)` for ordinary comments.
///
/// Cleaning mirrors the historical behavior exactly: drop the two-byte comment
/// marker, trim, then remove the first `//` occurrence (so `--//@DELIMITER $`
/// still matches). The keyword match is case-insensitive; the new delimiter is
/// the byte range 11..12 of the cleaned text, i.e. the single character after
/// `@DELIMITER `.
pub(crate) fn parse(trimmed_line: &str) -> Result<Option<Directive>, Error> {
    debug_assert!(line_is_comment(trimmed_line));
    let cleaned = trimmed_line[2..].trim().replacen("//", "", 1);
    if cleaned.to_uppercase().starts_with("@DELIMITER") {
        let value = cleaned.get(11..12).ok_or_else(|| {
            Error::Generic(format!("Malformed @DELIMITER directive: {}", trimmed_line))
        })?;
        Ok(Some(Directive::Delimiter(value.to_string())))
    } else if cleaned.starts_with(RUN_UNIT_MARKER) {
        Ok(Some(Directive::RunUnit(cleaned)))
    } else {
        Ok(None)
    }
}
