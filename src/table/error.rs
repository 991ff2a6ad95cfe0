use serde::Serialize;
use thiserror::Error;

/// A recoverable problem found while parsing a table dump.
///
/// None of these abort a polling cycle. A sanity mismatch empties the
/// table's snapshot; the other kinds default a single value to zero. A
/// missing value is a [`ParseIssue::Field`] with an empty `value`.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseIssue {
    #[error("Table name mismatch: requested {requested:?}, header names {found:?}")]
    SanityMismatch { requested: String, found: String },

    #[error("Header field {field:?} is not a number: {value:?}")]
    Header { field: String, value: String },

    #[error("Line {line}: field {field:?} is not a number: {value:?}")]
    Field {
        line: usize,
        field: String,
        value: String,
    },
}

impl ParseIssue {
    /// Label used when counting issues
    pub fn kind(&self) -> &'static str {
        match self {
            ParseIssue::SanityMismatch { .. } => "sanity_mismatch",
            ParseIssue::Header { .. } => "header",
            ParseIssue::Field { .. } => "field",
        }
    }
}
