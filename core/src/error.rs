//! Diagnostic records and fatal document errors.
//!
//! Most findings are non-fatal: they accumulate as [`Diagnostic`] records
//! while the document or an argv is parsed, and parsing continues past
//! them. Only the structural document failures — no `Usage:` section, more
//! than one, or an unparseable usage pattern — abort preflight, as
//! [`DocumentError`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable diagnostic codes.
///
/// The serialized form is the snake_case code string (e.g.
/// `"unknown_option"`), which is what the CLI emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// An option spec with three or more leading dashes.
    #[error("too many dashes")]
    ExcessiveDashes,
    /// An option spec with more than one `=` between name and variable.
    #[error("too many equal signs")]
    ExcessiveEqualSigns,
    /// A malformed `<variable>`: missing name, missing `>`, trailing
    /// characters after `>`, or a naked `=` with nothing assigned.
    #[error("invalid variable name")]
    InvalidVariableName,
    /// A missing or malformed option name.
    #[error("invalid option name")]
    InvalidOptionName,
    /// A long option declared without a space or equals separator.
    #[error("long options must use a space or equals separator")]
    BadOptionSeparator,
    /// A `[default: …]` annotation without its closing `]`.
    #[error("missing ']' to close the default value")]
    MissingCloseBracketInDefault,
    /// The same option declared twice in the `Options:` section.
    #[error("option specified more than once")]
    OptionDuplicatedInOptionsSection,
    /// An argv token that resolves to no catalog option.
    #[error("unknown option")]
    UnknownOption,
    /// An argv prefix that matches two or more catalog options.
    #[error("ambiguous prefix match")]
    AmbiguousPrefixMatch,
    /// An argv option that expects a value but has none.
    #[error("option expects an argument")]
    OptionHasMissingArgument,
    /// An argv option that was given a value but takes none.
    #[error("option does not expect an argument")]
    OptionUnexpectedArgument,
    /// An argv option using a different separator than its spec declares.
    #[error("option expects a different separator")]
    WrongSeparator,
    /// The document has no `Usage:` section.
    #[error("missing Usage: section")]
    MissingUsageSection,
    /// The document has more than one `Usage:` section.
    #[error("more than one Usage: section")]
    ExcessiveUsageSections,
    /// Two `Conditions:` entries for the same variable.
    #[error("variable already has a condition")]
    OneVariableMultipleConditions,
    /// A usage pattern with an unmatched `(`.
    #[error("missing ')' in usage pattern")]
    MissingCloseParen,
    /// A usage pattern with an unmatched `[`.
    #[error("missing ']' in usage pattern")]
    MissingCloseBracket,
    /// A usage pattern with no parseable content.
    #[error("empty usage pattern")]
    EmptyUsagePattern,
}

/// One non-fatal finding.
///
/// `position` is a byte offset into the document text for document
/// findings, or into the offending argv token for argv findings (in which
/// case `argv_index` names the slot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argv_index: Option<usize>,
    pub text: &'static str,
}

impl Diagnostic {
    /// A finding at a byte offset in the document text.
    pub fn in_doc(code: ErrorCode, position: usize, text: &'static str) -> Self {
        Diagnostic {
            code,
            position,
            argv_index: None,
            text,
        }
    }

    /// A finding in an argv token. `position` is the offset within that
    /// token (zero when the whole token is at fault).
    pub fn in_argv(code: ErrorCode, argv_index: usize, position: usize, text: &'static str) -> Self {
        Diagnostic {
            code,
            position,
            argv_index: Some(argv_index),
            text,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.argv_index {
            Some(idx) => write!(f, "argument {idx}: {}", self.text),
            None => write!(f, "offset {}: {}", self.position, self.text),
        }
    }
}

/// Fatal preflight failures. Everything else the document parser finds is
/// carried as [`Diagnostic`] records alongside a usable parser.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("usage document has no Usage: section")]
    MissingUsageSection { diagnostics: Vec<Diagnostic> },

    #[error("usage document has more than one Usage: section")]
    ExcessiveUsageSections { diagnostics: Vec<Diagnostic> },

    #[error("usage section could not be parsed")]
    InvalidUsage { diagnostics: Vec<Diagnostic> },
}

impl DocumentError {
    /// Everything recorded up to the point of failure, the fatal finding
    /// included.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            DocumentError::MissingUsageSection { diagnostics }
            | DocumentError::ExcessiveUsageSections { diagnostics }
            | DocumentError::InvalidUsage { diagnostics } => diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display_names_argv_slot() {
        let diag = Diagnostic::in_argv(ErrorCode::UnknownOption, 2, 0, "Unknown long option");
        assert_eq!(diag.to_string(), "argument 2: Unknown long option");
    }

    #[test]
    fn test_diagnostic_display_names_doc_offset() {
        let diag = Diagnostic::in_doc(ErrorCode::ExcessiveDashes, 14, "Too many dashes");
        assert_eq!(diag.to_string(), "offset 14: Too many dashes");
    }

    #[test]
    fn test_document_error_exposes_diagnostics() {
        let err = DocumentError::MissingUsageSection {
            diagnostics: vec![Diagnostic::in_doc(
                ErrorCode::MissingUsageSection,
                0,
                "Missing Usage: section",
            )],
        };
        assert_eq!(err.diagnostics().len(), 1);
    }
}
