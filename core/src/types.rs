//! Argument values, per-token validity, and parse flags.

use serde::{Deserialize, Serialize};

/// The value bound to one name after matching argv against the usage
/// grammar.
///
/// Switch-like entries accumulate `count`; value-taking options and
/// variables accumulate `values` (a variable matched under ellipsis
/// repetition collects one entry per occurrence).
///
/// # Examples
///
/// ```
/// use argdoc_core::Argument;
///
/// let arg = Argument::default();
/// assert_eq!(arg.count, 0);
/// assert!(arg.values.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    /// How many times the name was matched.
    pub count: usize,
    /// Captured values, in argv order.
    pub values: Vec<String>,
}

/// Validity classification of a single argv slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentStatus {
    /// The slot is accounted for by the best match.
    Valid,
    /// The slot is in the best match's unused set.
    Invalid,
}

/// Per-call switches controlling tokenization, matching, and output.
///
/// The default has everything off, which is plain strict parsing. Use the
/// builder-style setters to turn individual behaviors on:
///
/// ```
/// use argdoc_core::ParseFlags;
///
/// let flags = ParseFlags::default()
///     .with_prefix_matching()
///     .with_empty_args();
/// assert!(flags.resolve_unambiguous_prefixes);
/// assert!(flags.generate_empty_args);
/// assert!(!flags.generate_suggestions);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseFlags {
    /// Resolve `--verb` to `--verbose` when the prefix is unambiguous.
    pub resolve_unambiguous_prefixes: bool,
    /// Require an argv option to use the separator its spec declares.
    pub short_options_strict_separators: bool,
    /// Collect completion suggestions while matching.
    pub generate_suggestions: bool,
    /// Synthesize empty entries (and apply defaults) for every known
    /// option, variable, and command in the final map.
    pub generate_empty_args: bool,
    /// Accept match states that still have pending positionals or options;
    /// used for completion against a partial command line.
    pub match_allow_incomplete: bool,
}

impl ParseFlags {
    pub const fn new() -> Self {
        ParseFlags {
            resolve_unambiguous_prefixes: false,
            short_options_strict_separators: false,
            generate_suggestions: false,
            generate_empty_args: false,
            match_allow_incomplete: false,
        }
    }

    pub const fn with_prefix_matching(mut self) -> Self {
        self.resolve_unambiguous_prefixes = true;
        self
    }

    pub const fn with_strict_separators(mut self) -> Self {
        self.short_options_strict_separators = true;
        self
    }

    pub const fn with_suggestions(mut self) -> Self {
        self.generate_suggestions = true;
        self
    }

    pub const fn with_empty_args(mut self) -> Self {
        self.generate_empty_args = true;
        self
    }

    pub const fn with_incomplete_matching(mut self) -> Self {
        self.match_allow_incomplete = true;
        self
    }
}
