//! Usage-document argument parsing.
//!
//! This crate consumes a human-authored usage document (`Usage:`,
//! `Options:`, and `Conditions:` sections) plus a raw argv, and produces a
//! structured binding of argument names to values together with
//! diagnostics and interactive-shell affordances: per-token validity,
//! next-argument suggestions, and per-option description lookup.
//!
//! # Main entry points
//!
//! - [`ArgumentParser::new`] — preflight a document into a reusable
//!   parser.
//! - [`ArgumentParser::parse_arguments`] — bind an argv to names.
//! - [`ArgumentParser::validate_arguments`] — classify each argv slot as
//!   valid or invalid.
//! - [`ArgumentParser::suggest_next_argument`] — completion candidates
//!   for a partial command line.
//!
//! # Example
//!
//! ```
//! use argdoc_parser::{ArgumentParser, ParseFlags};
//!
//! let doc = "\
//! Usage: checkout [options] <branch>
//!
//! Options:
//!   -q, --quiet  Suppress progress output
//! ";
//! let parser = ArgumentParser::new(doc).expect("document should preflight");
//!
//! let argv: Vec<String> = ["checkout", "main", "--quiet"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//! let outcome = parser.parse_arguments(&argv, ParseFlags::default());
//! assert_eq!(outcome.map["<branch>"].values, vec!["main"]);
//! assert_eq!(outcome.map["--quiet"].count, 1);
//! assert!(outcome.unused_argv_indices.is_empty());
//! ```

mod argv;
mod conditions;
mod grammar;
mod matcher;
mod options;
mod scan;
mod sections;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

pub use argdoc_core::{
    Argument, ArgumentStatus, Diagnostic, DocumentError, ErrorCode, ParseFlags, Range,
};

use crate::argv::separate_argv;
use crate::grammar::Usage;
use crate::matcher::{MatchContext, MatchState, Matcher};
use crate::options::OptionRecord;

/// The result of binding one argv against the document.
#[derive(Debug, Clone, Serialize)]
pub struct ParseOutcome {
    /// Name → argument bindings from the best match, possibly enriched
    /// with empty entries and defaults under
    /// [`ParseFlags::generate_empty_args`].
    pub map: BTreeMap<String, Argument>,
    /// Argv indices the best match left unaccounted for. When nothing
    /// matched at all, every index is here.
    pub unused_argv_indices: Vec<usize>,
    /// Argv findings. Non-fatal: the matcher ran regardless.
    pub diagnostics: Vec<Diagnostic>,
}

/// A preflighted usage document, ready to parse argvs against.
///
/// The parser owns the document text; options, descriptions, defaults,
/// and conditions all reference into it. Construction runs the whole
/// doc-side pipeline (section discovery, option catalog, usage grammar,
/// conditions); afterwards the instance is immutable and every operation
/// takes `&self`.
#[derive(Debug)]
pub struct ArgumentParser {
    source: String,
    usages: Vec<Usage>,
    shortcut_options: Vec<OptionRecord>,
    all_options: Vec<OptionRecord>,
    all_variables: Vec<Range>,
    all_static_arguments: Vec<Range>,
    conditions: BTreeMap<String, Range>,
    diagnostics: Vec<Diagnostic>,
}

impl ArgumentParser {
    /// Preflights `doc`. Structural failures — no `Usage:` section, more
    /// than one, or an unparseable usage pattern — are fatal; everything
    /// else is recorded and available via
    /// [`diagnostics`](ArgumentParser::diagnostics).
    pub fn new(doc: impl Into<String>) -> Result<ArgumentParser, DocumentError> {
        let source = doc.into();
        let mut diagnostics = Vec::new();

        let usage_ranges = sections::section_ranges(&source, "Usage:", false);
        if usage_ranges.is_empty() {
            diagnostics.push(Diagnostic::in_doc(
                ErrorCode::MissingUsageSection,
                0,
                "Missing Usage: section",
            ));
            return Err(DocumentError::MissingUsageSection { diagnostics });
        }
        if usage_ranges.len() > 1 {
            diagnostics.push(Diagnostic::in_doc(
                ErrorCode::ExcessiveUsageSections,
                usage_ranges[1].start,
                "More than one Usage: section",
            ));
            return Err(DocumentError::ExcessiveUsageSections { diagnostics });
        }

        // The Options: section provides the "shortcut" catalog the
        // [options] construct expands to. Duplicates there are errors.
        let mut shortcut_options = options::parse_options_section(&source, &mut diagnostics);
        options::uniqueize(&source, &mut shortcut_options, true, &mut diagnostics);

        let Some(usages) =
            grammar::parse_usage_sections(&source, usage_ranges[0], &shortcut_options, &mut diagnostics)
        else {
            return Err(DocumentError::InvalidUsage { diagnostics });
        };

        let (usage_options, all_variables, all_static_arguments) = grammar::collect_clauses(&usages);

        let mut all_options = usage_options.clone();
        all_options.extend(shortcut_options.iter().copied());
        options::uniqueize(&source, &mut all_options, false, &mut diagnostics);

        // An option mentioned literally in Usage: has more particular use
        // cases than the catch-all [options], so it is excised from the
        // shortcut list. `prog [options] [-a]` with `Options: -a` matches
        // -a through the explicit clause only.
        shortcut_options.retain(|shortcut| {
            !usage_options
                .iter()
                .any(|usage_opt| usage_opt.has_same_name(shortcut, &source))
        });

        let conditions = conditions::parse_conditions_section(&source, &mut diagnostics);

        debug!(
            usages = usages.len(),
            options = all_options.len(),
            shortcuts = shortcut_options.len(),
            findings = diagnostics.len(),
            "preflighted usage document"
        );

        Ok(ArgumentParser {
            source,
            usages,
            shortcut_options,
            all_options,
            all_variables,
            all_static_arguments,
            conditions,
            diagnostics,
        })
    }

    /// The document text this parser was built from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Non-fatal findings recorded during preflight.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Binds `argv` to names: tokenizes it against the option catalog,
    /// matches every legal derivation against the usage grammar, and
    /// returns the binding with the fewest unused argv slots.
    pub fn parse_arguments(&self, argv: &[String], flags: ParseFlags) -> ParseOutcome {
        let mut diagnostics = Vec::new();
        let separation = separate_argv(
            &self.source,
            argv,
            &self.all_options,
            flags,
            &mut diagnostics,
            false,
        );
        let (map, unused_argv_indices) =
            self.match_argv(argv, flags, &separation.positionals, &separation.resolved);
        ParseOutcome {
            map,
            unused_argv_indices,
            diagnostics,
        }
    }

    /// Classifies each argv slot: invalid iff the best match left it
    /// unused.
    pub fn validate_arguments(&self, argv: &[String], flags: ParseFlags) -> Vec<ArgumentStatus> {
        let outcome = self.parse_arguments(argv, flags);
        let mut result = vec![ArgumentStatus::Valid; argv.len()];
        for idx in outcome.unused_argv_indices {
            result[idx] = ArgumentStatus::Invalid;
        }
        result
    }

    /// Completion candidates for the next argument after `argv`.
    ///
    /// When the final token is an option still waiting for its value, the
    /// declared variable is the only suggestion. Otherwise suggestions
    /// are collected from every best-scoring match state, sorted and
    /// deduplicated. Argv findings are suppressed here.
    pub fn suggest_next_argument(&self, argv: &[String], flags: ParseFlags) -> Vec<String> {
        let flags = flags.with_suggestions();
        let mut scratch = Vec::new();
        let separation = separate_argv(&self.source, argv, &self.all_options, flags, &mut scratch, true);
        if let Some(suggestion) = separation.suggestion {
            return vec![suggestion];
        }

        let mut ctx = MatchContext::new(flags, &separation.positionals, &separation.resolved, argv);
        let init = MatchState {
            consumed_options: vec![false; separation.resolved.len()],
            ..MatchState::default()
        };
        let matcher = Matcher {
            src: &self.source,
            shortcut_options: &self.shortcut_options,
        };
        let states = matcher.match_usages(&self.usages, &init, &mut ctx);

        let best_unused_count = states
            .iter()
            .map(|state| ctx.unused_arguments(state).len())
            .min();
        let Some(best_unused_count) = best_unused_count else {
            return Vec::new();
        };

        let mut suggestions: Vec<String> = states
            .iter()
            .filter(|state| ctx.unused_arguments(state).len() == best_unused_count)
            .flat_map(|state| state.suggested_next_arguments.iter().cloned())
            .collect();
        suggestions.sort();
        suggestions.dedup();
        suggestions
    }

    /// The condition text bound to `variable` (angle brackets included,
    /// e.g. `"<pid>"`).
    pub fn conditions_for_variable(&self, variable: &str) -> Option<&str> {
        self.conditions
            .get(variable)
            .map(|range| range.slice(&self.source))
    }

    /// The description of the option named `name` (`-x` or `--long`
    /// form). Options without a description are not reported.
    pub fn description_for_option(&self, name: &str) -> Option<&str> {
        let bytes = name.as_bytes();
        if bytes.len() < 2 || bytes[0] != b'-' {
            return None;
        }
        let has_double_dash = bytes[1] == b'-';

        for opt in &self.all_options {
            if opt.description.is_empty() {
                continue;
            }
            let matches = match opt.kind {
                options::OptionKind::Short | options::OptionKind::SingleLong => {
                    opt.name.slice(&self.source) == &name[1..]
                }
                options::OptionKind::DoubleLong => {
                    has_double_dash && opt.name.slice(&self.source) == &name[2..]
                }
            };
            if matches {
                return Some(opt.description.slice(&self.source));
            }
        }
        None
    }

    /// Program names, in first-occurrence order across the usage
    /// alternatives.
    pub fn command_names(&self) -> Vec<&str> {
        let mut result: Vec<&str> = Vec::new();
        for usage in &self.usages {
            let name = usage.prog_name.slice(&self.source);
            if !result.contains(&name) {
                result.push(name);
            }
        }
        result
    }

    /// Every variable of the document — `Usage:` variables plus option
    /// value variables — sorted and deduplicated, angle brackets
    /// included.
    pub fn variables(&self) -> Vec<&str> {
        let mut result: Vec<&str> = self
            .all_variables
            .iter()
            .map(|range| range.slice(&self.source))
            .collect();
        for opt in &self.all_options {
            if opt.has_value() {
                result.push(opt.value.slice(&self.source));
            }
        }
        result.sort_unstable();
        result.dedup();
        result
    }

    fn match_argv(
        &self,
        argv: &[String],
        flags: ParseFlags,
        positionals: &[argv::Positional],
        resolved: &[argv::ResolvedOption],
    ) -> (BTreeMap<String, Argument>, Vec<usize>) {
        let mut ctx = MatchContext::new(flags, positionals, resolved, argv);
        let init = MatchState {
            consumed_options: vec![false; resolved.len()],
            ..MatchState::default()
        };
        let matcher = Matcher {
            src: &self.source,
            shortcut_options: &self.shortcut_options,
        };
        let states = matcher.match_usages(&self.usages, &init, &mut ctx);
        debug!(states = states.len(), "matched argv against usage tree");

        let mut best: Option<(usize, Vec<usize>)> = None;
        for (i, state) in states.iter().enumerate() {
            let unused = ctx.unused_arguments(state);
            let better = match &best {
                None => true,
                Some((_, best_unused)) => unused.len() < best_unused.len(),
            };
            if better {
                let complete = unused.is_empty();
                best = Some((i, unused));
                if complete {
                    break;
                }
            }
        }

        match best {
            Some((i, unused)) => (
                self.finalize_option_map(states[i].option_map.clone(), flags),
                unused,
            ),
            None => (
                self.finalize_option_map(BTreeMap::new(), flags),
                (0..argv.len()).collect(),
            ),
        }
    }

    /// Enriches the winning map under `generate_empty_args`: an empty
    /// entry for every catalog option, variable, and fixed command, and
    /// declared defaults where no value was bound.
    fn finalize_option_map(
        &self,
        map: BTreeMap<String, Argument>,
        flags: ParseFlags,
    ) -> BTreeMap<String, Argument> {
        if !flags.generate_empty_args {
            return map;
        }

        let mut result = map;
        for opt in &self.all_options {
            let argument = result.entry(opt.longest_name(&self.source)).or_default();
            if !opt.default_value.is_empty() && argument.values.is_empty() {
                argument
                    .values
                    .push(opt.default_value.slice(&self.source).to_string());
            }
        }
        for variable in &self.all_variables {
            result
                .entry(variable.slice(&self.source).to_string())
                .or_default();
        }
        for fixed in &self.all_static_arguments {
            result
                .entry(fixed.slice(&self.source).to_string())
                .or_default();
        }
        result
    }
}
