//! Argv tokenization: separating raw arguments into positionals and
//! resolved options.
//!
//! Each argv token is classified by prefix. `--` ends option parsing
//! outright. A `--name` token is a double-dash long option. A single-dash
//! token is ambiguous — `-std=c++` is a single-dash long, `-DNDEBUG` is a
//! short with a glued value, `-cf x` is a cluster of shorts — so the three
//! interpretations are tried in that order, and only a total failure
//! surfaces errors (with the short-side errors listed first, since a
//! glued-value reading is usually the intended one).

use argdoc_core::{Diagnostic, ErrorCode, ParseFlags, Range};

use crate::options::{OptionKind, OptionRecord, Separator};

/// A positional argument, by argv slot.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Positional {
    pub idx_in_argv: usize,
}

/// An argv occurrence matched against a catalog option.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolvedOption {
    /// The catalog option this occurrence resolved to.
    pub option: OptionRecord,
    /// Argv slot holding the option name.
    pub name_idx_in_argv: usize,
    /// Argv slot holding the value, when the option takes one. Equal to
    /// `name_idx_in_argv` for `--foo=bar` and `-Dvalue` forms.
    pub value_idx_in_argv: Option<usize>,
    /// The value's range within that slot.
    pub value_range_in_arg: Range,
}

/// The tokenizer's output: positional slots, resolved options, and — when
/// suggestions were requested — the value placeholder of a trailing option
/// still waiting for its argument.
#[derive(Debug, Default)]
pub(crate) struct ArgvSeparation {
    pub positionals: Vec<Positional>,
    pub resolved: Vec<ResolvedOption>,
    pub suggestion: Option<String>,
}

/// Walks argv left to right, resolving option tokens against `options`
/// and collecting everything else as positionals. Diagnostics are
/// appended to `errors`; the caller decides whether to surface them.
pub(crate) fn separate_argv(
    src: &str,
    argv: &[String],
    options: &[OptionRecord],
    flags: ParseFlags,
    errors: &mut Vec<Diagnostic>,
    collect_suggestion: bool,
) -> ArgvSeparation {
    let tokenizer = Tokenizer {
        src,
        argv,
        options,
        flags,
        collect_suggestion,
    };
    let mut out = ArgvSeparation::default();

    let mut idx = 0;
    while idx < argv.len() {
        let arg = &argv[idx];
        if arg == "--" {
            // Everything after a literal -- is positional.
            idx += 1;
            while idx < argv.len() {
                out.positionals.push(Positional { idx_in_argv: idx });
                idx += 1;
            }
            break;
        } else if arg.starts_with("--") {
            if !tokenizer.parse_long(OptionKind::DoubleLong, &mut idx, &mut out, errors) {
                idx += 1;
            }
        } else if arg.starts_with('-') && arg.len() > 1 {
            // The three single-dash readings, each with its own error list
            // so a successful branch suppresses the failed ones.
            let mut long_errors = Vec::new();
            let mut short_errors = Vec::new();
            if tokenizer.parse_long(OptionKind::SingleLong, &mut idx, &mut out, &mut long_errors)
                || tokenizer.parse_unseparated_short(&mut idx, &mut out, &mut short_errors)
                || tokenizer.parse_short(&mut idx, &mut out, &mut short_errors)
            {
                // Resolved; branch errors are dropped.
            } else {
                // Total failure: surface this token's errors, short-side
                // first, after whatever earlier tokens recorded.
                errors.extend(short_errors);
                errors.extend(long_errors);
                idx += 1;
            }
        } else {
            // Positional. A bare - lands here too; it conventionally
            // stands for stdin.
            out.positionals.push(Positional { idx_in_argv: idx });
            idx += 1;
        }
    }

    out
}

struct Tokenizer<'a> {
    src: &'a str,
    argv: &'a [String],
    options: &'a [OptionRecord],
    flags: ParseFlags,
    collect_suggestion: bool,
}

impl Tokenizer<'_> {
    /// Resolves a long option (`--name[=value]`, or the single-dash
    /// `-name` form). On a miss with prefix resolution enabled, an
    /// unambiguous prefix of a catalog name also matches.
    fn parse_long(
        &self,
        kind: OptionKind,
        idx: &mut usize,
        out: &mut ArgvSeparation,
        errors: &mut Vec<Diagnostic>,
    ) -> bool {
        let arg = &self.argv[*idx];
        let mut arg_opt = OptionRecord::parse_from_argument(arg);
        // A one-character single-dash token scans as a short; it is a
        // single-dash long for this branch's purposes.
        if kind == OptionKind::SingleLong && arg_opt.kind == OptionKind::Short {
            arg_opt.kind = OptionKind::SingleLong;
        }
        debug_assert_eq!(arg_opt.kind, kind);

        let arg_name = arg_opt.name.slice(arg);
        let mut matched: Option<&OptionRecord> = None;
        for opt in self.options {
            if opt.kind == kind && opt.name.slice(self.src) == arg_name {
                matched = Some(opt);
                break;
            }
        }

        if matched.is_none() && self.flags.resolve_unambiguous_prefixes {
            let prefix_matches: Vec<&OptionRecord> = self
                .options
                .iter()
                .filter(|opt| {
                    opt.kind == kind
                        && opt.name.len > arg_opt.name.len
                        && opt.name.slice(self.src).starts_with(arg_name)
                })
                .collect();
            if prefix_matches.len() > 1 {
                errors.push(Diagnostic::in_argv(
                    ErrorCode::AmbiguousPrefixMatch,
                    *idx,
                    0,
                    "Ambiguous prefix match",
                ));
            } else if prefix_matches.len() == 1 {
                matched = Some(prefix_matches[0]);
            }
        }

        let Some(matched) = matched else {
            errors.push(Diagnostic::in_argv(
                ErrorCode::UnknownOption,
                *idx,
                0,
                "Unknown long option",
            ));
            return false;
        };

        let mut errored = false;
        let name_idx = *idx;
        let mut value_idx = None;
        let mut value_range = Range::EMPTY;
        if matched.has_value() {
            if arg_opt.has_value() {
                // --foo=bar: name and value share the slot.
                value_range = arg_opt.value;
                value_idx = Some(*idx);
            } else if *idx + 1 < self.argv.len() {
                // --foo bar: the next slot is the value, whole.
                *idx += 1;
                value_idx = Some(*idx);
                value_range = Range::new(0, self.argv[*idx].len());
            } else if self.flags.generate_suggestions && self.collect_suggestion {
                // Last token, value pending: the declared variable is the
                // completion.
                out.suggestion = Some(matched.value.slice(self.src).to_string());
                errored = true;
            } else {
                errors.push(Diagnostic::in_argv(
                    ErrorCode::OptionHasMissingArgument,
                    *idx,
                    0,
                    "Option expects an argument",
                ));
                errored = true;
            }
        } else if arg_opt.has_value() {
            errors.push(Diagnostic::in_argv(
                ErrorCode::OptionUnexpectedArgument,
                *idx,
                0,
                "Option does not expect an argument",
            ));
            errored = true;
        }

        if !errored
            && self.flags.short_options_strict_separators
            && arg_opt.separator != matched.separator
        {
            errors.push(Diagnostic::in_argv(
                ErrorCode::WrongSeparator,
                *idx,
                0,
                "Option expects a different separator",
            ));
            errored = true;
        }

        if errored {
            return false;
        }
        out.resolved.push(ResolvedOption {
            option: *matched,
            name_idx_in_argv: name_idx,
            value_idx_in_argv: value_idx,
            value_range_in_arg: value_range,
        });
        *idx += 1;
        true
    }

    /// Resolves a glued short value, `-DNDEBUG` style. Only short options
    /// declared without a separator qualify (any value-taking short, when
    /// separators are relaxed).
    fn parse_unseparated_short(
        &self,
        idx: &mut usize,
        out: &mut ArgvSeparation,
        errors: &mut Vec<Diagnostic>,
    ) -> bool {
        let arg = &self.argv[*idx];
        let relaxed = !self.flags.short_options_strict_separators;

        let matched = self.options.iter().find(|opt| {
            opt.kind == OptionKind::Short
                && opt.has_value()
                && (relaxed || opt.separator == Separator::None)
                && self.src.as_bytes()[opt.name.start] == arg.as_bytes()[1]
        });
        let Some(matched) = matched else {
            return false;
        };

        if arg.len() <= 2 {
            errors.push(Diagnostic::in_argv(
                ErrorCode::OptionHasMissingArgument,
                *idx,
                0,
                "Option expects an argument",
            ));
            return false;
        }

        out.resolved.push(ResolvedOption {
            option: *matched,
            name_idx_in_argv: *idx,
            value_idx_in_argv: Some(*idx),
            value_range_in_arg: Range::new(2, arg.len() - 2),
        });
        *idx += 1;
        true
    }

    /// Resolves a cluster of shorts (`-cf`), where each character past the
    /// dash is its own option and only the last may take a value — from
    /// the following slot, whole.
    fn parse_short(
        &self,
        idx: &mut usize,
        out: &mut ArgvSeparation,
        errors: &mut Vec<Diagnostic>,
    ) -> bool {
        let arg = &self.argv[*idx];
        let bytes = arg.as_bytes();
        let mut errored = false;

        let mut cluster: Vec<&OptionRecord> = Vec::new();
        for pos in 1..bytes.len() {
            let matched = self.options.iter().find(|opt| {
                opt.kind == OptionKind::Short && self.src.as_bytes()[opt.name.start] == bytes[pos]
            });
            match matched {
                Some(opt) => cluster.push(opt),
                None => {
                    errors.push(Diagnostic::in_argv(
                        ErrorCode::UnknownOption,
                        *idx,
                        pos,
                        "Unknown short option",
                    ));
                    errored = true;
                    break;
                }
            }
        }

        let mut last_takes_value = false;
        if !errored {
            for (pos, opt) in cluster.iter().enumerate() {
                if opt.has_value() {
                    if pos + 1 == cluster.len() {
                        last_takes_value = true;
                    } else {
                        // The character offset in the token is pos + 1,
                        // accounting for the dash.
                        errors.push(Diagnostic::in_argv(
                            ErrorCode::OptionUnexpectedArgument,
                            *idx,
                            pos + 1,
                            "Option may not have a value unless it is the last option",
                        ));
                    }
                }
            }
        }

        let name_idx = *idx;
        let mut value_idx = None;
        let mut value_range = Range::EMPTY;
        if !errored && last_takes_value {
            if *idx + 1 < self.argv.len() {
                value_idx = Some(*idx + 1);
                value_range = Range::new(0, self.argv[*idx + 1].len());
            } else if self.flags.generate_suggestions && self.collect_suggestion {
                let last = cluster.last().expect("a value-taking cluster is non-empty");
                out.suggestion = Some(last.value.slice(self.src).to_string());
                errored = true;
            } else {
                errors.push(Diagnostic::in_argv(
                    ErrorCode::OptionHasMissingArgument,
                    *idx,
                    0,
                    "Option expects an argument",
                ));
                errored = true;
            }
        }

        if errored {
            return false;
        }
        for (pos, opt) in cluster.iter().enumerate() {
            let is_last = pos + 1 == cluster.len();
            out.resolved.push(ResolvedOption {
                option: **opt,
                name_idx_in_argv: name_idx,
                value_idx_in_argv: if is_last && last_takes_value {
                    value_idx
                } else {
                    None
                },
                value_range_in_arg: if is_last && last_takes_value {
                    value_range
                } else {
                    Range::EMPTY
                },
            });
        }
        *idx += if last_takes_value { 2 } else { 1 };
        true
    }
}
