//! Option records and the `Options:` section parser.
//!
//! An option spec line looks like any of:
//!
//! ```text
//! --foo
//! --foo <bar>
//! --foo=<bar>
//! -f, --foo=<bar>  Description text. [default: value]
//! -DNDEBUG
//! ```
//!
//! Two consecutive spaces split the option part from the description, the
//! description may continue on following lines, and names grouped on one
//! line alias each other: the last long name becomes the key every record
//! on the line deduplicates and reports under, and the last `<variable>`
//! is shared by records that declare none.

use std::sync::LazyLock;

use argdoc_core::{Diagnostic, ErrorCode, Range};
use regex::Regex;

use crate::scan::{
    byte_is_valid_in_bracketed_word, byte_is_valid_in_parameter, lines, scan_byte, scan_while,
    trim_whitespace,
};
use crate::sections::section_ranges;

/// How an option is separated from its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Separator {
    /// `--foo <bar>`, or an option without a value.
    Space,
    /// `--foo=<bar>`.
    Equals,
    /// `-D<value>`: the value is glued to the name. Short options only.
    None,
}

/// Option shape, derived from dash count and name length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OptionKind {
    /// One dash, one-character name: `-v`.
    Short,
    /// One dash, multi-character name: `-std`.
    SingleLong,
    /// Two dashes: `--verbose`.
    DoubleLong,
}

/// One parsed option.
///
/// All ranges index the document text, except when a record is produced by
/// [`OptionRecord::parse_from_argument`], where they index that argv token
/// instead; such records stay local to the tokenizer.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OptionRecord {
    /// The name, dashes excluded. Non-empty for any cataloged option.
    pub name: Range,
    /// The `<variable>` bound to this option, brackets included. Empty
    /// when the option takes no value.
    pub value: Range,
    pub leading_dashes: usize,
    pub separator: Separator,
    pub kind: OptionKind,
    /// Description text from the spec line.
    pub description: Range,
    /// The text inside `[default: …]`, if any.
    pub default_value: Range,
    /// Name range of the last long option grouped on the same spec line;
    /// short aliases inherit the long key through this.
    pub corresponding_long_name: Range,
}

impl OptionRecord {
    pub(crate) fn new(name: Range, value: Range, leading_dashes: usize, separator: Separator) -> Self {
        let kind = if leading_dashes > 1 {
            OptionKind::DoubleLong
        } else if name.len > 1 {
            OptionKind::SingleLong
        } else {
            OptionKind::Short
        };
        OptionRecord {
            name,
            value,
            leading_dashes,
            separator,
            kind,
            description: Range::EMPTY,
            default_value: Range::EMPTY,
            corresponding_long_name: Range::EMPTY,
        }
    }

    pub(crate) fn has_value(&self) -> bool {
        !self.value.is_empty()
    }

    /// Name equality: same shape, same name text of the shared source.
    /// Aliases (`-q` vs `--quiet`) are distinct names; what ties them
    /// together is the shared `corresponding_long_name` key.
    pub(crate) fn has_same_name(&self, other: &OptionRecord, src: &str) -> bool {
        self.kind == other.kind && self.name.slice(src) == other.name.slice(src)
    }

    /// The option's own name with its dashes, e.g. `-v` or `--verbose`.
    pub(crate) fn name_as_string(&self, src: &str) -> String {
        let dashes = match self.kind {
            OptionKind::Short | OptionKind::SingleLong => "-",
            OptionKind::DoubleLong => "--",
        };
        format!("{dashes}{}", self.name.slice(src))
    }

    /// The name the option reports under in the final map: the shared long
    /// name when present, its own name otherwise.
    pub(crate) fn longest_name(&self, src: &str) -> String {
        if self.corresponding_long_name.is_empty() {
            self.name_as_string(src)
        } else {
            format!("--{}", self.corresponding_long_name.slice(src))
        }
    }

    /// Parses one option from the front of `remaining`, which must start at
    /// a dash. Consumes through the option name and any `=`/`<variable>`
    /// tail, recording findings without aborting.
    pub(crate) fn parse_from_source(
        src: &str,
        remaining: &mut Range,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> OptionRecord {
        let start = remaining.start;
        let leading_dashes = scan_while(src, remaining, |b| b == b'-');
        if leading_dashes.len > 2 {
            diagnostics.push(Diagnostic::in_doc(
                ErrorCode::ExcessiveDashes,
                start,
                "Too many dashes",
            ));
        }

        let name = scan_while(src, remaining, byte_is_valid_in_parameter);

        let space_separator = scan_while(src, remaining, |b| b.is_ascii_whitespace());

        let equals = scan_while(src, remaining, |b| b == b'=');
        if equals.len > 1 {
            diagnostics.push(Diagnostic::in_doc(
                ErrorCode::ExcessiveEqualSigns,
                equals.start,
                "Too many equal signs",
            ));
        }

        scan_while(src, remaining, |b| b.is_ascii_whitespace());

        let mut value = Range::EMPTY;
        let open_sign = scan_byte(src, remaining, b'<');
        if !open_sign.is_empty() {
            let variable_name = scan_while(src, remaining, byte_is_valid_in_bracketed_word);
            let close_sign = scan_byte(src, remaining, b'>');
            if variable_name.is_empty() {
                diagnostics.push(Diagnostic::in_doc(
                    ErrorCode::InvalidVariableName,
                    variable_name.start,
                    "Missing variable name",
                ));
            } else if close_sign.is_empty() {
                diagnostics.push(Diagnostic::in_doc(
                    ErrorCode::InvalidVariableName,
                    open_sign.start,
                    "Missing '>' to match this '<'",
                ));
            } else {
                value.merge(open_sign);
                value.merge(variable_name);
                value.merge(close_sign);
            }

            if !close_sign.is_empty()
                && !remaining.is_empty()
                && byte_is_valid_in_parameter(src.as_bytes()[remaining.start])
            {
                diagnostics.push(Diagnostic::in_doc(
                    ErrorCode::InvalidVariableName,
                    remaining.start,
                    "Extra characters after closing '>'",
                ));
            }
        }

        if value.is_empty() && !equals.is_empty() {
            diagnostics.push(Diagnostic::in_doc(
                ErrorCode::InvalidVariableName,
                equals.start,
                "Missing variable for this assignment",
            ));
        }

        // 'foo = <bar>' and 'foo=<bar>' are equals-separated; otherwise a
        // space decides between 'foo <bar>' and the glued 'foo<bar>'.
        let separator = if value.is_empty() {
            Separator::Space
        } else if !equals.is_empty() {
            Separator::Equals
        } else if !space_separator.is_empty() {
            Separator::Space
        } else {
            Separator::None
        };

        if separator == Separator::None && (leading_dashes.len > 1 || name.len > 1) {
            diagnostics.push(Diagnostic::in_doc(
                ErrorCode::BadOptionSeparator,
                name.start,
                "Long options must use a space or equals separator",
            ));
        }

        if name.is_empty() {
            diagnostics.push(Diagnostic::in_doc(
                ErrorCode::InvalidOptionName,
                name.start,
                "Missing option name",
            ));
        }

        OptionRecord::new(name, value, leading_dashes.len, separator)
    }

    /// Parses an argv token of the form `--name[=value]`. The resulting
    /// ranges index the token, and the value (if any) is everything past
    /// the `=`, unrestricted.
    pub(crate) fn parse_from_argument(arg: &str) -> OptionRecord {
        let mut remaining = Range::new(0, arg.len());
        let leading_dashes = scan_while(arg, &mut remaining, |b| b == b'-');
        let name = scan_while(arg, &mut remaining, byte_is_valid_in_parameter);
        let equals = scan_byte(arg, &mut remaining, b'=');

        let mut value = Range::EMPTY;
        if !equals.is_empty() {
            value = remaining;
        }

        let separator = if equals.is_empty() {
            Separator::Space
        } else {
            Separator::Equals
        };
        OptionRecord::new(name, value, leading_dashes.len, separator)
    }
}

/// Parses every `Options:` section of the document into the shortcut
/// option list.
pub(crate) fn parse_options_section(src: &str, diagnostics: &mut Vec<Diagnostic>) -> Vec<OptionRecord> {
    let mut result = Vec::new();

    for section in section_ranges(src, "Options:", false) {
        let mut iter = lines(src, section).peekable();
        while let Some(line) = iter.next() {
            let trimmed = trim_whitespace(src, line);
            if trimmed.is_empty() {
                continue;
            }
            if !line_contains_option_spec(src, line) {
                diagnostics.push(Diagnostic::in_doc(
                    ErrorCode::InvalidOptionName,
                    line.start,
                    "Option specs must start with a leading space and a dash",
                ));
                continue;
            }

            // The spec extends through following lines until the next one
            // that itself starts an option spec.
            let mut spec = line;
            while let Some(&next) = iter.peek() {
                if line_contains_option_spec(src, next) {
                    break;
                }
                spec.merge(next);
                iter.next();
            }

            scan_while(src, &mut spec, |b| b.is_ascii_whitespace());
            result.extend(parse_one_option_spec(src, spec, diagnostics));
        }
    }

    result
}

/// A line opens an option spec when it has leading whitespace followed by
/// a dash.
fn line_contains_option_spec(src: &str, line: Range) -> bool {
    let mut remaining = line;
    let space = scan_while(src, &mut remaining, |b| b.is_ascii_whitespace());
    let dashes = scan_while(src, &mut remaining, |b| b == b'-');
    !space.is_empty() && !dashes.is_empty()
}

static DEFAULT_NEEDLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[default:").expect("static regex must compile"));

/// Parses one option spec (from its first dash through the end of its
/// description) into the records it declares.
fn parse_one_option_spec(
    src: &str,
    spec: Range,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<OptionRecord> {
    let mut result = Vec::new();
    let end = spec.end();

    // Two consecutive spaces separate the options from the description.
    let options_end = match src[spec.start..end].find("  ") {
        Some(offset) => spec.start + offset,
        None => end,
    };

    let description = trim_whitespace(src, Range::new(options_end, end - options_end));

    let mut default_value = Range::EMPTY;
    if !description.is_empty()
        && let Some(found) = DEFAULT_NEEDLE.find(description.slice(src))
    {
        // First occurrence wins when the annotation appears twice.
        let needle_pos = description.start + found.start();
        let mut value_start = description.start + found.end();
        while value_start < description.end() && src.as_bytes()[value_start].is_ascii_whitespace() {
            value_start += 1;
        }
        match src.as_bytes()[value_start..description.end()]
            .iter()
            .position(|&b| b == b']')
        {
            Some(offset) => default_value = Range::new(value_start, offset),
            None => diagnostics.push(Diagnostic::in_doc(
                ErrorCode::MissingCloseBracketInDefault,
                needle_pos,
                "Missing ']' to match opening '['",
            )),
        }
    }

    let mut remaining = Range::new(spec.start, options_end - spec.start);
    scan_while(src, &mut remaining, |b| b.is_ascii_whitespace());

    let mut last_long_name = Range::EMPTY;
    let mut last_value = Range::EMPTY;
    while !remaining.is_empty() {
        if src.as_bytes()[remaining.start] != b'-' {
            diagnostics.push(Diagnostic::in_doc(
                ErrorCode::InvalidOptionName,
                remaining.start,
                "Not an option",
            ));
            break;
        }

        let mut opt = OptionRecord::parse_from_source(src, &mut remaining, diagnostics);
        if opt.name.is_empty() {
            break;
        }
        opt.description = description;
        opt.default_value = default_value;

        if opt.kind == OptionKind::DoubleLong {
            last_long_name = opt.name;
        }
        if !opt.value.is_empty() {
            last_value = opt.value;
        }
        result.push(opt);

        // Names are separated by commas and/or spaces.
        scan_while(src, &mut remaining, |b| b.is_ascii_whitespace());
        scan_while(src, &mut remaining, |b| b == b',');
        scan_while(src, &mut remaining, |b| b.is_ascii_whitespace());
    }

    if !last_long_name.is_empty() {
        for opt in &mut result {
            opt.corresponding_long_name = last_long_name;
        }
    }

    // Aliases share the line's variable: '-m, --message <contents>' binds
    // the value through -m as well.
    for opt in &mut result {
        if opt.value.is_empty() {
            opt.value = last_value;
        }
    }

    result
}

/// Collapses options with the same name, keeping the record with the
/// longer description. Within the `Options:` section a duplicate is also
/// a diagnostic.
pub(crate) fn uniqueize(
    src: &str,
    options: &mut Vec<OptionRecord>,
    error_on_duplicates: bool,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut cursor = 0;
    while cursor < options.len() {
        let mut best = cursor;
        let mut duplicates = Vec::new();
        for probe in cursor + 1..options.len() {
            if options[cursor].has_same_name(&options[probe], src) {
                if error_on_duplicates {
                    diagnostics.push(Diagnostic::in_doc(
                        ErrorCode::OptionDuplicatedInOptionsSection,
                        options[probe].name.start,
                        "Option specified more than once",
                    ));
                }
                duplicates.push(probe);
                if options[probe].description.len > options[best].description.len {
                    best = probe;
                }
            }
        }
        if !duplicates.is_empty() {
            options[cursor] = options[best];
            for probe in duplicates.into_iter().rev() {
                options.remove(probe);
            }
        }
        cursor += 1;
    }
}
