//! The `Conditions:` section parser.
//!
//! A condition entry binds a variable to freeform condition text:
//!
//! ```text
//! Conditions:
//!   <pid>  __fish_complete_pids
//! ```
//!
//! Two consecutive spaces separate the variable from its text. Unlike the
//! other sections, colon-free top-level lines after an entry stay in the
//! section; variable expansion can leave a condition's alternatives as a
//! bare enumeration below it.

use std::collections::BTreeMap;

use argdoc_core::{Diagnostic, ErrorCode, Range};

use crate::scan::{lines, scan_while, trim_whitespace};
use crate::sections::section_ranges;

/// Parses every `Conditions:` section into a variable → condition-text
/// map. Keys keep their angle brackets.
pub(crate) fn parse_conditions_section(
    src: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> BTreeMap<String, Range> {
    let mut result = BTreeMap::new();

    for section in section_ranges(src, "Conditions:", true) {
        let mut iter = lines(src, section).peekable();
        while let Some(line) = iter.next() {
            let trimmed = trim_whitespace(src, line);
            if trimmed.is_empty() {
                continue;
            }
            if !line_contains_condition_spec(src, line) {
                diagnostics.push(Diagnostic::in_doc(
                    ErrorCode::InvalidVariableName,
                    line.start,
                    "Conditions must start with a variable like <var>",
                ));
                continue;
            }

            let mut spec = line;
            while let Some(&next) = iter.peek() {
                if line_contains_condition_spec(src, next) {
                    break;
                }
                spec.merge(next);
                iter.next();
            }

            let spec = trim_whitespace(src, spec);
            let Some(offset) = src[spec.start..spec.end()].find("  ") else {
                continue;
            };
            let sep = spec.start + offset;
            let key = trim_whitespace(src, Range::new(spec.start, sep - spec.start));
            let value = trim_whitespace(src, Range::new(sep, spec.end() - sep));

            if result.insert(key.slice(src).to_string(), value).is_some() {
                diagnostics.push(Diagnostic::in_doc(
                    ErrorCode::OneVariableMultipleConditions,
                    key.start,
                    "Variable already has a condition",
                ));
            }
        }
    }

    result
}

/// A line opens a condition entry when it has leading whitespace followed
/// by a `<`.
fn line_contains_condition_spec(src: &str, line: Range) -> bool {
    let mut remaining = line;
    let space = scan_while(src, &mut remaining, |b| b.is_ascii_whitespace());
    let open = scan_while(src, &mut remaining, |b| b == b'<');
    !space.is_empty() && !open.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_entry() {
        let doc = "Conditions:\n  <pid>  list_pids\n";
        let mut diagnostics = Vec::new();
        let map = parse_conditions_section(doc, &mut diagnostics);
        assert!(diagnostics.is_empty());
        assert_eq!(map["<pid>"].slice(doc), "list_pids");
    }

    #[test]
    fn test_duplicate_variable_is_a_diagnostic() {
        let doc = "Conditions:\n  <pid>  one\n  <pid>  two\n";
        let mut diagnostics = Vec::new();
        let map = parse_conditions_section(doc, &mut diagnostics);
        assert_eq!(map.len(), 1);
        assert!(
            diagnostics
                .iter()
                .any(|d| d.code == ErrorCode::OneVariableMultipleConditions)
        );
    }

    #[test]
    fn test_bare_continuation_lines_join_the_entry() {
        let doc = "Conditions:\n  <level>  one of\n1\n2\n";
        let mut diagnostics = Vec::new();
        let map = parse_conditions_section(doc, &mut diagnostics);
        let value = map["<level>"].slice(doc);
        assert!(value.starts_with("one of"));
        assert!(value.contains('2'));
    }

    #[test]
    fn test_entry_without_separator_is_skipped() {
        let doc = "Conditions:\n  <pid>\n";
        let mut diagnostics = Vec::new();
        let map = parse_conditions_section(doc, &mut diagnostics);
        assert!(map.is_empty());
        assert!(diagnostics.is_empty());
    }
}
