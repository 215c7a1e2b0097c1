//! Section discovery over the document text.
//!
//! A header is any top-level line containing a colon: "top-level" means
//! indented no deeper than the previous header. The body of a section runs
//! until the next header or, normally, the next colon-free top-level line.
//! `Conditions:` opts into keeping those colon-free lines, since condition
//! bodies produced by variable expansion can be bare enumerations.

use argdoc_core::Range;

use crate::scan::{compute_indent, find_ascii_case_insensitive, lines, trim_whitespace};

/// Returns one range per occurrence of the section named by `needle`
/// (e.g. `"Options:"`, matched case-insensitively, colon included). Each
/// range begins just past the needle on the header line and extends
/// through the body lines.
pub(crate) fn section_ranges(src: &str, needle: &str, include_other_top_level: bool) -> Vec<Range> {
    let mut result = Vec::new();
    let mut in_section = false;
    let mut header_indent = usize::MAX;

    for mut line in lines(src, Range::new(0, src.len())) {
        let trimmed = trim_whitespace(src, line);
        let indent = compute_indent(src, Range::new(line.start, trimmed.start - line.start));

        let mut is_header = false;
        let mut is_other_top_level = false;
        let mut colon_pos = None;
        if !trimmed.is_empty() && indent <= header_indent {
            colon_pos = src.as_bytes()[trimmed.start..trimmed.end()]
                .iter()
                .position(|&b| b == b':')
                .map(|offset| trimmed.start + offset);
            is_header = colon_pos.is_some();
            is_other_top_level = colon_pos.is_none();
        }

        if is_other_top_level && !include_other_top_level {
            in_section = false;
        } else if is_header {
            header_indent = indent;
            let colon = colon_pos.expect("header lines carry a colon");
            let name_pos = find_ascii_case_insensitive(src, needle, trimmed.start);
            in_section = name_pos.is_some_and(|pos| pos < trimmed.end() && pos < colon);

            if in_section {
                result.push(Range::EMPTY);
                // The body starts right after the needle, so content on the
                // header line itself is kept.
                let body_start = name_pos.expect("in_section implies a needle position") + needle.len();
                line = Range::new(body_start, line.end() - body_start);
            }
        }

        if in_section
            && let Some(last) = result.last_mut()
        {
            last.merge(line);
        }
    }

    result
}
