//! Cursor scanning over the shared document text.
//!
//! Every routine here works on byte offsets into the one owned document
//! string. The delimiters the scanners care about are all ASCII, so
//! byte-wise scanning never splits a UTF-8 sequence: multi-byte characters
//! fall entirely inside "valid name character" runs.

use argdoc_core::Range;

/// Characters that may appear in an option or command name. Everything
/// outside the delimiter set is allowed, non-ASCII included.
pub(crate) fn byte_is_valid_in_parameter(b: u8) -> bool {
    !matches!(
        b,
        b'.' | b'|' | b'<' | b'>' | b',' | b'=' | b'(' | b')' | b'[' | b']' | b' ' | b'\t' | b'\n'
    )
}

/// Characters that may appear inside a `<variable>` word.
pub(crate) fn byte_is_valid_in_bracketed_word(b: u8) -> bool {
    !matches!(b, b'|' | b'(' | b')' | b'[' | b']' | b'>' | b'\t' | b'\n')
}

/// Consumes bytes from the front of `remaining` while `pred` holds and
/// returns the consumed range.
pub(crate) fn scan_while<F>(src: &str, remaining: &mut Range, pred: F) -> Range
where
    F: Fn(u8) -> bool,
{
    let bytes = src.as_bytes();
    let mut result = Range::new(remaining.start, 0);
    while result.end() < remaining.end() && pred(bytes[result.end()]) {
        result.len += 1;
        remaining.start += 1;
        remaining.len -= 1;
    }
    result
}

/// Consumes a single expected byte from the front of `remaining`. The
/// returned range is empty when the byte does not match.
pub(crate) fn scan_byte(src: &str, remaining: &mut Range, b: u8) -> Range {
    let mut result = Range::new(remaining.start, 0);
    if !remaining.is_empty() && src.as_bytes()[remaining.start] == b {
        result.len = 1;
        remaining.start += 1;
        remaining.len -= 1;
    }
    result
}

/// Returns `range` with leading and trailing ASCII whitespace removed.
pub(crate) fn trim_whitespace(src: &str, range: Range) -> Range {
    let bytes = src.as_bytes();
    let mut left = range.start;
    let mut right = range.end();
    while left < right && bytes[left].is_ascii_whitespace() {
        left += 1;
    }
    while right > left && bytes[right - 1].is_ascii_whitespace() {
        right -= 1;
    }
    Range::new(left, right - left)
}

/// Computes the display indent of a leading-whitespace run. A tab advances
/// to the next multiple of 4, even when already on one.
pub(crate) fn compute_indent(src: &str, leading: Range) -> usize {
    const TABSTOP: usize = 4;
    let mut result = 0;
    for &b in &src.as_bytes()[leading.start..leading.end()] {
        if b == b'\t' {
            result = (result + TABSTOP) / TABSTOP * TABSTOP;
        } else {
            result += 1;
        }
    }
    result
}

/// Finds `needle` in `src` at or after `from`, ignoring ASCII case.
///
/// Only ASCII case folding is applied: a non-ASCII byte never equals an
/// ASCII needle byte.
pub(crate) fn find_ascii_case_insensitive(src: &str, needle: &str, from: usize) -> Option<usize> {
    let haystack = src.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || from > haystack.len() || needle.len() > haystack.len() - from {
        return None;
    }
    (from..=haystack.len() - needle.len())
        .find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

/// Iterates the logical lines of `src` inside `within`. Each yielded range
/// includes its trailing newline (except possibly the last); lines are
/// never empty.
pub(crate) fn lines(src: &str, within: Range) -> LineIter<'_> {
    LineIter {
        src,
        pos: within.start,
        end: within.end(),
    }
}

#[derive(Debug, Clone)]
pub(crate) struct LineIter<'a> {
    src: &'a str,
    pos: usize,
    end: usize,
}

impl Iterator for LineIter<'_> {
    type Item = Range;

    fn next(&mut self) -> Option<Range> {
        if self.pos >= self.end {
            return None;
        }
        let start = self.pos;
        let line_end = match self.src.as_bytes()[start..self.end]
            .iter()
            .position(|&b| b == b'\n')
        {
            Some(offset) => start + offset + 1,
            None => self.end,
        };
        self.pos = line_end;
        Some(Range::new(start, line_end - start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whole(src: &str) -> Range {
        Range::new(0, src.len())
    }

    #[test]
    fn test_scan_while_consumes_prefix() {
        let src = "---rest";
        let mut remaining = whole(src);
        let dashes = scan_while(src, &mut remaining, |b| b == b'-');
        assert_eq!(dashes, Range::new(0, 3));
        assert_eq!(remaining, Range::new(3, 4));
    }

    #[test]
    fn test_scan_byte_only_on_match() {
        let src = "=x";
        let mut remaining = whole(src);
        assert_eq!(scan_byte(src, &mut remaining, b'='), Range::new(0, 1));
        assert!(scan_byte(src, &mut remaining, b'=').is_empty());
        assert_eq!(remaining, Range::new(1, 1));
    }

    #[test]
    fn test_trim_whitespace() {
        let src = "  word \n";
        assert_eq!(trim_whitespace(src, whole(src)).slice(src), "word");
        assert!(trim_whitespace("   ", whole("   ")).is_empty());
    }

    #[test]
    fn test_compute_indent_tabs_round_up() {
        let src = "\t\tx";
        assert_eq!(compute_indent(src, Range::new(0, 2)), 8);
        let src = "  \tx";
        // Two spaces, then the tab jumps to the next multiple of 4.
        assert_eq!(compute_indent(src, Range::new(0, 3)), 4);
        let src = "    \tx";
        // Already on a multiple of 4, the tab still advances.
        assert_eq!(compute_indent(src, Range::new(0, 5)), 8);
    }

    #[test]
    fn test_find_ascii_case_insensitive() {
        assert_eq!(find_ascii_case_insensitive("My USAGE: here", "usage:", 0), Some(3));
        assert_eq!(find_ascii_case_insensitive("usage: usage:", "usage:", 1), Some(7));
        assert_eq!(find_ascii_case_insensitive("nothing", "usage:", 0), None);
    }

    #[test]
    fn test_lines_include_trailing_newline() {
        let src = "a\nbb\nc";
        let collected: Vec<&str> = lines(src, whole(src)).map(|r| r.slice(src)).collect();
        assert_eq!(collected, vec!["a\n", "bb\n", "c"]);
    }

    #[test]
    fn test_lines_respect_cap() {
        let src = "a\nbb\nc";
        let collected: Vec<&str> = lines(src, Range::new(0, 3)).map(|r| r.slice(src)).collect();
        assert_eq!(collected, vec!["a\n", "b"]);
    }
}
