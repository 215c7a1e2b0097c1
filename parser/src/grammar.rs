//! The usage grammar: tokenizing `Usage:` patterns and building the tree
//! the matcher walks.
//!
//! Each non-empty line of the `Usage:` section is one usage alternative:
//! a program name followed by an expression list. Within a line:
//!
//! ```text
//! prog command <file>... [-q | --loud] (--speed <knots>) [options]
//! ```
//!
//! Words starting with a dash are option clauses, `<bracketed>` words are
//! variable clauses, anything else is a fixed-word clause. Groups nest via
//! `(…)` and `[…]`, `|` separates alternatives, and a trailing `...`
//! marks repetition. `[options]` is the shortcut production standing for
//! the whole `Options:` catalog.

use argdoc_core::{Diagnostic, ErrorCode, Range};

use crate::options::{OptionKind, OptionRecord, Separator};
use crate::scan::{lines, trim_whitespace};

/// One usage alternative: a program name and an optional pattern body.
#[derive(Debug, Clone)]
pub(crate) struct Usage {
    pub prog_name: Range,
    pub body: Option<AlternationList>,
}

/// `a | b | c` — expression lists separated by bars. A single branch is
/// the common case.
#[derive(Debug, Clone)]
pub(crate) struct AlternationList {
    pub branches: Vec<ExpressionList>,
}

/// A sequence of expressions matched in order.
#[derive(Debug, Clone)]
pub(crate) struct ExpressionList {
    pub expressions: Vec<Expression>,
}

#[derive(Debug, Clone)]
pub(crate) struct Expression {
    pub production: Production,
    pub ellipsis: bool,
}

#[derive(Debug, Clone)]
pub(crate) enum Production {
    /// A bare clause.
    Simple(SimpleClause),
    /// `(…)`: a required group.
    Group(AlternationList),
    /// `[…]`: an optional group.
    Optional(AlternationList),
    /// `[options]`: the catalog shortcut.
    OptionsShortcut,
}

#[derive(Debug, Clone)]
pub(crate) enum SimpleClause {
    Option(OptionRecord),
    Fixed(Range),
    Variable(Range),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Word,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Bar,
    Ellipsis,
}

#[derive(Debug, Clone, Copy)]
struct Token {
    kind: TokenKind,
    range: Range,
}

fn tokenize(src: &str, range: Range) -> Vec<Token> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = range.start;
    let end = range.end();

    let is_ellipsis_at = |i: usize| {
        i + 2 < end && bytes[i] == b'.' && bytes[i + 1] == b'.' && bytes[i + 2] == b'.'
    };

    while i < end {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let punct = match b {
            b'(' => Some(TokenKind::OpenParen),
            b')' => Some(TokenKind::CloseParen),
            b'[' => Some(TokenKind::OpenBracket),
            b']' => Some(TokenKind::CloseBracket),
            b'|' => Some(TokenKind::Bar),
            _ => None,
        };
        if let Some(kind) = punct {
            tokens.push(Token {
                kind,
                range: Range::new(i, 1),
            });
            i += 1;
            continue;
        }
        if is_ellipsis_at(i) {
            tokens.push(Token {
                kind: TokenKind::Ellipsis,
                range: Range::new(i, 3),
            });
            i += 3;
            continue;
        }
        let start = i;
        while i < end {
            let b = bytes[i];
            if b.is_ascii_whitespace() || matches!(b, b'(' | b')' | b'[' | b']' | b'|') {
                break;
            }
            if is_ellipsis_at(i) {
                break;
            }
            i += 1;
        }
        tokens.push(Token {
            kind: TokenKind::Word,
            range: Range::new(start, i - start),
        });
    }

    tokens
}

/// Parses the whole `Usage:` section into usage alternatives, one per
/// non-empty line. Returns `None` on a structural failure, with the
/// reason recorded in `diagnostics`.
pub(crate) fn parse_usage_sections(
    src: &str,
    section: Range,
    shortcut_options: &[OptionRecord],
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<Vec<Usage>> {
    let mut usages = Vec::new();
    for line in lines(src, section) {
        let trimmed = trim_whitespace(src, line);
        if trimmed.is_empty() {
            continue;
        }
        let mut parser = UsageLineParser {
            src,
            tokens: tokenize(src, trimmed),
            pos: 0,
            shortcut_options,
            diagnostics,
        };
        usages.push(parser.parse_usage()?);
    }

    if usages.is_empty() {
        diagnostics.push(Diagnostic::in_doc(
            ErrorCode::EmptyUsagePattern,
            section.start,
            "Usage section has no usage patterns",
        ));
        return None;
    }
    Some(usages)
}

struct UsageLineParser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    shortcut_options: &'a [OptionRecord],
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl UsageLineParser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos];
        self.pos += 1;
        token
    }

    fn eat_ellipsis(&mut self) -> bool {
        if self.peek_kind() == Some(TokenKind::Ellipsis) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn starts_expression(kind: Option<TokenKind>) -> bool {
        matches!(
            kind,
            Some(TokenKind::Word | TokenKind::OpenParen | TokenKind::OpenBracket)
        )
    }

    fn parse_usage(&mut self) -> Option<Usage> {
        let prog_name = match self.peek() {
            Some(token) if token.kind == TokenKind::Word => {
                self.advance();
                token.range
            }
            _ => {
                self.diagnostics.push(Diagnostic::in_doc(
                    ErrorCode::EmptyUsagePattern,
                    self.peek().map_or(0, |t| t.range.start),
                    "Usage pattern must start with a program name",
                ));
                return None;
            }
        };

        let body = if self.pos < self.tokens.len() {
            Some(self.parse_alternation_list()?)
        } else {
            None
        };

        if let Some(stray) = self.peek() {
            let (code, text) = match stray.kind {
                TokenKind::CloseParen => (ErrorCode::MissingCloseParen, "Unmatched ')'"),
                TokenKind::CloseBracket => (ErrorCode::MissingCloseBracket, "Unmatched ']'"),
                _ => (ErrorCode::EmptyUsagePattern, "Unexpected token in usage pattern"),
            };
            self.diagnostics
                .push(Diagnostic::in_doc(code, stray.range.start, text));
            return None;
        }

        Some(Usage { prog_name, body })
    }

    fn parse_alternation_list(&mut self) -> Option<AlternationList> {
        let mut branches = vec![self.parse_expression_list()?];
        while self.peek_kind() == Some(TokenKind::Bar) {
            self.advance();
            branches.push(self.parse_expression_list()?);
        }
        Some(AlternationList { branches })
    }

    fn parse_expression_list(&mut self) -> Option<ExpressionList> {
        let mut expressions = Vec::new();
        while Self::starts_expression(self.peek_kind()) {
            expressions.extend(self.parse_expression()?);
        }
        if expressions.is_empty() {
            self.diagnostics.push(Diagnostic::in_doc(
                ErrorCode::EmptyUsagePattern,
                self.peek().map_or(0, |t| t.range.start),
                "Expected an expression",
            ));
            return None;
        }
        Some(ExpressionList { expressions })
    }

    fn parse_expression(&mut self) -> Option<Vec<Expression>> {
        let token = self.advance();
        match token.kind {
            TokenKind::OpenParen => {
                let inner = self.parse_alternation_list()?;
                if self.peek_kind() == Some(TokenKind::CloseParen) {
                    self.advance();
                } else {
                    self.diagnostics.push(Diagnostic::in_doc(
                        ErrorCode::MissingCloseParen,
                        token.range.start,
                        "Missing ')' to match this '('",
                    ));
                    return None;
                }
                let ellipsis = self.eat_ellipsis();
                Some(vec![Expression {
                    production: Production::Group(inner),
                    ellipsis,
                }])
            }
            TokenKind::OpenBracket => {
                if self.at_options_shortcut() {
                    self.advance(); // the word
                    self.advance(); // the closing bracket
                    let ellipsis = self.eat_ellipsis();
                    return Some(vec![Expression {
                        production: Production::OptionsShortcut,
                        ellipsis,
                    }]);
                }
                let inner = self.parse_alternation_list()?;
                if self.peek_kind() == Some(TokenKind::CloseBracket) {
                    self.advance();
                } else {
                    self.diagnostics.push(Diagnostic::in_doc(
                        ErrorCode::MissingCloseBracket,
                        token.range.start,
                        "Missing ']' to match this '['",
                    ));
                    return None;
                }
                let ellipsis = self.eat_ellipsis();
                Some(vec![Expression {
                    production: Production::Optional(inner),
                    ellipsis,
                }])
            }
            TokenKind::Word => self.parse_word_expression(token.range),
            _ => unreachable!("only expression starters reach parse_expression"),
        }
    }

    fn at_options_shortcut(&self) -> bool {
        let word = match self.peek() {
            Some(t) if t.kind == TokenKind::Word => t,
            _ => return false,
        };
        self.tokens.get(self.pos + 1).map(|t| t.kind) == Some(TokenKind::CloseBracket)
            && word.range.slice(self.src).eq_ignore_ascii_case("options")
    }

    fn parse_word_expression(&mut self, word: Range) -> Option<Vec<Expression>> {
        let text = word.slice(self.src);
        let mut clauses = Vec::new();

        if text.starts_with('-') && text != "-" && text != "--" {
            let mut remaining = word;
            let parsed = OptionRecord::parse_from_source(self.src, &mut remaining, self.diagnostics);
            if parsed.name.is_empty() {
                return None;
            }

            if parsed.kind == OptionKind::SingleLong
                && !parsed.has_value()
                && self.adopt(OptionKind::SingleLong, parsed.name).is_none()
            {
                // No such single-dash long: -vv is a cluster of shorts,
                // each taking its catalog record when one exists.
                for offset in 0..parsed.name.len {
                    let name = Range::new(parsed.name.start + offset, 1);
                    let record = self
                        .adopt(OptionKind::Short, name)
                        .copied()
                        .unwrap_or_else(|| {
                            OptionRecord::new(name, Range::EMPTY, 1, Separator::Space)
                        });
                    clauses.push(SimpleClause::Option(record));
                }
            } else {
                // A usage mention of a cataloged option stands for the
                // catalog record, key and description included.
                let mut record = match self.adopt(parsed.kind, parsed.name) {
                    Some(adopted) => *adopted,
                    None => parsed,
                };
                if parsed.has_value() && !record.has_value() {
                    record.value = parsed.value;
                    record.separator = parsed.separator;
                }
                // A following <var> belongs to a value-taking option:
                // 'prog --speed <knots>'.
                if record.has_value()
                    && !parsed.has_value()
                    && let Some(next) = self.peek()
                    && next.kind == TokenKind::Word
                    && next.range.slice(self.src).starts_with('<')
                {
                    self.advance();
                }
                clauses.push(SimpleClause::Option(record));
            }
        } else if text.starts_with('<') {
            clauses.push(SimpleClause::Variable(word));
        } else {
            clauses.push(SimpleClause::Fixed(word));
        }

        let ellipsis = self.eat_ellipsis();
        let mut expressions: Vec<Expression> = clauses
            .into_iter()
            .map(|clause| Expression {
                production: Production::Simple(clause),
                ellipsis: false,
            })
            .collect();
        if let Some(last) = expressions.last_mut() {
            last.ellipsis = ellipsis;
        }
        Some(expressions)
    }

    /// The catalog record a usage mention stands for, when one exists.
    fn adopt(&self, kind: OptionKind, name: Range) -> Option<&OptionRecord> {
        self.shortcut_options
            .iter()
            .find(|opt| opt.kind == kind && opt.name.slice(self.src) == name.slice(self.src))
    }
}

/// Collects the clauses appearing anywhere in the usage tree: option
/// records, `<variable>` ranges, and fixed-word ranges, in traversal
/// order. Program names are not fixed clauses and are not included.
pub(crate) fn collect_clauses(usages: &[Usage]) -> (Vec<OptionRecord>, Vec<Range>, Vec<Range>) {
    let mut options = Vec::new();
    let mut variables = Vec::new();
    let mut fixeds = Vec::new();
    for usage in usages {
        if let Some(body) = &usage.body {
            walk_alternation(body, &mut options, &mut variables, &mut fixeds);
        }
    }
    (options, variables, fixeds)
}

fn walk_alternation(
    node: &AlternationList,
    options: &mut Vec<OptionRecord>,
    variables: &mut Vec<Range>,
    fixeds: &mut Vec<Range>,
) {
    for branch in &node.branches {
        for expression in &branch.expressions {
            match &expression.production {
                Production::Simple(SimpleClause::Option(opt)) => options.push(*opt),
                Production::Simple(SimpleClause::Variable(range)) => variables.push(*range),
                Production::Simple(SimpleClause::Fixed(range)) => fixeds.push(*range),
                Production::Group(inner) | Production::Optional(inner) => {
                    walk_alternation(inner, options, variables, fixeds);
                }
                Production::OptionsShortcut => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::parse_options_section;
    use crate::sections::section_ranges;

    fn parse(doc: &str) -> (Vec<Usage>, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let shortcut = parse_options_section(doc, &mut diagnostics);
        let sections = section_ranges(doc, "Usage:", false);
        assert_eq!(sections.len(), 1, "test doc needs exactly one Usage:");
        let usages = parse_usage_sections(doc, sections[0], &shortcut, &mut diagnostics)
            .expect("usage should parse");
        (usages, diagnostics)
    }

    fn parse_err(doc: &str) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let sections = section_ranges(doc, "Usage:", false);
        let parsed = parse_usage_sections(doc, sections[0], &[], &mut diagnostics);
        assert!(parsed.is_none(), "expected a structural failure");
        diagnostics
    }

    #[test]
    fn test_program_name_and_simple_clauses() {
        let doc = "Usage: prog cmd <file>\n";
        let (usages, _) = parse(doc);
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].prog_name.slice(doc), "prog");
        let (options, variables, fixeds) = collect_clauses(&usages);
        assert!(options.is_empty());
        assert_eq!(variables.len(), 1);
        assert_eq!(variables[0].slice(doc), "<file>");
        assert_eq!(fixeds.len(), 1);
        assert_eq!(fixeds[0].slice(doc), "cmd");
    }

    #[test]
    fn test_each_line_is_an_alternative() {
        let doc = "Usage: prog add <x>\n       prog remove <x>\n";
        let (usages, _) = parse(doc);
        assert_eq!(usages.len(), 2);
        assert_eq!(usages[1].prog_name.slice(doc), "prog");
    }

    #[test]
    fn test_cluster_word_decomposes_into_shorts() {
        let doc = "Usage: prog [-vv]\n";
        let (usages, _) = parse(doc);
        let (options, _, _) = collect_clauses(&usages);
        assert_eq!(options.len(), 2);
        assert!(options.iter().all(|o| o.kind == OptionKind::Short));
        assert!(options.iter().all(|o| o.name.slice(doc) == "v"));
    }

    #[test]
    fn test_known_single_dash_long_is_kept_whole() {
        let doc = "Usage: prog -std <level>\nOptions:\n  -std <level>  Language standard\n";
        let (usages, _) = parse(doc);
        let (options, variables, _) = collect_clauses(&usages);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].kind, OptionKind::SingleLong);
        // The variable was absorbed as the option's value.
        assert_eq!(options[0].value.slice(doc), "<level>");
        assert!(variables.is_empty());
    }

    #[test]
    fn test_variable_not_absorbed_without_catalog_value() {
        let doc = "Usage: prog -q <file>\nOptions:\n  -q  Quiet\n";
        let (usages, _) = parse(doc);
        let (options, variables, _) = collect_clauses(&usages);
        assert_eq!(options.len(), 1);
        assert!(!options[0].has_value());
        assert_eq!(variables.len(), 1);
    }

    #[test]
    fn test_inline_value_forms() {
        let doc = "Usage: prog --speed=<knots> -D<macro>\n";
        let (usages, _) = parse(doc);
        let (options, _, _) = collect_clauses(&usages);
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].value.slice(doc), "<knots>");
        assert_eq!(options[0].separator, Separator::Equals);
        assert_eq!(options[1].separator, Separator::None);
    }

    #[test]
    fn test_options_shortcut_detection() {
        let doc = "Usage: prog [options] <file>\n";
        let (usages, _) = parse(doc);
        let body = usages[0].body.as_ref().expect("usage has a body");
        let kinds: Vec<bool> = body.branches[0]
            .expressions
            .iter()
            .map(|e| matches!(e.production, Production::OptionsShortcut))
            .collect();
        assert_eq!(kinds, vec![true, false]);
    }

    #[test]
    fn test_alternation_and_ellipsis() {
        let doc = "Usage: prog (a | b)...\n";
        let (usages, _) = parse(doc);
        let body = usages[0].body.as_ref().expect("usage has a body");
        let expr = &body.branches[0].expressions[0];
        assert!(expr.ellipsis);
        match &expr.production {
            Production::Group(inner) => assert_eq!(inner.branches.len(), 2),
            other => panic!("expected a group, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_close_paren() {
        let doc = "Usage: prog (a b\n";
        let diagnostics = parse_err(doc);
        assert!(
            diagnostics
                .iter()
                .any(|d| d.code == ErrorCode::MissingCloseParen)
        );
    }

    #[test]
    fn test_missing_close_bracket() {
        let doc = "Usage: prog [a b\n";
        let diagnostics = parse_err(doc);
        assert!(
            diagnostics
                .iter()
                .any(|d| d.code == ErrorCode::MissingCloseBracket)
        );
    }

    #[test]
    fn test_stray_close_paren() {
        let doc = "Usage: prog a)\n";
        let diagnostics = parse_err(doc);
        assert!(
            diagnostics
                .iter()
                .any(|d| d.code == ErrorCode::MissingCloseParen)
        );
    }

    #[test]
    fn test_double_dash_word_is_fixed() {
        let doc = "Usage: prog [--] <file>\n";
        let (usages, _) = parse(doc);
        let (options, _, fixeds) = collect_clauses(&usages);
        assert!(options.is_empty());
        assert_eq!(fixeds.len(), 1);
        assert_eq!(fixeds[0].slice(doc), "--");
    }
}
