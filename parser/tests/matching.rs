//! End-to-end matching: document + argv in, bindings and unused slots out.

use argdoc_parser::{ArgumentParser, ErrorCode, ParseFlags, ParseOutcome};

fn parser(doc: &str) -> ArgumentParser {
    ArgumentParser::new(doc).expect("document should preflight")
}

fn args(argv: &[&str]) -> Vec<String> {
    argv.iter().map(|s| s.to_string()).collect()
}

fn parse(doc: &str, argv: &[&str], flags: ParseFlags) -> ParseOutcome {
    parser(doc).parse_arguments(&args(argv), flags)
}

#[test]
fn test_single_switch() {
    let doc = "Usage: prog -a\nOptions:\n  -a  do a thing\n";
    let outcome = parse(doc, &["prog", "-a"], ParseFlags::default());
    assert_eq!(outcome.map["-a"].count, 1);
    assert!(outcome.unused_argv_indices.is_empty());
    assert!(outcome.diagnostics.is_empty());
}

#[test]
fn test_unambiguous_prefix_resolves_when_enabled() {
    let doc = "Usage: prog [options]\nOptions:\n  -v, --verbose\n";
    let flags = ParseFlags::default().with_prefix_matching();
    let outcome = parse(doc, &["prog", "--verb"], flags);
    assert_eq!(outcome.map["--verbose"].count, 1);
    assert!(outcome.unused_argv_indices.is_empty());
}

#[test]
fn test_prefix_is_unknown_without_the_flag() {
    let doc = "Usage: prog [options]\nOptions:\n  -v, --verbose\n";
    let outcome = parse(doc, &["prog", "--verb"], ParseFlags::default());
    assert_eq!(outcome.unused_argv_indices, vec![1]);
    assert!(
        outcome
            .diagnostics
            .iter()
            .any(|d| d.code == ErrorCode::UnknownOption)
    );
}

#[test]
fn test_unseparated_short_value() {
    let doc = "Usage: prog -D<value>\nOptions:\n  -D<value>\n";
    let outcome = parse(doc, &["prog", "-DNDEBUG"], ParseFlags::default());
    assert_eq!(outcome.map["-D"].values, vec!["NDEBUG"]);
    assert!(outcome.unused_argv_indices.is_empty());
}

#[test]
fn test_repeated_alternation_counts_each_branch() {
    let doc = "Usage: prog (a | b)...\n";
    let outcome = parse(doc, &["prog", "a", "b", "a"], ParseFlags::default());
    assert_eq!(outcome.map["a"].count, 2);
    assert_eq!(outcome.map["b"].count, 1);
    assert!(outcome.unused_argv_indices.is_empty());
}

#[test]
fn test_short_cluster_in_usage_word() {
    let doc = "Usage: prog [-vv]\n";
    let outcome = parse(doc, &["prog", "-vv"], ParseFlags::default());
    assert_eq!(outcome.map["-v"].count, 2);
    assert!(outcome.unused_argv_indices.is_empty());

    // Three v's resolve to three shorts, but only two are legal; the
    // partially-consumed token counts as unused.
    let outcome = parse(doc, &["prog", "-vvv"], ParseFlags::default());
    assert_eq!(outcome.unused_argv_indices, vec![1]);
}

#[test]
fn test_defaults_fill_empty_arguments() {
    let doc = "Usage: prog\nOptions:\n  -m, --message <text>  [default: hi]\n";
    let flags = ParseFlags::default().with_empty_args();
    let outcome = parse(doc, &["prog"], flags);
    assert_eq!(outcome.map["--message"].values, vec!["hi"]);
    assert!(outcome.unused_argv_indices.is_empty());
}

#[test]
fn test_empty_args_cover_every_known_name() {
    let doc = "\
Usage: prog [options] cmd <file>

Options:
  -v, --verbose  More output
  -o <path>  Output path
";
    let flags = ParseFlags::default().with_empty_args();
    let outcome = parse(doc, &["prog"], flags);
    for name in ["--verbose", "-o", "cmd", "<file>"] {
        assert!(outcome.map.contains_key(name), "missing {name}");
    }
}

#[test]
fn test_double_dash_turns_options_into_positionals() {
    let doc = "Usage: prog <file>...\n";
    let outcome = parse(doc, &["prog", "--", "-x", "-y"], ParseFlags::default());
    assert_eq!(outcome.map["<file>"].values, vec!["-x", "-y"]);
    assert!(outcome.unused_argv_indices.is_empty());
}

#[test]
fn test_variable_repetition_collects_values_in_order() {
    let doc = "Usage: prog <file>...\n";
    let outcome = parse(doc, &["prog", "one", "two", "three"], ParseFlags::default());
    assert_eq!(outcome.map["<file>"].values, vec!["one", "two", "three"]);
    assert_eq!(outcome.map["<file>"].count, 0);
}

#[test]
fn test_option_value_from_next_slot() {
    let doc = "Usage: prog [options]\nOptions:\n  -m, --message <text>  The text\n";
    let outcome = parse(doc, &["prog", "-m", "hello"], ParseFlags::default());
    assert_eq!(outcome.map["--message"].values, vec!["hello"]);
    assert_eq!(outcome.map["--message"].count, 1);
    assert!(outcome.unused_argv_indices.is_empty());
}

#[test]
fn test_alias_pair_matches_only_once_through_options_shortcut() {
    // -q and --quiet share a key: once one spelling matches, [options]
    // must not match the other as well.
    let doc = "Usage: prog [options]\nOptions:\n  -q, --quiet  Hush\n";
    let outcome = parse(doc, &["prog", "-q", "--quiet"], ParseFlags::default());
    assert_eq!(outcome.map["--quiet"].count, 1);
    assert_eq!(outcome.unused_argv_indices, vec![2]);
}

#[test]
fn test_usage_mention_reports_under_the_long_key() {
    let doc = "Usage: prog -q <file>\nOptions:\n  -q, --quiet  Hush\n";
    let outcome = parse(doc, &["prog", "-q", "notes.txt"], ParseFlags::default());
    assert_eq!(outcome.map["--quiet"].count, 1);
    assert_eq!(outcome.map["<file>"].values, vec!["notes.txt"]);
    assert!(outcome.unused_argv_indices.is_empty());
}

#[test]
fn test_explicit_usage_mention_excises_the_shortcut() {
    // With -a excised from [options], a second -a has nothing to match.
    let doc = "Usage: prog [options] [-a]\nOptions:\n  -a  Apply\n";
    let outcome = parse(doc, &["prog", "-a", "-a"], ParseFlags::default());
    assert_eq!(outcome.map["-a"].count, 1);
    assert_eq!(outcome.unused_argv_indices, vec![2]);
}

#[test]
fn test_excision_does_not_reach_across_alias_spellings() {
    // --alpha in Usage: excises the --alpha catalog entry, but the
    // separately-declared -a keeps its shortcut slot.
    let doc = "\
Usage: prog [options] --alpha
Options:
  -a  Short apply
  --alpha  Long apply
";
    let outcome = parse(doc, &["prog", "--alpha", "-a"], ParseFlags::default());
    assert_eq!(outcome.map["--alpha"].count, 1);
    assert_eq!(outcome.map["-a"].count, 1);
    assert!(outcome.unused_argv_indices.is_empty());
}

#[test]
fn test_no_match_marks_every_slot_unused() {
    let doc = "Usage: prog go\n";
    let outcome = parse(doc, &["prog", "stop"], ParseFlags::default());
    assert_eq!(outcome.unused_argv_indices, vec![0, 1]);
}

#[test]
fn test_best_state_has_fewest_unused_slots() {
    // The first alternative consumes one positional, the second two; the
    // matcher must pick the second.
    let doc = "Usage: prog <a>\n       prog <a> <b>\n";
    let outcome = parse(doc, &["prog", "x", "y"], ParseFlags::default());
    assert!(outcome.unused_argv_indices.is_empty());
    assert_eq!(outcome.map["<b>"].values, vec!["y"]);
}

#[test]
fn test_diagnostics_stay_in_argv_order_across_failing_tokens() {
    let doc = "Usage: prog [options]\nOptions:\n  -v  Verbose\n";
    let outcome = parse(doc, &["prog", "-vx", "ok", "-vy"], ParseFlags::default());
    // Each failing token contributes its own error group, in encounter
    // order; within a group the short-side errors come first.
    let slots: Vec<Option<usize>> = outcome.diagnostics.iter().map(|d| d.argv_index).collect();
    assert!(!slots.is_empty());
    let mut sorted = slots.clone();
    sorted.sort();
    assert_eq!(slots, sorted);
    assert_eq!(slots.first(), Some(&Some(1)));
    assert_eq!(slots.last(), Some(&Some(3)));
}

#[test]
fn test_parse_is_deterministic_and_pure() {
    let doc = "Usage: prog [options] <file>\nOptions:\n  -v  Chatty\n";
    let p = parser(doc);
    let argv = args(&["prog", "-v", "in.txt"]);
    let first = p.parse_arguments(&argv, ParseFlags::default());
    let second = p.parse_arguments(&argv, ParseFlags::default());
    assert_eq!(first.map, second.map);
    assert_eq!(first.unused_argv_indices, second.unused_argv_indices);
    assert_eq!(first.diagnostics, second.diagnostics);
}

#[test]
fn test_unused_indices_are_in_bounds_unique_and_sorted() {
    let doc = "Usage: prog -a\nOptions:\n  -a  All\n";
    let argv = ["prog", "bogus", "-a", "extra", "-z"];
    let outcome = parse(doc, &argv, ParseFlags::default());
    let unused = &outcome.unused_argv_indices;
    assert!(unused.iter().all(|&i| i < argv.len()));
    assert!(unused.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_validate_flags_unused_slots_invalid() {
    use argdoc_parser::ArgumentStatus;

    let doc = "Usage: prog -a\nOptions:\n  -a  All\n";
    let statuses = parser(doc).validate_arguments(&args(&["prog", "-a", "bogus"]), ParseFlags::default());
    assert_eq!(
        statuses,
        vec![
            ArgumentStatus::Valid,
            ArgumentStatus::Valid,
            ArgumentStatus::Invalid
        ]
    );
}

#[test]
fn test_suggest_value_placeholder_for_trailing_option() {
    let doc = "Usage: prog [options]\nOptions:\n  -m, --message <text>  The text\n";
    let suggestions = parser(doc).suggest_next_argument(&args(&["prog", "--message"]), ParseFlags::default());
    assert_eq!(suggestions, vec!["<text>"]);
}

#[test]
fn test_suggest_catalog_options_after_program_name() {
    let doc = "Usage: prog [options]\nOptions:\n  -v, --verbose  More output\n";
    let suggestions = parser(doc).suggest_next_argument(&args(&["prog"]), ParseFlags::default());
    assert_eq!(suggestions, vec!["--verbose", "-v"]);
}

#[test]
fn test_suggest_pending_clauses_on_incomplete_line() {
    let doc = "Usage: prog [options] --alpha <file>\nOptions:\n  -a  Short apply\n  --alpha  Long apply\n";
    let flags = ParseFlags::default().with_incomplete_matching();
    let suggestions = parser(doc).suggest_next_argument(&args(&["prog"]), flags);
    assert!(suggestions.contains(&"--alpha".to_string()));
    assert!(suggestions.contains(&"-a".to_string()));
    assert!(suggestions.contains(&"<file>".to_string()));
}

#[test]
fn test_suggest_fixed_words() {
    let doc = "Usage: prog (add | remove) <name>\n";
    let flags = ParseFlags::default().with_incomplete_matching();
    let suggestions = parser(doc).suggest_next_argument(&args(&["prog"]), flags);
    // Both branch heads, plus the variable each branch falls through to.
    assert_eq!(suggestions, vec!["<name>", "add", "remove"]);
}

#[test]
fn test_suggestions_suppress_argv_diagnostics() {
    let doc = "Usage: prog [options]\nOptions:\n  -v  Chatty\n";
    // An unknown option does not break suggestion generation.
    let suggestions = parser(doc).suggest_next_argument(&args(&["prog", "--nope"]), ParseFlags::default());
    assert!(suggestions.contains(&"-v".to_string()));
}

#[test]
fn test_incomplete_matching_accepts_partial_lines() {
    let doc = "Usage: prog go <where>\n";
    let flags = ParseFlags::default().with_incomplete_matching();
    let outcome = parse(doc, &["prog", "go"], flags);
    assert_eq!(outcome.map["go"].count, 1);
    assert!(outcome.unused_argv_indices.is_empty());
}

#[test]
fn test_optional_group_may_be_skipped() {
    let doc = "Usage: prog [go] <file>\n";
    let outcome = parse(doc, &["prog", "data"], ParseFlags::default());
    assert_eq!(outcome.map["<file>"].values, vec!["data"]);
    assert!(outcome.unused_argv_indices.is_empty());

    let outcome = parse(doc, &["prog", "go", "data"], ParseFlags::default());
    assert_eq!(outcome.map["go"].count, 1);
    assert_eq!(outcome.map["<file>"].values, vec!["data"]);
}

#[test]
fn test_absorbed_option_value_in_usage_line() {
    let doc = "Usage: prog --speed <knots>\nOptions:\n  --speed <knots>  Cruising speed\n";
    let outcome = parse(doc, &["prog", "--speed", "12"], ParseFlags::default());
    assert_eq!(outcome.map["--speed"].values, vec!["12"]);
    assert!(outcome.unused_argv_indices.is_empty());
}
