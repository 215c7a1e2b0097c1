//! The nondeterministic tree matcher.
//!
//! Matching a node returns the set of successor states; an empty set means
//! no match. Alternation branches and optional groups fork states, so the
//! full set of legal derivations of argv against the grammar is explored,
//! and the caller picks the state leaving the fewest argv slots unused.
//!
//! Ellipsis repetition re-applies a node to its own successors, keeping
//! only states whose progress strictly grew; progress is monotone, so the
//! loop always terminates.

use std::collections::{BTreeMap, BTreeSet};

use argdoc_core::{Argument, ParseFlags};

use crate::argv::{Positional, ResolvedOption};
use crate::grammar::{AlternationList, Expression, Production, SimpleClause, Usage};
use crate::options::OptionRecord;

/// One candidate derivation in flight.
#[derive(Debug, Clone, Default)]
pub(crate) struct MatchState {
    /// Name → argument bindings accumulated so far.
    pub option_map: BTreeMap<String, Argument>,
    /// Next positional to dequeue.
    pub next_positional_index: usize,
    /// One bit per resolved option, set once the matcher consumes it.
    pub consumed_options: Vec<bool>,
    /// Completion candidates collected along this derivation.
    pub suggested_next_arguments: BTreeSet<String>,
}

impl MatchState {
    /// How much of argv this state has accounted for. Two states with
    /// equal progress need not be equal, but a child state that made no
    /// progress over its parent is identical to it — which is what the
    /// ellipsis loop relies on to terminate.
    pub(crate) fn progress(&self) -> usize {
        self.next_positional_index
            + self.consumed_options.iter().filter(|&&c| c).count()
            + self.suggested_next_arguments.len()
    }
}

/// Read-only surroundings of one match run, plus the bracket-nesting bit
/// the optional production toggles.
pub(crate) struct MatchContext<'a> {
    pub flags: ParseFlags,
    pub positionals: &'a [Positional],
    pub resolved_options: &'a [ResolvedOption],
    pub argv: &'a [String],
    /// Inside `[…]` an unmatched option clause is not a failure.
    pub is_in_square_brackets: bool,
}

impl<'a> MatchContext<'a> {
    pub(crate) fn new(
        flags: ParseFlags,
        positionals: &'a [Positional],
        resolved_options: &'a [ResolvedOption],
        argv: &'a [String],
    ) -> MatchContext<'a> {
        MatchContext {
            flags,
            positionals,
            resolved_options,
            argv,
            is_in_square_brackets: false,
        }
    }

    fn has_more_positionals(&self, state: &MatchState) -> bool {
        state.next_positional_index < self.positionals.len()
    }

    /// Argv indices not accounted for by `state`: unconsumed positionals,
    /// options the tree never matched, and option tokens only partially
    /// matched (a `-vv` parsed as two shorts counts as unused when only
    /// one was consumed).
    pub(crate) fn unused_arguments(&self, state: &MatchState) -> Vec<usize> {
        let mut used = vec![false; self.argv.len()];

        for positional in &self.positionals[..state.next_positional_index] {
            used[positional.idx_in_argv] = true;
        }

        for (i, &consumed) in state.consumed_options.iter().enumerate() {
            if consumed {
                let resolved = &self.resolved_options[i];
                used[resolved.name_idx_in_argv] = true;
                if let Some(value_idx) = resolved.value_idx_in_argv {
                    used[value_idx] = true;
                }
            }
        }

        // Unconsumed resolved options override: their name slot is unused
        // even when a sibling short from the same token was consumed.
        for (i, &consumed) in state.consumed_options.iter().enumerate() {
            if !consumed {
                used[self.resolved_options[i].name_idx_in_argv] = false;
            }
        }

        used.iter()
            .enumerate()
            .filter(|&(_, &u)| !u)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Tree-directed matcher over a preflighted document.
pub(crate) struct Matcher<'a> {
    pub src: &'a str,
    pub shortcut_options: &'a [OptionRecord],
}

impl Matcher<'_> {
    /// Matches every usage alternative from a copy of the initial state
    /// and unions the successors.
    pub(crate) fn match_usages(
        &self,
        usages: &[Usage],
        init: &MatchState,
        ctx: &mut MatchContext<'_>,
    ) -> Vec<MatchState> {
        let mut result = Vec::new();
        for usage in usages {
            let mut state = init.clone();
            if !ctx.has_more_positionals(&state) {
                continue;
            }
            // The program name consumes the first positional without
            // comparing its text.
            state.next_positional_index += 1;
            match &usage.body {
                Some(body) => result.extend(self.match_alternation(body, state, ctx)),
                None => result.push(state),
            }
        }
        result
    }

    fn match_alternation(
        &self,
        node: &AlternationList,
        state: MatchState,
        ctx: &mut MatchContext<'_>,
    ) -> Vec<MatchState> {
        let mut result = Vec::new();
        for branch in &node.branches {
            let mut states = vec![state.clone()];
            for expression in &branch.expressions {
                let mut next = Vec::new();
                for s in states {
                    next.extend(self.match_expression(expression, s, ctx));
                }
                states = next;
                if states.is_empty() {
                    break;
                }
            }
            result.extend(states);
        }
        result
    }

    fn match_expression(
        &self,
        node: &Expression,
        state: MatchState,
        ctx: &mut MatchContext<'_>,
    ) -> Vec<MatchState> {
        let saved_in_brackets = ctx.is_in_square_brackets;
        let result = match &node.production {
            Production::Simple(clause) => {
                let mut result = self.match_simple_clause(clause, state, ctx);
                if node.ellipsis {
                    self.repeat_while_progressing(&mut result, ctx, |matcher, s, ctx| {
                        matcher.match_simple_clause(clause, s, ctx)
                    });
                }
                result
            }
            Production::Group(inner) => {
                ctx.is_in_square_brackets = false;
                let mut result = self.match_alternation(inner, state, ctx);
                if node.ellipsis {
                    self.repeat_while_progressing(&mut result, ctx, |matcher, s, ctx| {
                        matcher.match_alternation(inner, s, ctx)
                    });
                }
                result
            }
            Production::Optional(inner) => {
                ctx.is_in_square_brackets = true;
                let not_taken = state.clone();
                let mut result = self.match_alternation(inner, state, ctx);
                if node.ellipsis {
                    self.repeat_while_progressing(&mut result, ctx, |matcher, s, ctx| {
                        matcher.match_alternation(inner, s, ctx)
                    });
                }
                result.push(not_taken);
                result
            }
            Production::OptionsShortcut => {
                let mut state = state;
                if !self.match_options(self.shortcut_options, &mut state, ctx)
                    && ctx.flags.generate_suggestions
                {
                    for opt in self.shortcut_options {
                        state
                            .suggested_next_arguments
                            .insert(opt.name_as_string(self.src));
                    }
                }
                // The shortcut never fails: unmatched, it passes through.
                vec![state]
            }
        };
        ctx.is_in_square_brackets = saved_in_brackets;
        result
    }

    /// The ellipsis loop: re-applies `rematch` to the frontier, keeping
    /// only children whose progress strictly grew, and unions every
    /// round into `result`.
    fn repeat_while_progressing<F>(
        &self,
        result: &mut Vec<MatchState>,
        ctx: &mut MatchContext<'_>,
        mut rematch: F,
    ) where
        F: FnMut(&Self, MatchState, &mut MatchContext<'_>) -> Vec<MatchState>,
    {
        let mut frontier = result.clone();
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for state in frontier {
                let before = state.progress();
                for child in rematch(self, state, ctx) {
                    debug_assert!(child.progress() >= before, "progress never goes backwards");
                    if child.progress() > before {
                        next.push(child);
                    }
                }
            }
            result.extend(next.iter().cloned());
            frontier = next;
        }
    }

    fn match_simple_clause(
        &self,
        clause: &SimpleClause,
        state: MatchState,
        ctx: &mut MatchContext<'_>,
    ) -> Vec<MatchState> {
        match clause {
            SimpleClause::Option(opt) => self.match_option_clause(opt, state, ctx),
            SimpleClause::Fixed(range) => self.match_fixed_clause(range.slice(self.src), state, ctx),
            SimpleClause::Variable(range) => {
                self.match_variable_clause(range.slice(self.src), state, ctx)
            }
        }
    }

    fn match_option_clause(
        &self,
        opt: &OptionRecord,
        state: MatchState,
        ctx: &MatchContext<'_>,
    ) -> Vec<MatchState> {
        let mut state = state;
        if self.match_options(std::slice::from_ref(opt), &mut state, ctx) {
            return vec![state];
        }
        if ctx.flags.generate_suggestions {
            state
                .suggested_next_arguments
                .insert(opt.name_as_string(self.src));
        }
        if ctx.is_in_square_brackets || ctx.flags.match_allow_incomplete {
            vec![state]
        } else {
            Vec::new()
        }
    }

    /// Matches catalog options against the resolved-option list. Key
    /// ranges already matched are skipped, so `-f` and `--foo` aliasing
    /// one key cannot both fire; staged suggestions are dropped when a
    /// later option with the same key did match. Succeeds when at least
    /// one option matched or one suggestion was made.
    fn match_options(
        &self,
        options_in_doc: &[OptionRecord],
        state: &mut MatchState,
        ctx: &MatchContext<'_>,
    ) -> bool {
        let mut successful_match = false;
        let mut made_suggestion = false;
        let mut matched_key_ranges = Vec::new();
        let mut potential_suggestions: Vec<&OptionRecord> = Vec::new();

        for opt_in_doc in options_in_doc {
            let key_range = opt_in_doc.corresponding_long_name;
            if !key_range.is_empty() && matched_key_ranges.contains(&key_range) {
                continue;
            }

            let found = ctx.resolved_options.iter().enumerate().find(|(i, resolved)| {
                !state.consumed_options[*i]
                    && resolved.option.has_same_name(opt_in_doc, self.src)
            });

            match found {
                Some((i, resolved)) => {
                    let name = opt_in_doc.longest_name(self.src);
                    let argument = state.option_map.entry(name).or_default();
                    if let Some(value_idx) = resolved.value_idx_in_argv {
                        let token = &ctx.argv[value_idx];
                        argument
                            .values
                            .push(resolved.value_range_in_arg.slice(token).to_string());
                    }
                    argument.count += 1;

                    successful_match = true;
                    state.consumed_options[i] = true;
                    if !key_range.is_empty() {
                        matched_key_ranges.push(key_range);
                    }
                }
                None => {
                    if ctx.flags.generate_suggestions {
                        potential_suggestions.push(opt_in_doc);
                    }
                }
            }
        }

        if ctx.flags.generate_suggestions {
            for suggestion in potential_suggestions {
                let key_range = suggestion.corresponding_long_name;
                if key_range.is_empty() || !matched_key_ranges.contains(&key_range) {
                    state
                        .suggested_next_arguments
                        .insert(suggestion.name_as_string(self.src));
                    made_suggestion = true;
                }
            }
        }

        successful_match || made_suggestion
    }

    fn match_fixed_clause(
        &self,
        word: &str,
        state: MatchState,
        ctx: &MatchContext<'_>,
    ) -> Vec<MatchState> {
        let mut state = state;
        if ctx.has_more_positionals(&state) {
            let positional = ctx.positionals[state.next_positional_index];
            let token = &ctx.argv[positional.idx_in_argv];
            if token == word {
                state.option_map.entry(token.clone()).or_default().count += 1;
                state.next_positional_index += 1;
                return vec![state];
            }
            return Vec::new();
        }

        if ctx.flags.generate_suggestions {
            state.suggested_next_arguments.insert(word.to_string());
        }
        if ctx.flags.match_allow_incomplete {
            vec![state]
        } else {
            Vec::new()
        }
    }

    fn match_variable_clause(
        &self,
        name: &str,
        state: MatchState,
        ctx: &MatchContext<'_>,
    ) -> Vec<MatchState> {
        let mut state = state;
        if ctx.has_more_positionals(&state) {
            let positional = ctx.positionals[state.next_positional_index];
            state.next_positional_index += 1;
            // The map key keeps the angle brackets.
            state
                .option_map
                .entry(name.to_string())
                .or_default()
                .values
                .push(ctx.argv[positional.idx_in_argv].clone());
            return vec![state];
        }

        if ctx.flags.generate_suggestions {
            state.suggested_next_arguments.insert(name.to_string());
        }
        if ctx.flags.match_allow_incomplete {
            vec![state]
        } else {
            Vec::new()
        }
    }
}
