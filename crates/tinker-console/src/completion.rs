//! Tab completion for command names and expression members.
//!
//! Outside an expression the corpus is the registered command names. After
//! the expression prefix (`call `) the corpus comes from the evaluator: the
//! root's members at the start of a fresh operand, or the members of the
//! chain left of a `.`. Candidates are whole lines so cycling only has to
//! swap the line up to the end of the current word.

use std::collections::BTreeSet;

use tinker_eval::scan::{
    chain_start, is_identifier, is_operator_char, is_word_break, preceding_char, word_end,
    word_start,
};
use tinker_eval::{Evaluator, Outcome, Value};
use tinker_types::error::Result;

use crate::registry::CommandRegistry;

/// Where completion candidates come from.
pub trait CompletionSource {
    /// Registered command names, sorted.
    fn command_names(&self) -> Vec<String>;

    /// Member names of the value `chain` evaluates to, or of the root when
    /// `chain` is empty.
    fn member_names(&self, chain: &str) -> Result<Vec<String>>;
}

/// Completion against a live registry and object graph. Members are listed
/// through the evaluator's `@` marker.
pub struct LiveSource<'a> {
    pub registry: &'a CommandRegistry,
    pub evaluator: &'a Evaluator,
    pub root: &'a Value,
}

impl CompletionSource for LiveSource<'_> {
    fn command_names(&self) -> Vec<String> {
        self.registry.names()
    }

    fn member_names(&self, chain: &str) -> Result<Vec<String>> {
        match self.evaluator.evaluate(&format!("{chain}@"), self.root)? {
            Outcome::Members(members) => Ok(members.into_iter().map(|m| m.name).collect()),
            Outcome::Value(_) => Ok(Vec::new()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Index of the next corpus entry starting with `prefix`, wrapping around.
///
/// From no selection, forward picks the first match and backward the last.
pub fn cycle(
    corpus: &[String],
    prefix: &str,
    current: Option<usize>,
    direction: Direction,
) -> Option<usize> {
    let matches: Vec<usize> = corpus
        .iter()
        .enumerate()
        .filter(|(_, c)| c.starts_with(prefix))
        .map(|(i, _)| i)
        .collect();
    let next = match (direction, current) {
        (Direction::Forward, Some(c)) => matches.iter().find(|&&i| i > c),
        (Direction::Backward, Some(c)) => matches.iter().rev().find(|&&i| i < c),
        (_, None) => None,
    };
    let wrapped = match direction {
        Direction::Forward => matches.first(),
        Direction::Backward => matches.last(),
    };
    next.or(wrapped).copied()
}

/// Result of one completion step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub buffer: String,
    /// Cursor offset from the end of `buffer`.
    pub cursor: usize,
}

#[derive(Debug)]
struct CompletionState {
    /// The line up to the cursor when completion started.
    prefix: String,
    /// Already typed rest of the word after the cursor.
    suffix: String,
    /// Text after the word, kept through every replacement.
    tail: String,
    corpus: Vec<String>,
    index: Option<usize>,
}

/// Completion state between consecutive Tab presses.
#[derive(Debug)]
pub struct CompletionEngine {
    expression_prefix: String,
    placeholder: char,
    state: Option<CompletionState>,
}

impl CompletionEngine {
    pub fn new(expression_prefix: impl Into<String>, placeholder: char) -> Self {
        Self {
            expression_prefix: expression_prefix.into(),
            placeholder,
            state: None,
        }
    }

    /// Forget the current corpus. The next call recomputes it.
    pub fn reset(&mut self) {
        self.state = None;
    }

    pub fn is_active(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.index.is_some())
    }

    /// The word typed after the cursor when completion started.
    pub fn typed_suffix(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.suffix.as_str())
    }

    /// Advance to the next candidate for `buffer` with the cursor `cursor`
    /// chars from its end. Returns `None` when nothing matches.
    pub fn complete(
        &mut self,
        buffer: &str,
        cursor: usize,
        direction: Direction,
        source: &dyn CompletionSource,
    ) -> Option<Completion> {
        if self.state.is_none() {
            self.state = Some(self.prepare(buffer, cursor, source));
        }
        let state = self.state.as_mut()?;
        let next = cycle(&state.corpus, &state.prefix, state.index, direction)?;
        state.index = Some(next);
        Some(Completion {
            buffer: format!("{}{}", state.corpus[next], state.tail),
            cursor: state.tail.chars().count(),
        })
    }

    fn prepare(&self, buffer: &str, cursor: usize, source: &dyn CompletionSource) -> CompletionState {
        let chars: Vec<char> = buffer.chars().collect();
        let pos = chars.len() - cursor.min(chars.len());
        let expr_start = expression_start(buffer, &self.expression_prefix);
        let normalized: Vec<char> = chars
            .iter()
            .enumerate()
            .map(|(i, &c)| match expr_start {
                Some(s) if i >= s && c == self.placeholder => ' ',
                _ => c,
            })
            .collect();
        let start = word_start(&normalized, pos);
        let end = word_end(&normalized, pos);

        let names = match expr_start {
            Some(s) if start >= s => member_corpus(&normalized[s..], start - s, source),
            _ => source.command_names(),
        };
        let before: String = chars[..start].iter().collect();
        let corpus: BTreeSet<String> = names.into_iter().map(|n| format!("{before}{n}")).collect();
        log::debug!("Completion corpus: {} candidates", corpus.len());

        CompletionState {
            prefix: chars[..pos].iter().collect(),
            suffix: chars[pos..end].iter().collect(),
            tail: chars[end..].iter().collect(),
            corpus: corpus.into_iter().collect(),
            index: None,
        }
    }
}

/// Char index where the expression starts, if the buffer begins with the
/// expression prefix (ignoring case).
fn expression_start(buffer: &str, prefix: &str) -> Option<usize> {
    let n = prefix.chars().count();
    let head: String = buffer.chars().take(n).collect();
    (n > 0 && head.eq_ignore_ascii_case(prefix)).then_some(n)
}

/// Identifier members that may follow the text before `start`.
fn member_corpus(expr: &[char], start: usize, source: &dyn CompletionSource) -> Vec<String> {
    let names = match preceding_char(expr, start) {
        Some('.') => {
            let dot = expr[..start]
                .iter()
                .rposition(|c| !c.is_whitespace())
                .unwrap_or(0);
            let chain: String = expr[chain_start(expr, dot)..dot].iter().collect();
            source.member_names(chain.trim())
        },
        None | Some('=' | '(' | ',') => source.member_names(""),
        Some(c) if is_operator_char(c) => source.member_names(""),
        _ if follows_new(expr, start) => source.member_names(""),
        _ => Ok(Vec::new()),
    };
    match names {
        Ok(names) => names.into_iter().filter(|n| is_identifier(n)).collect(),
        Err(e) => {
            log::debug!("No member completions: {e}");
            Vec::new()
        },
    }
}

fn follows_new(expr: &[char], start: usize) -> bool {
    let before: String = expr[..start].iter().collect();
    before
        .trim_end()
        .strip_suffix("new")
        .is_some_and(|rest| rest.chars().next_back().is_none_or(is_word_break))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use proptest::prelude::*;
    use tinker_eval::EvalOptions;
    use tinker_types::error::ConsoleError;

    use super::*;
    use crate::testing::arena;

    struct FakeSource {
        commands: Vec<String>,
        members: HashMap<&'static str, Vec<&'static str>>,
    }

    impl FakeSource {
        fn new() -> Self {
            let mut members = HashMap::new();
            members.insert("", vec!["player", "Player", "score", "op<Add>"]);
            members.insert("player", vec!["Heal", "hp", "name"]);
            members.insert("player.Heal(1)", vec!["MaxValue"]);
            Self {
                commands: vec!["call".into(), "clear".into(), "vsync".into()],
                members,
            }
        }
    }

    impl CompletionSource for FakeSource {
        fn command_names(&self) -> Vec<String> {
            self.commands.clone()
        }

        fn member_names(&self, chain: &str) -> Result<Vec<String>> {
            self.members
                .get(chain)
                .map(|names| names.iter().map(|n| n.to_string()).collect())
                .ok_or_else(|| ConsoleError::Eval(format!("no such chain {chain}")))
        }
    }

    fn engine() -> CompletionEngine {
        CompletionEngine::new("call ", '#')
    }

    fn tab(engine: &mut CompletionEngine, buffer: &str, cursor: usize) -> Option<String> {
        engine
            .complete(buffer, cursor, Direction::Forward, &FakeSource::new())
            .map(|c| c.buffer)
    }

    fn corpus(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    // -------------------------------------------------------------------
    // Cycling
    // -------------------------------------------------------------------

    #[test]
    fn forward_wraps_to_first_match() {
        let c = corpus(&["Alpha", "Alpha2", "Beta"]);
        let first = cycle(&c, "Al", None, Direction::Forward);
        let second = cycle(&c, "Al", first, Direction::Forward);
        let third = cycle(&c, "Al", second, Direction::Forward);
        assert_eq!((first, second, third), (Some(0), Some(1), Some(0)));
    }

    #[test]
    fn backward_starts_at_last_match() {
        let c = corpus(&["Alpha", "Alpha2", "Beta"]);
        let first = cycle(&c, "Al", None, Direction::Backward);
        assert_eq!(first, Some(1));
        assert_eq!(cycle(&c, "Al", first, Direction::Backward), Some(0));
        assert_eq!(cycle(&c, "Al", Some(0), Direction::Backward), Some(1));
    }

    #[test]
    fn no_match_is_none() {
        assert_eq!(cycle(&corpus(&["Beta"]), "Al", None, Direction::Forward), None);
    }

    // -------------------------------------------------------------------
    // Command names
    // -------------------------------------------------------------------

    #[test]
    fn completes_command_names() {
        let mut e = engine();
        assert_eq!(tab(&mut e, "v", 0).as_deref(), Some("vsync"));
    }

    #[test]
    fn repeated_tab_cycles_commands() {
        let mut e = engine();
        assert_eq!(tab(&mut e, "c", 0).as_deref(), Some("call"));
        assert_eq!(tab(&mut e, "call", 0).as_deref(), Some("clear"));
        assert_eq!(tab(&mut e, "clear", 0).as_deref(), Some("call"));
        assert!(e.is_active());
        e.reset();
        assert!(!e.is_active());
        let back = e.complete("c", 0, Direction::Backward, &FakeSource::new());
        assert_eq!(back.map(|c| c.buffer).as_deref(), Some("clear"));
    }

    #[test]
    fn unmatched_prefix_gives_nothing() {
        let mut e = engine();
        assert_eq!(tab(&mut e, "zz", 0), None);
    }

    // -------------------------------------------------------------------
    // Expression members
    // -------------------------------------------------------------------

    #[test]
    fn root_members_at_expression_start() {
        let mut e = engine();
        assert_eq!(tab(&mut e, "call pl", 0).as_deref(), Some("call player"));
        let mut e = engine();
        assert_eq!(tab(&mut e, "call P", 0).as_deref(), Some("call Player"));
    }

    #[test]
    fn members_after_dot() {
        let mut e = engine();
        assert_eq!(tab(&mut e, "call player.H", 0).as_deref(), Some("call player.Heal"));
    }

    #[test]
    fn chain_with_arguments() {
        let mut e = engine();
        assert_eq!(
            tab(&mut e, "call x = player.Heal(1).M", 0).as_deref(),
            Some("call x = player.Heal(1).MaxValue")
        );
    }

    #[test]
    fn after_operator_and_inside_arguments() {
        let mut e = engine();
        assert_eq!(tab(&mut e, "call 1 + sc", 0).as_deref(), Some("call 1 + score"));
        let mut e = engine();
        assert_eq!(tab(&mut e, "call f(1, sc", 0).as_deref(), Some("call f(1, score"));
    }

    #[test]
    fn text_after_word_is_preserved() {
        let mut e = engine();
        let c = e
            .complete("call x = pla + 1", 4, Direction::Forward, &FakeSource::new())
            .unwrap();
        assert_eq!(c.buffer, "call x = player + 1");
        assert_eq!(c.cursor, 4);
    }

    #[test]
    fn typed_suffix_lands_before_cursor() {
        let mut e = engine();
        let c = e
            .complete("call player.Hl", 1, Direction::Forward, &FakeSource::new())
            .unwrap();
        assert_eq!(c.buffer, "call player.Heal");
        assert_eq!(c.cursor, 0);
        assert_eq!(e.typed_suffix(), Some("l"));
    }

    #[test]
    fn non_identifier_names_are_dropped() {
        let mut e = engine();
        assert_eq!(tab(&mut e, "call op", 0), None);
    }

    #[test]
    fn evaluation_failure_gives_empty_corpus() {
        let mut e = engine();
        assert_eq!(tab(&mut e, "call ghost.x", 0), None);
    }

    #[test]
    fn placeholder_after_new() {
        let mut e = engine();
        assert_eq!(tab(&mut e, "call new#Pl", 0).as_deref(), Some("call new#Player"));
    }

    #[test]
    fn word_after_operand_has_no_members() {
        let mut e = engine();
        assert_eq!(tab(&mut e, "call player pl", 0), None);
    }

    #[test]
    fn live_members_through_the_evaluator() {
        let registry = CommandRegistry::new();
        let evaluator = Evaluator::new(EvalOptions::default());
        let root = arena();
        let source = LiveSource {
            registry: &registry,
            evaluator: &evaluator,
            root: &root,
        };
        let mut e = engine();
        let c = e.complete("call player.He", 0, Direction::Forward, &source);
        assert_eq!(c.map(|c| c.buffer).as_deref(), Some("call player.Heal"));
        let mut e = engine();
        assert_eq!(e.complete("call It", 0, Direction::Forward, &source), None);
    }

    proptest! {
        #[test]
        fn forward_cycle_visits_every_match_then_wraps(
            names in prop::collection::btree_set("[ab]{1,3}", 1..12),
            prefix in "[ab]{0,2}",
        ) {
            let corpus: Vec<String> = names.into_iter().collect();
            let matches = corpus.iter().filter(|c| c.starts_with(&prefix)).count();
            let mut seen = Vec::new();
            let mut current = None;
            for _ in 0..matches {
                current = cycle(&corpus, &prefix, current, Direction::Forward);
                seen.push(current);
            }
            let mut distinct = seen.clone();
            distinct.dedup();
            prop_assert_eq!(distinct.len(), matches);
            let again = cycle(&corpus, &prefix, current, Direction::Forward);
            prop_assert_eq!(again, seen.first().copied().flatten());
        }
    }
}
