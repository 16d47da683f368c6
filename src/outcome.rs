//! Match outcomes: results, successes, failures.
//!
//! A parse attempt yields either a [`Success`] carrying one or more
//! alternative [`MatchResult`]s, or a [`Failure`] describing why nothing
//! matched. Failure is a normal value, not a Rust error; `ParseResult`
//! only uses `Result` so combinators can propagate with `?` where a
//! sub-failure fails the whole.

use std::fmt;

use crate::annotation::Annotation;
use crate::location::Location;
use crate::span::Span;

/// How a set of alternative results is reduced to the ones kept.
///
/// `Longest` and `Shortest` compare span ends; the first-discovered result
/// wins ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchType {
    #[default]
    First,
    Longest,
    Shortest,
    All,
}

/// What a named match observed.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchData {
    /// An annotation match; the annotation is copied at match time.
    Ann(Annotation),
    /// A text match with any regex capture groups.
    Text {
        text: String,
        groups: Vec<Option<String>>,
    },
    /// A whole-span record appended by a named `Seq` or `N`.
    Whole,
}

/// One named observation inside a result.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub name: String,
    /// Location before this sub-match.
    pub location: Location,
    pub span: Span,
    pub data: MatchData,
}

impl MatchRecord {
    /// The matched annotation, if this record came from an annotation match.
    pub fn ann(&self) -> Option<&Annotation> {
        match &self.data {
            MatchData::Ann(ann) => Some(ann),
            _ => None,
        }
    }

    /// The matched text, if this record came from a text match.
    pub fn text(&self) -> Option<&str> {
        match &self.data {
            MatchData::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    /// A regex capture group of a text match, in the pattern's own
    /// numbering: group 0 is the whole match.
    pub fn group(&self, idx: usize) -> Option<&str> {
        match &self.data {
            MatchData::Text { text, groups } => match idx.checked_sub(1) {
                None => Some(text),
                Some(i) => groups.get(i)?.as_deref(),
            },
            _ => None,
        }
    }
}

/// One complete way a parser matched: where matching ended, the text it
/// consumed, and every named observation along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub location: Location,
    pub span: Span,
    pub matches: Vec<MatchRecord>,
}

impl MatchResult {
    /// Result with no named observations.
    pub fn plain(location: Location, span: Span) -> Self {
        Self {
            location,
            span,
            matches: Vec::new(),
        }
    }

    /// All records under `name`, in match order.
    pub fn matches_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MatchRecord> {
        self.matches.iter().filter(move |m| m.name == name)
    }

    /// The first record under `name`.
    pub fn first_match(&self, name: &str) -> Option<&MatchRecord> {
        self.matches.iter().find(|m| m.name == name)
    }
}

/// A successful parse: alternative results in discovery order, never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Success {
    results: Vec<MatchResult>,
}

impl Success {
    /// Success with exactly one result.
    pub fn single(result: MatchResult) -> Self {
        Self {
            results: vec![result],
        }
    }

    /// Success from alternatives in discovery order.
    ///
    /// An empty alternative set is a combinator bug, not a match failure.
    pub fn new(results: Vec<MatchResult>) -> Self {
        debug_assert!(!results.is_empty(), "a Success must carry results");
        Self { results }
    }

    pub fn results(&self) -> &[MatchResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<MatchResult> {
        self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn result(&self, idx: usize) -> Option<&MatchResult> {
        self.results.get(idx)
    }

    /// Index of the result a single-pick reduction keeps.
    ///
    /// `All` keeps everything; as a single pick it falls back to the first.
    pub fn best_index(&self, match_type: MatchType) -> usize {
        match match_type {
            MatchType::First | MatchType::All => 0,
            MatchType::Longest => {
                let mut best = 0;
                for (i, r) in self.results.iter().enumerate().skip(1) {
                    if r.span.end > self.results[best].span.end {
                        best = i;
                    }
                }
                best
            }
            MatchType::Shortest => {
                let mut best = 0;
                for (i, r) in self.results.iter().enumerate().skip(1) {
                    if r.span.end < self.results[best].span.end {
                        best = i;
                    }
                }
                best
            }
        }
    }

    /// The result a single-pick reduction keeps.
    pub fn best(&self, match_type: MatchType) -> &MatchResult {
        &self.results[self.best_index(match_type)]
    }

    /// Remove and return the result a single-pick reduction keeps.
    pub fn take_best(self, match_type: MatchType) -> MatchResult {
        let idx = self.best_index(match_type);
        let mut results = self.results;
        results.swap_remove(idx)
    }

    /// Reduce to the results the match type keeps.
    pub fn reduce(mut self, match_type: MatchType) -> Success {
        if let MatchType::All = match_type {
            return self;
        }
        let keep = self.best_index(match_type);
        Success {
            results: vec![self.results.swap_remove(keep)],
        }
    }
}

/// Why a parse attempt did not match.
///
/// Failures chain: a structural combinator records the sub-failures that
/// sank it as causes. They never carry partial results.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    /// Name of the combinator or rule that failed.
    pub parser: String,
    pub message: String,
    pub location: Location,
    pub causes: Vec<Failure>,
}

impl Failure {
    pub fn new(parser: impl Into<String>, message: impl Into<String>, location: Location) -> Self {
        Self {
            parser: parser.into(),
            message: message.into(),
            location,
            causes: Vec::new(),
        }
    }

    /// Attach the sub-failures that caused this one.
    pub fn caused_by(mut self, causes: Vec<Failure>) -> Self {
        self.causes = causes;
        self
    }

    /// Full failure trace, one line per failure, causes indented below.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.describe_into(&mut out, 0);
        out
    }

    fn describe_into(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        if depth > 0 {
            out.push_str("caused by: ");
        }
        out.push_str(&format!(
            "{} at {}: {}",
            self.parser, self.location, self.message
        ));
        for cause in &self.causes {
            out.push('\n');
            cause.describe_into(out, depth + 1);
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.parser, self.location, self.message)
    }
}

/// Outcome of one parse attempt.
pub type ParseResult = Result<Success, Failure>;
