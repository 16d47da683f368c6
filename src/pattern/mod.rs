//! Pattern combinators.
//!
//! A pattern is a tree of combinators, each one attempt from a
//! [`Location`] within a [`Context`] to a `Success | Failure` outcome.
//!
//! # Combinators
//!
//! | Combinator   | Matches                                                   |
//! |--------------|-----------------------------------------------------------|
//! | `Ann`        | The annotation at the cursor                              |
//! | `AnnAt`      | Any annotation sharing the cursor's start offset          |
//! | `Text`       | A literal or regex, anchored at the text cursor           |
//! | `Find`       | The first place at/after the cursor where inner matches   |
//! | `Lookahead`  | Inner, but only where a check pattern follows             |
//! | `Or`         | The first succeeding alternative                          |
//! | `And`        | Every sub-pattern at the same place                       |
//! | `All`        | Whichever sub-patterns match at the same place            |
//! | `Seq`        | Sub-patterns one after another                            |
//! | `N`          | Bounded repetition, optionally up to a terminator         |
//! | `Filter`     | Inner, with results vetted by a predicate                 |
//! | `Call`       | Inner, with side-effect hooks on the outcome              |
//!
//! Positional constraints (`within`, `notat`, `before`, …) are `Filter`s
//! built by the [`ParserExt`] methods.

pub mod ann;
pub mod call;
pub mod filter;
pub mod find;
pub mod group;
pub mod repeat;
pub mod seq;
pub mod text;


pub use ann::{Ann, AnnAt};
pub use call::Call;
pub use filter::Filter;
pub use find::{Find, Lookahead};
pub use group::{All, And, Or};
pub use repeat::N;
pub use seq::Seq;
pub use text::Text;

use crate::context::Context;
use crate::location::Location;
use crate::matcher::AnnMatcher;
use crate::outcome::{MatchData, MatchRecord, MatchResult, ParseResult};
use crate::span::Span;

use filter::ConstraintKind;

/// A pattern combinator: one parse attempt from a location.
///
/// Implementations never mutate anything; all cursor movement goes through
/// the [`Context`] operations and comes back in the outcome.
pub trait Parser {
    fn parse(&self, loc: Location, ctx: &Context) -> ParseResult;
}

impl Parser for Box<dyn Parser> {
    fn parse(&self, loc: Location, ctx: &Context) -> ParseResult {
        (**self).parse(loc, ctx)
    }
}

/// Widen the span accumulated over earlier stages by one more stage.
///
/// The start stays at the first stage's start; the end only ever grows, so
/// a later stage ending before an earlier one cannot produce an inverted
/// span.
pub(crate) fn extend_span(acc: Option<Span>, next: Span) -> Span {
    match acc {
        None => next,
        Some(s) => Span {
            start: s.start,
            end: s.end.max(next.end),
        },
    }
}

/// Build the final result of a multi-stage parser: the concatenated stage
/// records, the combined span (a point at `start` when no stage matched
/// anything), and one whole-span record on top when the parser is named.
pub(crate) fn assemble_result(
    name: Option<&str>,
    start: Location,
    end: Location,
    span: Option<Span>,
    mut records: Vec<MatchRecord>,
) -> MatchResult {
    let span = span.unwrap_or_else(|| Span::point(start.text_offset));
    if let Some(name) = name {
        records.push(MatchRecord {
            name: name.to_string(),
            location: start,
            span,
            data: MatchData::Whole,
        });
    }
    MatchResult {
        location: end,
        span,
        matches: records,
    }
}

/// Collect parsers into the boxed form the structural combinators take.
#[macro_export]
macro_rules! parsers {
    ($($p:expr),+ $(,)?) => {
        vec![$(Box::new($p) as Box<dyn $crate::pattern::Parser>),+]
    };
}

/// Combinator sugar on every parser.
pub trait ParserExt: Parser + Sized + 'static {
    fn boxed(self) -> Box<dyn Parser> {
        Box::new(self)
    }

    /// This parser, then `next`: a two-stage [`Seq`].
    fn then(self, next: impl Parser + 'static) -> Seq {
        Seq::new(vec![self.boxed(), Box::new(next)])
    }

    /// This parser, or else `other`: a two-way [`Or`].
    fn or(self, other: impl Parser + 'static) -> Or {
        Or::new(vec![self.boxed(), Box::new(other)])
    }

    /// Keep only results from which `check` also matches.
    fn lookahead(self, check: impl Parser + 'static) -> Lookahead {
        Lookahead::new(self, check)
    }

    // --- Positional constraints ---

    /// Match must lie inside an annotation accepted by `matcher`.
    fn within(self, matcher: AnnMatcher) -> Filter {
        Filter::constraint(self.boxed(), ConstraintKind::Within, matcher, true)
    }

    fn not_within(self, matcher: AnnMatcher) -> Filter {
        Filter::constraint(self.boxed(), ConstraintKind::Within, matcher, false)
    }

    /// Match must share its exact span with such an annotation.
    fn coextensive(self, matcher: AnnMatcher) -> Filter {
        Filter::constraint(self.boxed(), ConstraintKind::Coextensive, matcher, true)
    }

    fn not_coextensive(self, matcher: AnnMatcher) -> Filter {
        Filter::constraint(self.boxed(), ConstraintKind::Coextensive, matcher, false)
    }

    /// Match must overlap such an annotation.
    fn overlapping(self, matcher: AnnMatcher) -> Filter {
        Filter::constraint(self.boxed(), ConstraintKind::Overlapping, matcher, true)
    }

    fn not_overlapping(self, matcher: AnnMatcher) -> Filter {
        Filter::constraint(self.boxed(), ConstraintKind::Overlapping, matcher, false)
    }

    /// Match must contain such an annotation entirely.
    fn covering(self, matcher: AnnMatcher) -> Filter {
        Filter::constraint(self.boxed(), ConstraintKind::Covering, matcher, true)
    }

    fn not_covering(self, matcher: AnnMatcher) -> Filter {
        Filter::constraint(self.boxed(), ConstraintKind::Covering, matcher, false)
    }

    /// Such an annotation must start exactly at the match start.
    fn at(self, matcher: AnnMatcher) -> Filter {
        Filter::constraint(self.boxed(), ConstraintKind::At, matcher, true)
    }

    fn not_at(self, matcher: AnnMatcher) -> Filter {
        Filter::constraint(self.boxed(), ConstraintKind::At, matcher, false)
    }

    /// Such an annotation must start at or after the match end.
    fn before(self, matcher: AnnMatcher) -> Filter {
        Filter::constraint(self.boxed(), ConstraintKind::Before, matcher, true)
    }

    fn not_before(self, matcher: AnnMatcher) -> Filter {
        Filter::constraint(self.boxed(), ConstraintKind::Before, matcher, false)
    }
}

impl<P: Parser + 'static> ParserExt for P {}
