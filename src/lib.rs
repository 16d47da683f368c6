//! Pattern matching over annotated text with parser combinators, rules and
//! actions.
//!
//! Patterns walk a document along two cursors at once: a byte offset into
//! the text and an index into the ordered annotation sequence. Combinators
//! compose into rules, and a [`Pampac`] driver scans the document, firing
//! rule actions wherever their patterns match.
//!
//! # Example
//!
//! ```rust
//! use pampac::{
//!     AddAnn, AnnAt, AnnList, Annotation, Pampac, ParserExt, Rule, Span, SpanSource,
//! };
//!
//! let doc = "ab cd ab";
//! let anns = vec![
//!     Annotation::new(0, 2, "Word", 0),
//!     Annotation::new(3, 5, "Word", 1),
//!     Annotation::new(6, 8, "Word", 2),
//! ];
//!
//! // Two consecutive words become a Pair annotation.
//! let pattern = AnnAt::with_type("Word").then(AnnAt::with_type("Word"));
//! let rule = Rule::new(pattern, AddAnn::new(SpanSource::Whole, "Pair"));
//!
//! let mut out = AnnList::new();
//! let hits = Pampac::new(vec![rule]).run(doc, &anns, &mut out).unwrap();
//!
//! assert_eq!(hits.len(), 1);
//! assert_eq!(out.iter().next().unwrap().span(), Span::new(0, 5));
//! ```

mod action;
mod annotation;
mod context;
mod location;
mod matcher;
mod outcome;
mod pampac;
pub mod pattern;
mod rule;
mod span;
mod trace;

pub use action::{Action, AddAnn, SpanSource, StrSource, ValueSource};
pub use annotation::{
    AnnList, AnnSink, Annotation, Features, SpatialQuery, features, in_document_order,
};
pub use context::Context;
pub use location::Location;
pub use matcher::{AnnMatcher, FeatureMatcher, StrFn, StrPred, ValueFn, ValuePred};
pub use outcome::{
    Failure, MatchData, MatchRecord, MatchResult, MatchType, ParseResult, Success,
};
pub use pampac::{Pampac, RuleHit, Select, Skip};
pub use pattern::{
    All, And, Ann, AnnAt, Call, Filter, Find, Lookahead, N, Or, Parser, ParserExt, Seq, Text,
};
pub use rule::Rule;
pub use span::Span;
pub use trace::{NoTrace, Tracer};
