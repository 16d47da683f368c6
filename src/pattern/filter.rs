//! Result filtering and positional constraints.

use crate::annotation::Annotation;
use crate::context::Context;
use crate::location::Location;
use crate::matcher::AnnMatcher;
use crate::outcome::{Failure, MatchResult, MatchType, ParseResult, Success};
use crate::pattern::Parser;
use crate::span::Span;

/// Keep only the inner results a predicate accepts.
///
/// Each result is kept when `predicate(result, context) == take_if`; the
/// filter fails when nothing survives. The positional constraint methods
/// on [`ParserExt`](crate::pattern::ParserExt) are filters whose predicate
/// tests annotations near the result's span against a second matcher,
/// skipping annotations the result itself already matched.
pub struct Filter {
    inner: Box<dyn Parser>,
    pred: Box<dyn Fn(&MatchResult, &Context) -> bool>,
    take_if: bool,
    match_type: MatchType,
    label: String,
}

/// Where a positional constraint looks for its candidate annotations.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ConstraintKind {
    /// The match lies inside a candidate.
    Within,
    /// A candidate shares the match's exact span.
    Coextensive,
    /// A candidate overlaps the match.
    Overlapping,
    /// A candidate lies inside the match.
    Covering,
    /// A candidate starts exactly at the match start.
    At,
    /// A candidate starts at or after the match end.
    Before,
}

impl ConstraintKind {
    fn label(self) -> &'static str {
        match self {
            Self::Within => "within",
            Self::Coextensive => "coextensive",
            Self::Overlapping => "overlapping",
            Self::Covering => "covering",
            Self::At => "at",
            Self::Before => "before",
        }
    }

    /// Annotations the constraint tests, relative to a match span.
    fn candidates<'a>(self, span: Span, ctx: &Context<'a>) -> Vec<&'a Annotation> {
        match self {
            Self::Within => ctx.covering(span),
            Self::Coextensive => ctx.coextensive(span),
            Self::Overlapping => ctx.overlapping(span),
            Self::Covering => ctx.within(span),
            Self::At => ctx.starting_at(span.start),
            Self::Before => ctx.starting_from(span.end).iter().collect(),
        }
    }
}

impl Filter {
    pub fn new(
        inner: impl Parser + 'static,
        pred: impl Fn(&MatchResult, &Context) -> bool + 'static,
    ) -> Self {
        Self {
            inner: Box::new(inner),
            pred: Box::new(pred),
            take_if: true,
            match_type: MatchType::First,
            label: "predicate".to_string(),
        }
    }

    /// Keep results where the predicate yields `take_if` instead of `true`.
    pub fn with_take_if(mut self, take_if: bool) -> Self {
        self.take_if = take_if;
        self
    }

    /// How the kept results are reduced.
    pub fn with_match_type(mut self, match_type: MatchType) -> Self {
        self.match_type = match_type;
        self
    }

    pub(crate) fn constraint(
        inner: Box<dyn Parser>,
        kind: ConstraintKind,
        matcher: AnnMatcher,
        take_if: bool,
    ) -> Self {
        let label = format!(
            "{}{} constraint",
            if take_if { "" } else { "not_" },
            kind.label()
        );
        let pred = move |result: &MatchResult, ctx: &Context| {
            let matched: Vec<usize> = result
                .matches
                .iter()
                .filter_map(|m| m.ann().map(|a| a.id))
                .collect();
            kind.candidates(result.span, ctx)
                .into_iter()
                .filter(|a| !matched.contains(&a.id))
                .any(|a| matcher.matches(a, ctx))
        };
        Self {
            inner,
            pred: Box::new(pred),
            take_if,
            match_type: MatchType::First,
            label,
        }
    }
}

impl Parser for Filter {
    fn parse(&self, loc: Location, ctx: &Context) -> ParseResult {
        let succ = self.inner.parse(loc, ctx)?;
        let kept: Vec<MatchResult> = succ
            .into_results()
            .into_iter()
            .filter(|r| (self.pred)(r, ctx) == self.take_if)
            .collect();
        if kept.is_empty() {
            return Err(Failure::new(
                "Filter",
                format!("every result was dropped by the {}", self.label),
                loc,
            ));
        }
        Ok(Success::new(kept).reduce(self.match_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnList;
    use crate::pattern::ParserExt;
    use crate::pattern::ann::{Ann, AnnAt};

    // One sentence over three tokens, plus a trailing token outside it.
    const DOC: &str = "The cat sat now";

    fn anns() -> Vec<Annotation> {
        vec![
            Annotation::new(0, 11, "Sentence", 0),
            Annotation::new(0, 3, "Token", 1),
            Annotation::new(4, 7, "Token", 2),
            Annotation::new(8, 11, "Token", 3),
            Annotation::new(12, 15, "Token", 4),
        ]
    }

    #[test]
    fn predicate_keeps_and_drops() {
        let anns = anns();
        let mut out = AnnList::new();
        let ctx = Context::new(DOC, &anns, &mut out);

        let inner = || AnnAt::any().with_match_type(MatchType::All);
        let short = Filter::new(inner(), |r, _| r.span.len() <= 3);
        let succ = short.parse(Location::new(0, 0), &ctx).unwrap();
        assert_eq!(succ.len(), 1);
        assert_eq!(succ.results()[0].span, Span::new(0, 3));

        let none = Filter::new(inner(), |r, _| r.span.len() > 100);
        let err = none.parse(Location::new(0, 0), &ctx).unwrap_err();
        assert_eq!(err.parser, "Filter");
        assert!(err.message.contains("predicate"));
    }

    #[test]
    fn take_if_false_inverts_the_predicate() {
        let anns = anns();
        let mut out = AnnList::new();
        let ctx = Context::new(DOC, &anns, &mut out);

        let long = Filter::new(AnnAt::any().with_match_type(MatchType::All), |r, _| {
            r.span.len() <= 3
        })
        .with_take_if(false);
        let succ = long.parse(Location::new(0, 0), &ctx).unwrap();
        assert_eq!(succ.results()[0].span, Span::new(0, 11));
    }

    #[test]
    fn within_requires_a_containing_annotation() {
        let anns = anns();
        let mut out = AnnList::new();
        let ctx = Context::new(DOC, &anns, &mut out);

        let inside = Ann::with_type("Token").within(AnnMatcher::of_type("Sentence"));
        assert!(inside.parse(Location::new(4, 0), &ctx).is_ok());

        // The trailing token lies outside the sentence.
        let inside = Ann::with_type("Token").within(AnnMatcher::of_type("Sentence"));
        let err = inside.parse(Location::new(12, 0), &ctx).unwrap_err();
        assert!(err.message.contains("within"));

        let outside = Ann::with_type("Token").not_within(AnnMatcher::of_type("Sentence"));
        assert!(outside.parse(Location::new(12, 0), &ctx).is_ok());
    }

    #[test]
    fn covering_requires_a_contained_annotation() {
        let anns = anns();
        let mut out = AnnList::new();
        let ctx = Context::new(DOC, &anns, &mut out);

        let over = Ann::with_type("Sentence").covering(AnnMatcher::of_type("Token"));
        assert!(over.parse(Location::new(0, 0), &ctx).is_ok());

        let over = Ann::with_type("Sentence").covering(AnnMatcher::of_type("Number"));
        assert!(over.parse(Location::new(0, 0), &ctx).is_err());
    }

    #[test]
    fn constraints_skip_annotations_the_result_matched() {
        let anns = anns();
        let mut out = AnnList::new();
        let ctx = Context::new(DOC, &anns, &mut out);

        // Named, the sentence annotation is in the result's records and is
        // not its own coextensive witness.
        let named = Ann::with_type("Sentence")
            .named("s")
            .coextensive(AnnMatcher::any());
        assert!(named.parse(Location::new(0, 0), &ctx).is_err());

        // Unnamed, nothing is recorded, so nothing is skipped.
        let unnamed = Ann::with_type("Sentence").coextensive(AnnMatcher::any());
        assert!(unnamed.parse(Location::new(0, 0), &ctx).is_ok());
    }

    #[test]
    fn at_requires_a_shared_start() {
        let anns = anns();
        let mut out = AnnList::new();
        let ctx = Context::new(DOC, &anns, &mut out);

        // Annotation cursor starting past the sentence, on "The".
        let anchored = Ann::with_type("Token").at(AnnMatcher::of_type("Sentence"));
        assert!(anchored.parse(Location::new(0, 1), &ctx).is_ok());

        // "cat" starts at 4; the sentence starts at 0.
        let anchored = Ann::with_type("Token").at(AnnMatcher::of_type("Sentence"));
        assert!(anchored.parse(Location::new(4, 0), &ctx).is_err());
    }

    #[test]
    fn before_requires_a_following_annotation() {
        let anns = anns();
        let mut out = AnnList::new();
        let ctx = Context::new(DOC, &anns, &mut out);

        let followed = Ann::with_type("Token").before(AnnMatcher::of_type("Token"));
        assert!(followed.parse(Location::new(4, 0), &ctx).is_ok());

        // Nothing starts after the last token.
        let followed = Ann::with_type("Token").before(AnnMatcher::of_type("Token"));
        assert!(followed.parse(Location::new(12, 0), &ctx).is_err());

        let last = Ann::with_type("Token").not_before(AnnMatcher::of_type("Token"));
        assert!(last.parse(Location::new(12, 0), &ctx).is_ok());
    }

    #[test]
    fn overlapping_tests_partial_overlap() {
        let doc = "abcdef";
        let anns = vec![
            Annotation::new(0, 3, "A", 0),
            Annotation::new(2, 5, "B", 1),
            Annotation::new(5, 6, "C", 2),
        ];
        let mut out = AnnList::new();
        let ctx = Context::new(doc, &anns, &mut out);

        let crossed = Ann::with_type("A").overlapping(AnnMatcher::of_type("B"));
        assert!(crossed.parse(Location::new(0, 0), &ctx).is_ok());

        let crossed = Ann::with_type("A").overlapping(AnnMatcher::of_type("C"));
        assert!(crossed.parse(Location::new(0, 0), &ctx).is_err());
    }

    #[test]
    fn match_type_reduces_the_kept_results() {
        let anns = anns();
        let mut out = AnnList::new();
        let ctx = Context::new(DOC, &anns, &mut out);

        let widest = Filter::new(AnnAt::any().with_match_type(MatchType::All), |_, _| true)
            .with_match_type(MatchType::Longest);
        let succ = widest.parse(Location::new(0, 0), &ctx).unwrap();
        assert_eq!(succ.len(), 1);
        assert_eq!(succ.results()[0].span, Span::new(0, 11));
    }
}
