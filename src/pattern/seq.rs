//! Sequential composition.

use crate::context::Context;
use crate::location::Location;
use crate::outcome::{Failure, MatchResult, MatchType, ParseResult, Success};
use crate::pattern::{Parser, assemble_result, extend_span};
use crate::span::Span;

/// Run sub-parsers one after another, each picking up where the previous
/// one's result ended.
///
/// `select` reduces each stage's alternatives before the next stage runs.
/// With `select == All` nothing is reduced per stage: every combination of
/// stage alternatives is explored depth-first and the complete paths are
/// reduced once at the end by `match_type`.
///
/// The final result spans from the first stage's match start to the
/// furthest match end and carries every stage's records in order. A named
/// sequence appends one whole-span record on top.
pub struct Seq {
    parsers: Vec<Box<dyn Parser>>,
    match_type: MatchType,
    select: MatchType,
    name: Option<String>,
}

struct StageFrame {
    results: Vec<MatchResult>,
    /// Next alternative to try; the current choice is `next - 1`.
    next: usize,
}

impl Seq {
    /// Panics with fewer than two sub-parsers.
    pub fn new(parsers: Vec<Box<dyn Parser>>) -> Self {
        assert!(parsers.len() >= 2, "Seq needs at least two sub-parsers");
        Self {
            parsers,
            match_type: MatchType::First,
            select: MatchType::First,
            name: None,
        }
    }

    /// Record the whole sequence span under `name`.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// How each stage's alternatives are reduced before the next stage.
    pub fn with_select(mut self, select: MatchType) -> Self {
        self.select = select;
        self
    }

    /// How complete paths are reduced when `select` is `All`.
    pub fn with_match_type(mut self, match_type: MatchType) -> Self {
        self.match_type = match_type;
        self
    }

    fn parse_reduced(&self, loc: Location, ctx: &Context) -> ParseResult {
        let mut cur = loc;
        let mut records = Vec::new();
        let mut span: Option<Span> = None;
        for (i, parser) in self.parsers.iter().enumerate() {
            let succ = match parser.parse(cur, ctx) {
                Ok(s) => s,
                Err(f) => {
                    return Err(Failure::new(
                        "Seq",
                        format!("sub-parser {} failed", i + 1),
                        loc,
                    )
                    .caused_by(vec![f]));
                }
            };
            let result = succ.take_best(self.select);
            span = Some(extend_span(span, result.span));
            records.extend(result.matches);
            cur = result.location;
        }
        Ok(Success::single(assemble_result(
            self.name.as_deref(),
            loc,
            cur,
            span,
            records,
        )))
    }

    /// Depth-first search over the product of stage alternatives, with an
    /// explicit stack of stage cursors.
    fn parse_all(&self, loc: Location, ctx: &Context) -> ParseResult {
        let mut last_failure: Option<Failure> = None;
        let mut stack: Vec<StageFrame> = Vec::new();
        match self.parsers[0].parse(loc, ctx) {
            Ok(s) => stack.push(StageFrame {
                results: s.into_results(),
                next: 0,
            }),
            Err(f) => last_failure = Some(f),
        }

        let mut complete: Vec<MatchResult> = Vec::new();
        loop {
            let depth = stack.len();
            let Some(top) = stack.last_mut() else { break };
            if top.next >= top.results.len() {
                stack.pop();
                continue;
            }
            let choice = top.next;
            top.next += 1;
            let chosen_loc = top.results[choice].location;

            if depth == self.parsers.len() {
                complete.push(self.assemble_path(loc, &stack));
                if self.match_type == MatchType::First {
                    break;
                }
            } else {
                match self.parsers[depth].parse(chosen_loc, ctx) {
                    Ok(s) => stack.push(StageFrame {
                        results: s.into_results(),
                        next: 0,
                    }),
                    Err(f) => last_failure = Some(f),
                }
            }
        }

        if complete.is_empty() {
            return Err(Failure::new("Seq", "no complete path through the sequence", loc)
                .caused_by(last_failure.into_iter().collect()));
        }
        Ok(Success::new(complete).reduce(self.match_type))
    }

    fn assemble_path(&self, loc: Location, stack: &[StageFrame]) -> MatchResult {
        let mut records = Vec::new();
        let mut span: Option<Span> = None;
        let mut end_loc = loc;
        for frame in stack {
            let result = &frame.results[frame.next - 1];
            span = Some(extend_span(span, result.span));
            records.extend(result.matches.iter().cloned());
            end_loc = result.location;
        }
        assemble_result(self.name.as_deref(), loc, end_loc, span, records)
    }
}

impl Parser for Seq {
    fn parse(&self, loc: Location, ctx: &Context) -> ParseResult {
        if self.select == MatchType::All {
            self.parse_all(loc, ctx)
        } else {
            self.parse_reduced(loc, ctx)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnList, Annotation};
    use crate::outcome::MatchData;
    use crate::parsers;
    use crate::pattern::ann::{Ann, AnnAt};

    // Two annotations share the first start; stage two only continues from
    // the short one.
    fn branching() -> (&'static str, Vec<Annotation>) {
        (
            "ab cd",
            vec![
                Annotation::new(0, 2, "Word", 0),
                Annotation::new(0, 5, "Phrase", 1),
                Annotation::new(3, 5, "Number", 2),
            ],
        )
    }

    #[test]
    fn stages_chain_and_records_concatenate() {
        let doc = "ab cd ab";
        let anns = vec![
            Annotation::new(0, 2, "Ann", 0),
            Annotation::new(3, 5, "Ann", 1),
            Annotation::new(6, 8, "Ann", 2),
        ];
        let mut out = AnnList::new();
        let ctx = Context::new(doc, &anns, &mut out);

        let seq = Seq::new(parsers![
            AnnAt::with_type("Ann").named("x"),
            AnnAt::with_type("Ann").named("y"),
        ]);
        let succ = seq.parse(Location::new(0, 0), &ctx).unwrap();
        assert_eq!(succ.len(), 1);
        let result = &succ.results()[0];
        assert_eq!(result.span, Span::new(0, 5));
        assert_eq!(result.location, Location::new(5, 2));
        assert_eq!(result.first_match("x").unwrap().ann().unwrap().id, 0);
        assert_eq!(result.first_match("y").unwrap().ann().unwrap().id, 1);
    }

    #[test]
    fn named_sequence_appends_a_whole_span_record() {
        let doc = "ab cd ab";
        let anns = vec![
            Annotation::new(0, 2, "Ann", 0),
            Annotation::new(3, 5, "Ann", 1),
        ];
        let mut out = AnnList::new();
        let ctx = Context::new(doc, &anns, &mut out);

        let seq = Seq::new(parsers![Ann::any().named("x"), Ann::any()]).named("pair");
        let succ = seq.parse(Location::new(0, 0), &ctx).unwrap();
        let result = &succ.results()[0];
        let whole = result.first_match("pair").unwrap();
        assert_eq!(whole.span, Span::new(0, 5));
        assert_eq!(whole.data, MatchData::Whole);
        assert_eq!(whole.location, Location::new(0, 0));
    }

    #[test]
    fn select_reduces_each_stage_before_the_next() {
        let (doc, anns) = branching();
        let mut out = AnnList::new();
        let ctx = Context::new(doc, &anns, &mut out);

        let stage1 = || AnnAt::any().with_match_type(MatchType::All);

        // First keeps the short Word, and a Number follows it.
        let seq = Seq::new(parsers![stage1(), Ann::with_type("Number")]);
        let succ = seq.parse(Location::new(0, 0), &ctx).unwrap();
        assert_eq!(succ.results()[0].span, Span::new(0, 5));

        // Longest keeps the Phrase, after which nothing remains.
        let seq = Seq::new(parsers![stage1(), Ann::with_type("Number")])
            .with_select(MatchType::Longest);
        let err = seq.parse(Location::new(0, 0), &ctx).unwrap_err();
        assert_eq!(err.parser, "Seq");
        assert!(err.message.contains("sub-parser 2"));
    }

    #[test]
    fn select_all_explores_every_path() {
        let doc = "abcd";
        let anns = vec![
            Annotation::new(0, 2, "X", 0),
            Annotation::new(0, 3, "X", 1),
            Annotation::new(2, 4, "Y", 2),
            Annotation::new(3, 4, "Y", 3),
        ];
        let mut out = AnnList::new();
        let ctx = Context::new(doc, &anns, &mut out);

        let seq = || {
            Seq::new(parsers![
                AnnAt::with_type("X").with_match_type(MatchType::All).named("x"),
                Ann::with_type("Y").named("y"),
            ])
            .with_select(MatchType::All)
        };

        let succ = seq().with_match_type(MatchType::All).parse(Location::new(0, 0), &ctx).unwrap();
        assert_eq!(succ.len(), 2);
        let path_ids: Vec<(usize, usize)> = succ
            .results()
            .iter()
            .map(|r| {
                (
                    r.first_match("x").unwrap().ann().unwrap().id,
                    r.first_match("y").unwrap().ann().unwrap().id,
                )
            })
            .collect();
        // Depth-first, left-to-right discovery order.
        assert_eq!(path_ids, vec![(0, 2), (1, 3)]);

        // First keeps only the first-discovered complete path.
        let succ = seq().parse(Location::new(0, 0), &ctx).unwrap();
        assert_eq!(succ.len(), 1);
        assert_eq!(succ.results()[0].first_match("y").unwrap().ann().unwrap().id, 2);
    }

    #[test]
    fn select_all_fails_when_every_path_dies() {
        let (doc, anns) = branching();
        let mut out = AnnList::new();
        let ctx = Context::new(doc, &anns, &mut out);

        let seq = Seq::new(parsers![
            AnnAt::any().with_match_type(MatchType::All),
            Ann::with_type("Verb"),
        ])
        .with_select(MatchType::All);
        let err = seq.parse(Location::new(0, 0), &ctx).unwrap_err();
        assert_eq!(err.parser, "Seq");
        assert!(!err.causes.is_empty());
    }

    #[test]
    fn failure_names_the_failing_stage() {
        let (doc, anns) = branching();
        let mut out = AnnList::new();
        let ctx = Context::new(doc, &anns, &mut out);

        let seq = Seq::new(parsers![Ann::with_type("Verb"), Ann::any()]);
        let err = seq.parse(Location::new(0, 0), &ctx).unwrap_err();
        assert!(err.message.contains("sub-parser 1"));
        assert_eq!(err.causes[0].parser, "Ann");
    }
}
