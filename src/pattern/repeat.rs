//! Bounded repetition.

use crate::context::Context;
use crate::location::Location;
use crate::outcome::{Failure, MatchResult, MatchType, ParseResult, Success};
use crate::pattern::{Parser, assemble_result, extend_span};
use crate::span::Span;

/// Repeat a sub-parser between `min` and `max` times, greedily.
///
/// An optional `until` parser terminates the repetition: from repetition
/// `min` onward (before every attempt when the terminator is required) it
/// is tried first, and on success the repetition stops with the
/// terminator's records appended and the final location taken from it.
/// A required terminator that never matches fails the whole repetition;
/// an optional one lets the repetition end silently without it.
///
/// `select` reduces each repetition's alternatives as it is consumed.
/// With `select == All` every combination of repetition count and
/// per-step alternative is enumerated depth-first and reduced at the end
/// by `match_type`, longer repetitions discovered first.
pub struct N {
    parser: Box<dyn Parser>,
    min: usize,
    max: usize,
    match_type: MatchType,
    select: MatchType,
    until: Option<Box<dyn Parser>>,
    required_until: bool,
    name: Option<String>,
}

struct RepFrame {
    /// Inner alternatives continuing the repetition from this step; empty
    /// when the step cannot continue.
    results: Vec<MatchResult>,
    /// Next alternative to descend into; the current choice is `next - 1`.
    next: usize,
    /// Emit a completion without a terminator once this step is exhausted.
    stop_here: bool,
}

impl N {
    /// Largest `max` accepted for exhaustive enumeration without an
    /// `until` terminator.
    pub const ALL_MAX_REPS: usize = 10_000;

    /// Panics unless `min <= max` and `max >= 1`.
    pub fn new(parser: impl Parser + 'static, min: usize, max: usize) -> Self {
        assert!(min <= max, "N needs min <= max");
        assert!(max >= 1, "N needs max >= 1");
        Self {
            parser: Box::new(parser),
            min,
            max,
            match_type: MatchType::First,
            select: MatchType::First,
            until: None,
            required_until: false,
            name: None,
        }
    }

    /// Record the whole repetition span under `name`.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// How each repetition's alternatives are reduced as it is consumed.
    pub fn with_select(mut self, select: MatchType) -> Self {
        self.select = select;
        self
    }

    /// How complete repetition paths are reduced when `select` is `All`.
    pub fn with_match_type(mut self, match_type: MatchType) -> Self {
        self.match_type = match_type;
        self
    }

    /// Stop repeating where `until` matches, appending its records.
    pub fn until(mut self, until: impl Parser + 'static) -> Self {
        self.until = Some(Box::new(until));
        self
    }

    /// Like [`N::until`], but the repetition fails outright when the
    /// terminator never matches.
    pub fn until_required(mut self, until: impl Parser + 'static) -> Self {
        self.until = Some(Box::new(until));
        self.required_until = true;
        self
    }

    fn parse_greedy(&self, loc: Location, ctx: &Context) -> ParseResult {
        let mut cur = loc;
        let mut records = Vec::new();
        let mut span: Option<Span> = None;
        let mut count = 0;
        let mut last_until_failure: Option<Failure> = None;
        loop {
            // The terminator is tried before each attempt; at `max` no
            // attempts remain, so only a required one gets a final try.
            if count >= self.max {
                if let Some(until) = &self.until
                    && self.required_until
                {
                    return match until.parse(cur, ctx) {
                        Ok(s) => {
                            let result = s.take_best(self.select);
                            span = Some(extend_span(span, result.span));
                            records.extend(result.matches);
                            cur = result.location;
                            Ok(Success::single(assemble_result(
                                self.name.as_deref(),
                                loc,
                                cur,
                                span,
                                records,
                            )))
                        }
                        Err(f) => Err(Failure::new("N", "the until parser never matched", loc)
                            .caused_by(vec![f])),
                    };
                }
                return Ok(Success::single(assemble_result(
                    self.name.as_deref(),
                    loc,
                    cur,
                    span,
                    records,
                )));
            }
            if let Some(until) = &self.until
                && (self.required_until || count >= self.min)
            {
                match until.parse(cur, ctx) {
                    Ok(s) => {
                        let result = s.take_best(self.select);
                        span = Some(extend_span(span, result.span));
                        records.extend(result.matches);
                        cur = result.location;
                        return Ok(Success::single(assemble_result(
                            self.name.as_deref(),
                            loc,
                            cur,
                            span,
                            records,
                        )));
                    }
                    Err(f) => last_until_failure = Some(f),
                }
            }
            match self.parser.parse(cur, ctx) {
                Ok(s) => {
                    let result = s.take_best(self.select);
                    span = Some(extend_span(span, result.span));
                    records.extend(result.matches);
                    cur = result.location;
                    count += 1;
                }
                Err(f) => {
                    if count < self.min {
                        return Err(Failure::new(
                            "N",
                            format!(
                                "sub-parser matched {count} of at least {} repetitions",
                                self.min
                            ),
                            loc,
                        )
                        .caused_by(vec![f]));
                    }
                    if self.required_until {
                        return Err(Failure::new("N", "the until parser never matched", loc)
                            .caused_by(last_until_failure.into_iter().chain([f]).collect()));
                    }
                    return Ok(Success::single(assemble_result(
                        self.name.as_deref(),
                        loc,
                        cur,
                        span,
                        records,
                    )));
                }
            }
        }
    }

    /// Depth-first enumeration across repetition counts and per-step
    /// alternatives, with an explicit stack. At each step the terminator
    /// is tried first (ending the path there), then deeper repetitions,
    /// and a bare stop is emitted last, so longer paths come first.
    fn parse_all(&self, loc: Location, ctx: &Context) -> ParseResult {
        assert!(
            self.until.is_some() || self.max <= Self::ALL_MAX_REPS,
            "N with select == All and no until needs max <= {}",
            Self::ALL_MAX_REPS,
        );
        let first_only = self.match_type == MatchType::First;
        let mut complete: Vec<MatchResult> = Vec::new();
        let mut last_failure: Option<Failure> = None;
        let mut stack: Vec<RepFrame> = Vec::new();
        self.open_step(loc, loc, ctx, &mut stack, &mut complete, &mut last_failure);

        loop {
            if first_only && !complete.is_empty() {
                break;
            }
            let Some(top) = stack.last_mut() else { break };
            if top.next >= top.results.len() {
                let stop = top.stop_here;
                stack.pop();
                if stop {
                    complete.push(assemble_path(self.name.as_deref(), loc, &stack, None));
                }
                continue;
            }
            let choice = top.next;
            top.next += 1;
            let next_loc = top.results[choice].location;
            self.open_step(loc, next_loc, ctx, &mut stack, &mut complete, &mut last_failure);
        }

        if complete.is_empty() {
            return Err(
                Failure::new("N", "no complete path through the repetition", loc)
                    .caused_by(last_failure.into_iter().collect()),
            );
        }
        Ok(Success::new(complete).reduce(self.match_type))
    }

    /// Expand one repetition step at `cur` and push its frame. The frames
    /// already on the stack hold the choices that led here, so their
    /// count is the number of repetitions consumed so far.
    fn open_step(
        &self,
        start: Location,
        cur: Location,
        ctx: &Context,
        stack: &mut Vec<RepFrame>,
        complete: &mut Vec<MatchResult>,
        last_failure: &mut Option<Failure>,
    ) {
        let count = stack.len();
        let mut until_hit = false;
        // As in the greedy path, `max` leaves no attempts: only a required
        // terminator still gets a try there.
        if let Some(until) = &self.until
            && (self.required_until || (count >= self.min && count < self.max))
        {
            match until.parse(cur, ctx) {
                Ok(s) => {
                    until_hit = true;
                    for tail in s.into_results() {
                        complete.push(assemble_path(
                            self.name.as_deref(),
                            start,
                            stack,
                            Some(tail),
                        ));
                    }
                }
                Err(f) => *last_failure = Some(f),
            }
        }
        let results = if until_hit || count >= self.max {
            Vec::new()
        } else {
            match self.parser.parse(cur, ctx) {
                Ok(s) => s.into_results(),
                Err(f) => {
                    *last_failure = Some(f);
                    Vec::new()
                }
            }
        };
        let stop_here = match &self.until {
            None => count >= self.min,
            Some(_) if self.required_until => false,
            Some(_) => !until_hit && results.is_empty() && count >= self.min,
        };
        stack.push(RepFrame {
            results,
            next: 0,
            stop_here,
        });
    }
}

impl Parser for N {
    fn parse(&self, loc: Location, ctx: &Context) -> ParseResult {
        if self.select == MatchType::All {
            self.parse_all(loc, ctx)
        } else {
            self.parse_greedy(loc, ctx)
        }
    }
}

fn assemble_path(
    name: Option<&str>,
    start: Location,
    frames: &[RepFrame],
    tail: Option<MatchResult>,
) -> MatchResult {
    let mut records = Vec::new();
    let mut span: Option<Span> = None;
    let mut end = start;
    for frame in frames {
        let result = &frame.results[frame.next - 1];
        span = Some(extend_span(span, result.span));
        records.extend(result.matches.iter().cloned());
        end = result.location;
    }
    if let Some(tail) = tail {
        span = Some(extend_span(span, tail.span));
        records.extend(tail.matches);
        end = tail.location;
    }
    assemble_result(name, start, end, span, records)
}
