//! Search combinators: retry a pattern at successive locations.

use crate::context::Context;
use crate::location::Location;
use crate::outcome::{Failure, MatchType, ParseResult, Success};
use crate::pattern::Parser;

/// Try `inner` at the cursor, then at each following location until it
/// matches or the scan range runs out.
///
/// Stepping is by annotation index by default; [`Find::by_text`] steps one
/// text offset at a time instead, which is the right mode for pure text
/// patterns.
pub struct Find {
    inner: Box<dyn Parser>,
    by_anns: bool,
}

impl Find {
    pub fn new(inner: impl Parser + 'static) -> Self {
        Self {
            inner: Box::new(inner),
            by_anns: true,
        }
    }

    /// Step by one text offset instead of one annotation.
    pub fn by_text(mut self) -> Self {
        self.by_anns = false;
        self
    }
}

impl Parser for Find {
    fn parse(&self, loc: Location, ctx: &Context) -> ParseResult {
        let mut cur = loc;
        let last_failure = loop {
            let failure = match self.inner.parse(cur, ctx) {
                Ok(succ) => return Ok(succ),
                Err(f) => f,
            };
            if self.by_anns {
                if ctx.at_end_of_anns(cur) {
                    break failure;
                }
                cur = ctx.advance_by_index(cur, 1);
            } else {
                if ctx.at_end_of_text(cur) {
                    break failure;
                }
                cur = ctx.advance_by_offset(cur, 1);
            }
        };
        Err(Failure::new("Find", "no match up to the end of the scan", loc)
            .caused_by(vec![last_failure]))
    }
}

/// Keep only inner results from whose end location `check` also matches.
///
/// The check pattern's own match is discarded; it consumes nothing.
pub struct Lookahead {
    inner: Box<dyn Parser>,
    check: Box<dyn Parser>,
    match_type: MatchType,
}

impl Lookahead {
    pub fn new(inner: impl Parser + 'static, check: impl Parser + 'static) -> Self {
        Self {
            inner: Box::new(inner),
            check: Box::new(check),
            match_type: MatchType::First,
        }
    }

    pub fn with_match_type(mut self, match_type: MatchType) -> Self {
        self.match_type = match_type;
        self
    }
}

impl Parser for Lookahead {
    fn parse(&self, loc: Location, ctx: &Context) -> ParseResult {
        let succ = self.inner.parse(loc, ctx)?;
        let kept: Vec<_> = succ
            .into_results()
            .into_iter()
            .filter(|r| self.check.parse(r.location, ctx).is_ok())
            .collect();
        if kept.is_empty() {
            return Err(Failure::new(
                "Lookahead",
                "no result is followed by the check pattern",
                loc,
            ));
        }
        Ok(Success::new(kept).reduce(self.match_type))
    }
}
