//! Parallel combinators: alternatives tried at one location.

use crate::context::Context;
use crate::location::Location;
use crate::outcome::{Failure, ParseResult, Success};
use crate::pattern::Parser;

/// First succeeding alternative wins; later ones are never tried.
pub struct Or {
    parsers: Vec<Box<dyn Parser>>,
}

impl Or {
    /// Panics with fewer than two alternatives; a one-armed choice is a
    /// configuration error.
    pub fn new(parsers: Vec<Box<dyn Parser>>) -> Self {
        assert!(parsers.len() >= 2, "Or needs at least two sub-parsers");
        Self { parsers }
    }
}

impl Parser for Or {
    fn parse(&self, loc: Location, ctx: &Context) -> ParseResult {
        let mut causes = Vec::new();
        for parser in &self.parsers {
            match parser.parse(loc, ctx) {
                Ok(succ) => return Ok(succ),
                Err(f) => causes.push(f),
            }
        }
        Err(Failure::new("Or", "every alternative failed", loc).caused_by(causes))
    }
}

/// Every sub-parser must match at the same location; their results are
/// concatenated in sub-parser order.
pub struct And {
    parsers: Vec<Box<dyn Parser>>,
}

impl And {
    /// Panics with fewer than two sub-parsers.
    pub fn new(parsers: Vec<Box<dyn Parser>>) -> Self {
        assert!(parsers.len() >= 2, "And needs at least two sub-parsers");
        Self { parsers }
    }
}

impl Parser for And {
    fn parse(&self, loc: Location, ctx: &Context) -> ParseResult {
        let mut results = Vec::new();
        for (i, parser) in self.parsers.iter().enumerate() {
            match parser.parse(loc, ctx) {
                Ok(succ) => results.extend(succ.into_results()),
                Err(f) => {
                    return Err(Failure::new(
                        "And",
                        format!("sub-parser {} failed", i + 1),
                        loc,
                    )
                    .caused_by(vec![f]));
                }
            }
        }
        Ok(Success::new(results))
    }
}

/// Whichever sub-parsers match at the location contribute their results;
/// at least one must.
pub struct All {
    parsers: Vec<Box<dyn Parser>>,
}

impl All {
    /// Panics with fewer than two sub-parsers.
    pub fn new(parsers: Vec<Box<dyn Parser>>) -> Self {
        assert!(parsers.len() >= 2, "All needs at least two sub-parsers");
        Self { parsers }
    }
}

impl Parser for All {
    fn parse(&self, loc: Location, ctx: &Context) -> ParseResult {
        let mut results = Vec::new();
        let mut causes = Vec::new();
        for parser in &self.parsers {
            match parser.parse(loc, ctx) {
                Ok(succ) => results.extend(succ.into_results()),
                Err(f) => causes.push(f),
            }
        }
        if results.is_empty() {
            return Err(Failure::new("All", "no sub-parser matched", loc).caused_by(causes));
        }
        Ok(Success::new(results))
    }
}
