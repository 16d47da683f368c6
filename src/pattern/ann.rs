//! Annotation leaf combinators.

use crate::context::Context;
use crate::location::Location;
use crate::matcher::{AnnMatcher, StrPred};
use crate::outcome::{Failure, MatchData, MatchRecord, MatchResult, MatchType, ParseResult, Success};
use crate::pattern::Parser;

/// Match the single annotation at the cursor.
///
/// By default the annotation cursor is first realigned to the text cursor,
/// so the leaf sees the next annotation starting at or after the current
/// text offset. Building with [`Ann::by_index`] skips the realignment and
/// matches at the raw annotation index instead.
#[derive(Debug)]
pub struct Ann {
    matcher: AnnMatcher,
    name: Option<String>,
    use_offset: bool,
}

impl Ann {
    /// Match any annotation.
    pub fn any() -> Self {
        Self::matching(AnnMatcher::any())
    }

    /// Match an annotation by type name.
    pub fn with_type(pred: impl Into<StrPred>) -> Self {
        Self::matching(AnnMatcher::of_type(pred))
    }

    pub fn matching(matcher: AnnMatcher) -> Self {
        Self {
            matcher,
            name: None,
            use_offset: true,
        }
    }

    /// Record the match under `name`.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Match at the raw annotation index without realigning to the text
    /// cursor first.
    pub fn by_index(mut self) -> Self {
        self.use_offset = false;
        self
    }
}

impl Parser for Ann {
    fn parse(&self, loc: Location, ctx: &Context) -> ParseResult {
        let loc = if self.use_offset {
            ctx.realign_by_offset(loc)
        } else {
            loc
        };
        let Some(ann) = ctx.get_ann(loc) else {
            return Err(Failure::new("Ann", "no annotation at or after the cursor", loc));
        };
        if !self.matcher.matches(ann, ctx) {
            return Err(Failure::new(
                "Ann",
                format!("annotation {} at index {} rejected", ann.id, loc.ann_index),
                loc,
            ));
        }
        let span = ann.span();
        let next = ctx.advance_by_index(loc, 1);
        let mut result = MatchResult::plain(next, span);
        if let Some(name) = &self.name {
            result.matches.push(MatchRecord {
                name: name.clone(),
                location: loc,
                span,
                data: MatchData::Ann(ann.clone()),
            });
        }
        Ok(Success::single(result))
    }
}

/// Match any annotation starting where the cursor's annotation starts.
///
/// Where several annotations share a start offset, plain [`Ann`] only ever
/// sees the first of them; `AnnAt` considers the whole same-start group and
/// reduces the satisfying ones by match type.
#[derive(Debug)]
pub struct AnnAt {
    matcher: AnnMatcher,
    name: Option<String>,
    match_type: MatchType,
    use_offset: bool,
}

impl AnnAt {
    pub fn any() -> Self {
        Self::matching(AnnMatcher::any())
    }

    pub fn with_type(pred: impl Into<StrPred>) -> Self {
        Self::matching(AnnMatcher::of_type(pred))
    }

    pub fn matching(matcher: AnnMatcher) -> Self {
        Self {
            matcher,
            name: None,
            match_type: MatchType::First,
            use_offset: true,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_match_type(mut self, match_type: MatchType) -> Self {
        self.match_type = match_type;
        self
    }

    /// Match at the raw annotation index without realigning first.
    pub fn by_index(mut self) -> Self {
        self.use_offset = false;
        self
    }
}

impl Parser for AnnAt {
    fn parse(&self, loc: Location, ctx: &Context) -> ParseResult {
        let loc = if self.use_offset {
            ctx.realign_by_offset(loc)
        } else {
            loc
        };
        let Some(anchor) = ctx.get_ann(loc) else {
            return Err(Failure::new("AnnAt", "no annotation at or after the cursor", loc));
        };
        let start = anchor.start;

        let mut results = Vec::new();
        for (idx, ann) in ctx.anns().iter().enumerate().skip(loc.ann_index) {
            if ann.start != start {
                break;
            }
            if !self.matcher.matches(ann, ctx) {
                continue;
            }
            let span = ann.span();
            let next = ctx.advance_by_index(Location::new(loc.text_offset, idx), 1);
            let mut result = MatchResult::plain(next, span);
            if let Some(name) = &self.name {
                result.matches.push(MatchRecord {
                    name: name.clone(),
                    location: loc,
                    span,
                    data: MatchData::Ann(ann.clone()),
                });
            }
            results.push(result);
            if let MatchType::First = self.match_type {
                break;
            }
        }

        if results.is_empty() {
            return Err(Failure::new(
                "AnnAt",
                format!("no annotation starting at offset {start} satisfies the matcher"),
                loc,
            ));
        }
        Ok(Success::new(results).reduce(self.match_type))
    }
}
