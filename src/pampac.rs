//! The rule scheduler.
//!
//! A [`Pampac`] scans a document from left to right. At each location it
//! tries every rule's pattern, decides by its [`Select`] policy which of
//! the matching rules fire, runs their actions, and advances by its
//! [`Skip`] policy. One run never suspends: it walks to the end of the
//! text or of the annotations and returns every firing as a [`RuleHit`].

use anyhow::{Result, bail};
use itertools::Itertools;

use crate::annotation::{AnnSink, Annotation};
use crate::context::Context;
use crate::outcome::Success;
use crate::pattern::Parser;
use crate::rule::Rule;
use crate::span::Span;
use crate::trace::{NoTrace, Tracer};

/// How the cursor advances after rules fire at a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Skip {
    /// One past the smallest matched span start.
    One,
    /// To the greatest text offset any fired result reached.
    #[default]
    Longest,
    /// To the location-wise greatest fired location (text offset, then
    /// annotation index).
    Next,
    /// Stop the sub-scan after the first firing location.
    Once,
}

/// Which of the rules matching at a location fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Select {
    /// The first matching rule in rule order; later rules are not tried.
    #[default]
    First,
    /// Every matching rule of maximum priority.
    Highest,
    /// Every matching rule.
    All,
}

/// One location where rules fired: its text offset plus every fired
/// action's return value, in firing order.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleHit {
    pub offset: usize,
    pub outputs: Vec<Option<Annotation>>,
}

pub struct Pampac {
    rules: Vec<Rule>,
    skip: Skip,
    select: Select,
    tracer: Box<dyn Tracer>,
}

impl Pampac {
    /// Panics without rules.
    pub fn new(rules: Vec<Rule>) -> Self {
        assert!(!rules.is_empty(), "Pampac needs at least one rule");
        Self {
            rules,
            skip: Skip::default(),
            select: Select::default(),
            tracer: Box::new(NoTrace),
        }
    }

    pub fn with_skip(mut self, skip: Skip) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_select(mut self, select: Select) -> Self {
        self.select = select;
        self
    }

    /// Observe the match loop through `tracer` instead of silence.
    pub fn with_tracer(mut self, tracer: impl Tracer + 'static) -> Self {
        self.tracer = Box::new(tracer);
        self
    }

    /// Scan the whole document.
    pub fn run(
        &self,
        doc: &str,
        anns: &[Annotation],
        outset: &mut dyn AnnSink,
    ) -> Result<Vec<RuleHit>> {
        self.run_between(doc, anns, outset, 0, doc.len())
    }

    /// Scan `[start, end)` of the document, considering only the
    /// annotations lying entirely inside it.
    pub fn run_between(
        &self,
        doc: &str,
        anns: &[Annotation],
        outset: &mut dyn AnnSink,
        start: usize,
        end: usize,
    ) -> Result<Vec<RuleHit>> {
        validate_range(doc, start, end)?;
        let restricted = restrict(anns, start, end);
        let ctx = Context::between(doc, &restricted, outset, start, end);
        let mut hits = Vec::new();
        self.scan(&ctx, &mut hits)?;
        Ok(hits)
    }

    /// One independent sub-scan per containing span, results concatenated.
    ///
    /// Each sub-scan sees only the annotations lying entirely inside its
    /// span. The spans must not overlap; that is the caller's obligation
    /// and is not checked.
    pub fn run_within(
        &self,
        doc: &str,
        anns: &[Annotation],
        outset: &mut dyn AnnSink,
        containing: &[Span],
    ) -> Result<Vec<RuleHit>> {
        let mut hits = Vec::new();
        for span in containing {
            validate_range(doc, span.start, span.end)?;
            let restricted = restrict(anns, span.start, span.end);
            let ctx = Context::between(doc, &restricted, &mut *outset, span.start, span.end);
            self.scan(&ctx, &mut hits)?;
        }
        Ok(hits)
    }

    fn scan(&self, ctx: &Context, hits: &mut Vec<RuleHit>) -> Result<()> {
        let mut loc = ctx.start_location();
        while !ctx.at_end_of_text(loc) && !ctx.at_end_of_anns(loc) {
            let mut fired: Vec<(usize, Success)> = Vec::new();
            for (i, rule) in self.rules.iter().enumerate() {
                self.tracer.rule_tried(i, loc);
                if let Ok(succ) = rule.parse(loc, ctx) {
                    self.tracer.rule_matched(i, loc, succ.len());
                    fired.push((i, succ));
                    if self.select == Select::First {
                        break;
                    }
                }
            }
            if self.select == Select::Highest {
                fired = fired
                    .into_iter()
                    .max_set_by_key(|(i, _)| self.rules[*i].priority());
            }

            if fired.is_empty() {
                loc = ctx.advance_by_offset(loc, 1);
                self.tracer.advanced(loc);
                continue;
            }

            let mut outputs = Vec::new();
            for (i, succ) in &fired {
                self.tracer.rule_fired(*i, loc);
                outputs.extend(self.rules[*i].fire(succ, ctx)?);
            }
            hits.push(RuleHit {
                offset: loc.text_offset,
                outputs,
            });

            match self.skip {
                Skip::Once => break,
                Skip::One => {
                    let min_start = fired
                        .iter()
                        .flat_map(|(_, s)| s.results().iter())
                        .map(|r| r.span.start)
                        .min()
                        .unwrap_or(loc.text_offset);
                    let delta = (min_start + 1).saturating_sub(loc.text_offset).max(1);
                    loc = ctx.advance_by_offset(loc, delta);
                }
                Skip::Longest => {
                    let furthest = fired
                        .iter()
                        .flat_map(|(_, s)| s.results().iter())
                        .map(|r| r.location.text_offset)
                        .max()
                        .unwrap_or(loc.text_offset);
                    let delta = furthest.saturating_sub(loc.text_offset).max(1);
                    loc = ctx.advance_by_offset(loc, delta);
                }
                Skip::Next => {
                    let next = fired
                        .iter()
                        .flat_map(|(_, s)| s.results().iter())
                        .map(|r| r.location)
                        .max_by_key(|l| (l.text_offset, l.ann_index))
                        .unwrap_or(loc);
                    loc = if (next.text_offset, next.ann_index)
                        > (loc.text_offset, loc.ann_index)
                    {
                        next
                    } else {
                        ctx.advance_by_offset(loc, 1)
                    };
                }
            }
            self.tracer.advanced(loc);
        }
        Ok(())
    }
}

fn validate_range(doc: &str, start: usize, end: usize) -> Result<()> {
    if start > end || end > doc.len() {
        bail!(
            "scan range [{start},{end}) does not fit a document of {} bytes",
            doc.len()
        );
    }
    if !doc.is_char_boundary(start) || !doc.is_char_boundary(end) {
        bail!("scan range [{start},{end}) does not lie on character boundaries");
    }
    Ok(())
}

/// The annotations lying entirely inside `[start, end)`, cloned in order.
fn restrict(anns: &[Annotation], start: usize, end: usize) -> Vec<Annotation> {
    anns.iter()
        .filter(|a| start <= a.start && a.end <= end)
        .cloned()
        .collect()
}
