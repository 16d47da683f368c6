//! Rule actions.
//!
//! An action runs when the driver fires a rule, never during parsing, so
//! backtracking stays side-effect-free. [`AddAnn`] covers the common case
//! of creating one annotation from the match; anything else is a custom
//! [`Action`] implementation (plain closures qualify).

use anyhow::{Result, anyhow};
use serde_json::Value;

use crate::annotation::{Annotation, Features};
use crate::context::Context;
use crate::outcome::{MatchRecord, MatchResult, Success};
use crate::span::Span;

/// What a fired rule does with its success.
///
/// The returned annotation, if any, ends up in the driver's hits. An
/// `Err` aborts the whole run.
pub trait Action {
    fn fire(&self, succ: &Success, ctx: &Context) -> Result<Option<Annotation>>;
}

impl<F> Action for F
where
    F: Fn(&Success, &Context) -> Result<Option<Annotation>>,
{
    fn fire(&self, succ: &Success, ctx: &Context) -> Result<Option<Annotation>> {
        self(succ, ctx)
    }
}

/// Where an action takes the span for a new annotation from.
#[derive(Debug, Clone)]
pub enum SpanSource {
    /// The whole span of the chosen result.
    Whole,
    /// The span of the first match record under this name.
    Match(String),
    /// A constant span.
    Fixed(Span),
}

impl SpanSource {
    fn resolve(&self, result: &MatchResult) -> Result<Span> {
        match self {
            Self::Whole => Ok(result.span),
            Self::Match(name) => Ok(named(result, name)?.span),
            Self::Fixed(span) => Ok(*span),
        }
    }
}

/// Where the new annotation's type name comes from.
#[derive(Debug, Clone)]
pub enum StrSource {
    Const(String),
    /// The type of the annotation matched under this name.
    TypeOf(String),
}

impl StrSource {
    fn resolve(&self, result: &MatchResult) -> Result<String> {
        match self {
            Self::Const(s) => Ok(s.clone()),
            Self::TypeOf(name) => Ok(named_ann(result, name)?.ann_type.clone()),
        }
    }
}

impl From<&str> for StrSource {
    fn from(s: &str) -> Self {
        Self::Const(s.to_string())
    }
}

impl From<String> for StrSource {
    fn from(s: String) -> Self {
        Self::Const(s)
    }
}

/// Where a feature value on the new annotation comes from.
#[derive(Debug, Clone)]
pub enum ValueSource {
    Const(Value),
    /// A feature of the annotation matched under a name.
    AnnFeature { name: String, feature: String },
    /// The type of the annotation matched under a name.
    AnnType(String),
    /// The document text covered by a named match.
    MatchText(String),
    /// The start offset of a named match's span.
    MatchStart(String),
    /// The end offset of a named match's span.
    MatchEnd(String),
    /// A capture group of a named regex text match, in the pattern's own
    /// group numbering.
    RegexGroup { name: String, group: usize },
}

impl ValueSource {
    fn resolve(&self, result: &MatchResult, ctx: &Context) -> Result<Value> {
        match self {
            Self::Const(v) => Ok(v.clone()),
            Self::AnnFeature { name, feature } => named_ann(result, name)?
                .features
                .get(feature)
                .cloned()
                .ok_or_else(|| anyhow!("annotation {name:?} has no feature {feature:?}")),
            Self::AnnType(name) => Ok(Value::String(named_ann(result, name)?.ann_type.clone())),
            Self::MatchText(name) => {
                Ok(Value::String(ctx.text_of(named(result, name)?.span).to_string()))
            }
            Self::MatchStart(name) => Ok(Value::from(named(result, name)?.span.start)),
            Self::MatchEnd(name) => Ok(Value::from(named(result, name)?.span.end)),
            Self::RegexGroup { name, group } => named(result, name)?
                .group(*group)
                .map(|s| Value::String(s.to_string()))
                .ok_or_else(|| anyhow!("match {name:?} has no regex group {group}")),
        }
    }
}

impl From<Value> for ValueSource {
    fn from(v: Value) -> Self {
        Self::Const(v)
    }
}

fn named<'a>(result: &'a MatchResult, name: &str) -> Result<&'a MatchRecord> {
    result
        .first_match(name)
        .ok_or_else(|| anyhow!("no match named {name:?} in the result"))
}

fn named_ann<'a>(result: &'a MatchResult, name: &str) -> Result<&'a Annotation> {
    named(result, name)?
        .ann()
        .ok_or_else(|| anyhow!("match {name:?} did not record an annotation"))
}

/// Create one annotation through the output collaborator when the rule
/// fires.
///
/// Reads the first result of the success unless told otherwise. Lookup
/// misses (unknown name, absent feature, wrong record shape) abort the run
/// unless the action is [`silent`](AddAnn::silent), in which case the
/// action simply produces nothing.
pub struct AddAnn {
    span: SpanSource,
    ann_type: StrSource,
    features: Vec<(String, ValueSource)>,
    result_index: usize,
    silent: bool,
}

impl AddAnn {
    pub fn new(span: SpanSource, ann_type: impl Into<StrSource>) -> Self {
        Self {
            span,
            ann_type: ann_type.into(),
            features: Vec::new(),
            result_index: 0,
            silent: false,
        }
    }

    pub fn with_feature(mut self, key: impl Into<String>, value: impl Into<ValueSource>) -> Self {
        self.features.push((key.into(), value.into()));
        self
    }

    /// Read the result at this index of the success instead of the first.
    pub fn for_result(mut self, idx: usize) -> Self {
        self.result_index = idx;
        self
    }

    /// Turn lookup misses into "no annotation" instead of aborting.
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    fn try_fire(&self, succ: &Success, ctx: &Context) -> Result<Annotation> {
        let result = succ
            .result(self.result_index)
            .ok_or_else(|| anyhow!("success has no result at index {}", self.result_index))?;
        let span = self.span.resolve(result)?;
        let ann_type = self.ann_type.resolve(result)?;
        let mut features = Features::new();
        for (key, source) in &self.features {
            features.insert(key.clone(), source.resolve(result, ctx)?);
        }
        Ok(ctx.add_out(span, &ann_type, features))
    }
}

impl Action for AddAnn {
    fn fire(&self, succ: &Success, ctx: &Context) -> Result<Option<Annotation>> {
        match self.try_fire(succ, ctx) {
            Ok(ann) => Ok(Some(ann)),
            Err(_) if self.silent => Ok(None),
            Err(e) => Err(e),
        }
    }
}
