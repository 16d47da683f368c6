//! Annotation predicates.
//!
//! An [`AnnMatcher`] decides whether a single annotation is acceptable,
//! judging its type, its features and the document text it covers. Every
//! operand is one of a closed set of capabilities (literal equality, a
//! compiled regular expression, or a caller-supplied function), resolved
//! when the matcher is built and never re-interpreted per candidate.

use std::fmt;
use std::rc::Rc;

use regex::Regex;
use serde_json::Value;

use crate::annotation::{Annotation, Features};
use crate::context::Context;

pub type StrFn = Rc<dyn Fn(&str) -> bool>;
pub type ValueFn = Rc<dyn Fn(&Value) -> bool>;

/// Predicate over a string operand: an annotation type name or covered
/// text. Regexes use search semantics; anchor explicitly when needed.
#[derive(Clone)]
pub enum StrPred {
    Eq(String),
    Re(Regex),
    Func(StrFn),
}

impl StrPred {
    /// Capability from a plain function.
    pub fn func(f: impl Fn(&str) -> bool + 'static) -> Self {
        StrPred::Func(Rc::new(f))
    }

    pub fn matches(&self, s: &str) -> bool {
        match self {
            StrPred::Eq(want) => want == s,
            StrPred::Re(re) => re.is_match(s),
            StrPred::Func(f) => f(s),
        }
    }
}

impl fmt::Debug for StrPred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrPred::Eq(s) => f.debug_tuple("Eq").field(s).finish(),
            StrPred::Re(re) => f.debug_tuple("Re").field(&re.as_str()).finish(),
            StrPred::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl From<&str> for StrPred {
    fn from(s: &str) -> Self {
        StrPred::Eq(s.to_string())
    }
}

impl From<String> for StrPred {
    fn from(s: String) -> Self {
        StrPred::Eq(s)
    }
}

impl From<Regex> for StrPred {
    fn from(re: Regex) -> Self {
        StrPred::Re(re)
    }
}

/// Predicate over a feature value. The regex capability applies to string
/// values only and rejects everything else.
#[derive(Clone)]
pub enum ValuePred {
    Eq(Value),
    Re(Regex),
    Func(ValueFn),
}

impl ValuePred {
    pub fn func(f: impl Fn(&Value) -> bool + 'static) -> Self {
        ValuePred::Func(Rc::new(f))
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ValuePred::Eq(want) => want == value,
            ValuePred::Re(re) => value.as_str().is_some_and(|s| re.is_match(s)),
            ValuePred::Func(f) => f(value),
        }
    }
}

impl fmt::Debug for ValuePred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValuePred::Eq(v) => f.debug_tuple("Eq").field(v).finish(),
            ValuePred::Re(re) => f.debug_tuple("Re").field(&re.as_str()).finish(),
            ValuePred::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl From<Value> for ValuePred {
    fn from(v: Value) -> Self {
        ValuePred::Eq(v)
    }
}

impl From<Regex> for ValuePred {
    fn from(re: Regex) -> Self {
        ValuePred::Re(re)
    }
}

/// Conjunction of per-feature predicates: every named feature must be
/// present and satisfy its predicate. Extra features are ignored.
#[derive(Clone, Debug, Default)]
pub struct FeatureMatcher {
    preds: Vec<(String, ValuePred)>,
}

impl FeatureMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, pred: impl Into<ValuePred>) -> Self {
        self.preds.push((name.into(), pred.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.preds.is_empty()
    }

    pub fn matches(&self, features: &Features) -> bool {
        self.preds
            .iter()
            .all(|(name, pred)| features.get(name).is_some_and(|v| pred.matches(v)))
    }
}

/// Predicate over a whole annotation.
///
/// All configured parts must hold: type, feature subset, exact feature
/// equality, covered text. An empty matcher accepts every annotation.
#[derive(Clone, Debug, Default)]
pub struct AnnMatcher {
    ann_type: Option<StrPred>,
    features: FeatureMatcher,
    features_eq: Option<Features>,
    text: Option<StrPred>,
}

impl AnnMatcher {
    /// Matcher accepting every annotation.
    pub fn any() -> Self {
        Self::default()
    }

    /// Matcher on the type name alone.
    pub fn of_type(pred: impl Into<StrPred>) -> Self {
        Self::any().with_type(pred)
    }

    pub fn with_type(mut self, pred: impl Into<StrPred>) -> Self {
        self.ann_type = Some(pred.into());
        self
    }

    /// Require a feature to be present and satisfy `pred`.
    pub fn with_feature(mut self, name: impl Into<String>, pred: impl Into<ValuePred>) -> Self {
        self.features = self.features.with(name, pred);
        self
    }

    /// Require the feature map to equal `features` exactly.
    pub fn with_features_eq(mut self, features: Features) -> Self {
        self.features_eq = Some(features);
        self
    }

    /// Require the covered document text to satisfy `pred`.
    pub fn with_text(mut self, pred: impl Into<StrPred>) -> Self {
        self.text = Some(pred.into());
        self
    }

    pub fn matches(&self, ann: &Annotation, ctx: &Context) -> bool {
        if let Some(pred) = &self.ann_type
            && !pred.matches(&ann.ann_type)
        {
            return false;
        }
        if !self.features.matches(&ann.features) {
            return false;
        }
        if let Some(want) = &self.features_eq
            && &ann.features != want
        {
            return false;
        }
        if let Some(pred) = &self.text
            && !pred.matches(ctx.text_of(ann.span()))
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnList, features};
    use serde_json::json;

    fn token(features_in: Features) -> Annotation {
        Annotation::new(0, 5, "Token", 0).with_features(features_in)
    }

    fn with_ctx(doc: &str, ann: &Annotation, f: impl FnOnce(&Context, &Annotation)) {
        let anns = vec![ann.clone()];
        let mut out = AnnList::new();
        let ctx = Context::new(doc, &anns, &mut out);
        f(&ctx, &anns[0]);
    }

    #[test]
    fn empty_matcher_accepts_everything() {
        with_ctx("hello", &token(Features::new()), |ctx, ann| {
            assert!(AnnMatcher::any().matches(ann, ctx));
        });
    }

    #[test]
    fn type_literal_and_regex() {
        with_ctx("hello", &token(Features::new()), |ctx, ann| {
            assert!(AnnMatcher::of_type("Token").matches(ann, ctx));
            assert!(!AnnMatcher::of_type("Person").matches(ann, ctx));
            let re = Regex::new("^Tok").unwrap();
            assert!(AnnMatcher::of_type(re).matches(ann, ctx));
        });
    }

    #[test]
    fn type_function_capability() {
        with_ctx("hello", &token(Features::new()), |ctx, ann| {
            let m = AnnMatcher::any().with_type(StrPred::func(|t| t.len() == 5));
            assert!(m.matches(ann, ctx));
        });
    }

    #[test]
    fn feature_subset_ignores_extras() {
        let ann = token(features([("kind", json!("word")), ("len", json!(5))]));
        with_ctx("hello", &ann, |ctx, ann| {
            let m = AnnMatcher::any().with_feature("kind", json!("word"));
            assert!(m.matches(ann, ctx));
            let m = AnnMatcher::any().with_feature("kind", json!("number"));
            assert!(!m.matches(ann, ctx));
            let m = AnnMatcher::any().with_feature("missing", json!(1));
            assert!(!m.matches(ann, ctx));
        });
    }

    #[test]
    fn feature_value_regex_rejects_non_strings() {
        let ann = token(features([("kind", json!("word")), ("len", json!(5))]));
        with_ctx("hello", &ann, |ctx, ann| {
            let re = Regex::new("^wo").unwrap();
            assert!(AnnMatcher::any().with_feature("kind", re.clone()).matches(ann, ctx));
            assert!(!AnnMatcher::any().with_feature("len", re).matches(ann, ctx));
        });
    }

    #[test]
    fn feature_function_sees_the_value() {
        let ann = token(features([("len", json!(5))]));
        with_ctx("hello", &ann, |ctx, ann| {
            let m = AnnMatcher::any().with_feature(
                "len",
                ValuePred::func(|v| v.as_u64().is_some_and(|n| n > 3)),
            );
            assert!(m.matches(ann, ctx));
        });
    }

    #[test]
    fn features_eq_requires_exact_map() {
        let ann = token(features([("kind", json!("word"))]));
        with_ctx("hello", &ann, |ctx, ann| {
            let m = AnnMatcher::any().with_features_eq(features([("kind", json!("word"))]));
            assert!(m.matches(ann, ctx));
            let m = AnnMatcher::any().with_features_eq(Features::new());
            assert!(!m.matches(ann, ctx));
        });
    }

    #[test]
    fn text_operand_reads_the_document() {
        with_ctx("hello", &token(Features::new()), |ctx, ann| {
            assert!(AnnMatcher::any().with_text("hello").matches(ann, ctx));
            assert!(!AnnMatcher::any().with_text("world").matches(ann, ctx));
            let re = Regex::new("ell").unwrap();
            assert!(AnnMatcher::any().with_text(re).matches(ann, ctx));
        });
    }
}
