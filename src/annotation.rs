//! Annotations and the collaborator seams around them.
//!
//! The engine never owns annotation storage. It reads an ordered
//! `&[Annotation]` slice, and it writes through the [`AnnSink`] trait,
//! the single mutation point of a whole run. Positional constraints query
//! annotations through [`SpatialQuery`]; a plain linear-scan implementation
//! is provided for `Vec<Annotation>` and callers with an indexed store can
//! plug in their own.

use serde_json::Value;

use crate::span::Span;

/// Feature map of an annotation: named, JSON-shaped values.
pub type Features = serde_json::Map<String, Value>;

/// Build a feature map from key/value pairs.
pub fn features<I, K>(pairs: I) -> Features
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// A typed, feature-bearing span of document text.
///
/// Document order is ascending `(start, id)`; the id only breaks ties and
/// is assigned by whatever store the annotation came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub start: usize,
    pub end: usize,
    pub ann_type: String,
    pub features: Features,
    pub id: usize,
}

impl Annotation {
    /// Create an annotation with no features.
    ///
    /// Panics if `start > end`.
    pub fn new(start: usize, end: usize, ann_type: impl Into<String>, id: usize) -> Self {
        assert!(
            start <= end,
            "annotation start {start} is after end {end}"
        );
        Self {
            start,
            end,
            ann_type: ann_type.into(),
            features: Features::new(),
            id,
        }
    }

    /// Replace the feature map.
    pub fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }

    pub fn span(&self) -> Span {
        Span {
            start: self.start,
            end: self.end,
        }
    }

    /// Sort key for document order.
    pub fn order_key(&self) -> (usize, usize) {
        (self.start, self.id)
    }
}

/// True if the slice is in document order (ascending `(start, id)`).
pub fn in_document_order(anns: &[Annotation]) -> bool {
    anns.windows(2).all(|w| w[0].order_key() <= w[1].order_key())
}

/// Output boundary of the engine: where rule actions create annotations.
///
/// Implementations allocate fresh, unique ids; the engine never invents
/// ids itself.
pub trait AnnSink {
    /// Add an annotation and return a copy of it, id filled in.
    fn add(&mut self, span: Span, ann_type: &str, features: Features) -> Annotation;
}

/// Minimal [`AnnSink`]: an ordered list with sequential ids.
#[derive(Debug, Default)]
pub struct AnnList {
    anns: Vec<Annotation>,
    next_id: usize,
}

impl AnnList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start id allocation above ids already taken by an existing store.
    pub fn starting_at(next_id: usize) -> Self {
        Self {
            anns: Vec::new(),
            next_id,
        }
    }

    pub fn len(&self) -> usize {
        self.anns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anns.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.anns.iter()
    }

    pub fn into_vec(self) -> Vec<Annotation> {
        self.anns
    }
}

impl AnnSink for AnnList {
    fn add(&mut self, span: Span, ann_type: &str, features: Features) -> Annotation {
        let ann = Annotation {
            start: span.start,
            end: span.end,
            ann_type: ann_type.to_string(),
            features,
            id: self.next_id,
        };
        self.next_id += 1;
        self.anns.push(ann.clone());
        ann
    }
}

/// Spatial queries behind positional constraints.
///
/// All methods return matches in document order.
pub trait SpatialQuery {
    /// Annotations whose span contains `span` entirely.
    fn covering(&self, span: Span) -> Vec<&Annotation>;
    /// Annotations lying entirely inside `span`.
    fn within(&self, span: Span) -> Vec<&Annotation>;
    /// Annotations sharing at least one text position with `span`.
    fn overlapping(&self, span: Span) -> Vec<&Annotation>;
    /// Annotations with exactly the span `span`.
    fn coextensive(&self, span: Span) -> Vec<&Annotation>;
    /// Annotations starting exactly at `offset`.
    fn starting_at(&self, offset: usize) -> Vec<&Annotation>;
}

impl SpatialQuery for Vec<Annotation> {
    fn covering(&self, span: Span) -> Vec<&Annotation> {
        scan_covering(self, span)
    }

    fn within(&self, span: Span) -> Vec<&Annotation> {
        scan_within(self, span)
    }

    fn overlapping(&self, span: Span) -> Vec<&Annotation> {
        scan_overlapping(self, span)
    }

    fn coextensive(&self, span: Span) -> Vec<&Annotation> {
        scan_coextensive(self, span)
    }

    fn starting_at(&self, offset: usize) -> Vec<&Annotation> {
        scan_starting_at(self, offset)
    }
}

pub(crate) fn scan_covering(anns: &[Annotation], span: Span) -> Vec<&Annotation> {
    anns.iter().filter(|a| a.span().covers(span)).collect()
}

pub(crate) fn scan_within(anns: &[Annotation], span: Span) -> Vec<&Annotation> {
    anns.iter().filter(|a| span.covers(a.span())).collect()
}

pub(crate) fn scan_overlapping(anns: &[Annotation], span: Span) -> Vec<&Annotation> {
    anns.iter().filter(|a| a.span().overlaps(span)).collect()
}

pub(crate) fn scan_coextensive(anns: &[Annotation], span: Span) -> Vec<&Annotation> {
    anns.iter().filter(|a| a.span() == span).collect()
}

pub(crate) fn scan_starting_at(anns: &[Annotation], offset: usize) -> Vec<&Annotation> {
    anns.iter().filter(|a| a.start == offset).collect()
}
