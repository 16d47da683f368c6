//! Half-open text spans.
//!
//! All offsets are byte offsets into the UTF-8 document text. A span never
//! changes once produced; engine code derives new spans instead of editing
//! old ones.

use std::fmt;

use crate::annotation::Annotation;

/// A half-open region of document text, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Create a new span.
    ///
    /// Panics if `start > end`; malformed spans are a construction error,
    /// not a match failure.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(start <= end, "span start {start} is after end {end}");
        Self { start, end }
    }

    /// Zero-width span at a single offset.
    pub fn point(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if `other` lies entirely inside this span.
    pub fn covers(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// True if the two spans share at least one text position.
    ///
    /// A zero-width span overlaps a span that strictly contains its offset.
    pub fn overlaps(&self, other: Span) -> bool {
        if self.is_empty() {
            return other.start <= self.start && self.start < other.end;
        }
        if other.is_empty() {
            return self.start <= other.start && other.start < self.end;
        }
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{})", self.start, self.end)
    }
}

impl From<(usize, usize)> for Span {
    fn from((start, end): (usize, usize)) -> Self {
        Span::new(start, end)
    }
}

impl From<&Annotation> for Span {
    fn from(ann: &Annotation) -> Self {
        ann.span()
    }
}
