//! The two-cursor parse location.
//!
//! Matching walks the document along two interleaved axes at once: a byte
//! offset into the text and an index into the ordered annotation sequence.
//! A `Location` pairs the two. Combinators never build locations by hand;
//! they go through the `Context` operations so the cursors stay consistent.

use std::fmt;

/// A cursor pair: text offset plus annotation index.
///
/// Either cursor may sit at its end-of-range value (the scan end offset,
/// or one past the last annotation) to mean "exhausted".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    /// Byte offset into the document text.
    pub text_offset: usize,
    /// Index into the annotation sequence of the current scan.
    pub ann_index: usize,
}

impl Location {
    /// Create a new location.
    pub fn new(text_offset: usize, ann_index: usize) -> Self {
        Self {
            text_offset,
            ann_index,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.text_offset, self.ann_index)
    }
}
