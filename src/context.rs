//! Read-only state of one scan, plus the cursor operations on it.
//!
//! A `Context` bundles the document text, the annotation slice restricted
//! to the scanned range, the scan bounds, and the output sink. It is built
//! once per (sub-)scan and never changes while parsing; the sink behind the
//! `RefCell` is the single mutation point, reachable only from rule
//! actions.
//!
//! All [`Location`] movement goes through the methods here so the two
//! cursors stay consistent: the annotation index never points at an
//! annotation starting before the text offset it was aligned to.

use std::cell::RefCell;

use crate::annotation::{
    self, AnnSink, Annotation, Features, SpatialQuery, in_document_order,
};
use crate::location::Location;
use crate::span::Span;

pub struct Context<'a> {
    doc: &'a str,
    anns: &'a [Annotation],
    start: usize,
    end: usize,
    sink: RefCell<&'a mut dyn AnnSink>,
    index: Option<&'a dyn SpatialQuery>,
}

impl<'a> Context<'a> {
    /// Context over the whole document.
    pub fn new(doc: &'a str, anns: &'a [Annotation], sink: &'a mut dyn AnnSink) -> Self {
        Self::between(doc, anns, sink, 0, doc.len())
    }

    /// Context over `[start, end)` of the document.
    ///
    /// `anns` must be in document order and lie entirely inside the range;
    /// both are construction contracts, checked in debug builds.
    pub fn between(
        doc: &'a str,
        anns: &'a [Annotation],
        sink: &'a mut dyn AnnSink,
        start: usize,
        end: usize,
    ) -> Self {
        assert!(
            start <= end && end <= doc.len(),
            "scan range [{start},{end}) does not fit the document"
        );
        debug_assert!(in_document_order(anns), "annotations out of document order");
        debug_assert!(
            anns.iter().all(|a| start <= a.start && a.end <= end),
            "annotation outside the scan range"
        );
        Self {
            doc,
            anns,
            start,
            end,
            sink: RefCell::new(sink),
            index: None,
        }
    }

    /// Use an indexed store for spatial queries instead of linear scans.
    pub fn with_index(mut self, index: &'a dyn SpatialQuery) -> Self {
        self.index = Some(index);
        self
    }

    pub fn doc(&self) -> &'a str {
        self.doc
    }

    pub fn anns(&self) -> &'a [Annotation] {
        self.anns
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Document text under a span.
    pub fn text_of(&self, span: Span) -> &'a str {
        &self.doc[span.start..span.end]
    }

    /// Location at the start of the scan.
    pub fn start_location(&self) -> Location {
        Location::new(self.start, 0)
    }

    /// Create an annotation through the output sink.
    ///
    /// Only rule actions may call this; parsing itself is side-effect free.
    pub fn add_out(&self, span: Span, ann_type: &str, features: Features) -> Annotation {
        self.sink.borrow_mut().add(span, ann_type, features)
    }

    // --- Cursor operations ---

    /// The annotation under the cursor, if any remains.
    pub fn get_ann(&self, loc: Location) -> Option<&'a Annotation> {
        self.anns.get(loc.ann_index)
    }

    /// Smallest index at/after the cursor whose annotation starts at or
    /// after `offset`; the slice length when none does.
    ///
    /// With `force_next` the search starts one past the current index, so
    /// the result always moves even when the current annotation qualifies.
    pub fn next_index_for_offset(&self, loc: Location, offset: usize, force_next: bool) -> usize {
        let base = if force_next {
            loc.ann_index + 1
        } else {
            loc.ann_index
        };
        if base >= self.anns.len() {
            return self.anns.len();
        }
        base + self.anns[base..].partition_point(|a| a.start < offset)
    }

    /// Move the text cursor forward by `n` bytes, snapping forward to the
    /// next char boundary and capping at the scan end, then realign the
    /// annotation cursor. A one-byte step from a boundary clears a whole
    /// character.
    pub fn advance_by_offset(&self, loc: Location, n: usize) -> Location {
        let mut text_offset = loc.text_offset.saturating_add(n).min(self.end);
        while text_offset < self.end && !self.doc.is_char_boundary(text_offset) {
            text_offset += 1;
        }
        let ann_index = self.next_index_for_offset(loc, text_offset, false);
        Location::new(text_offset, ann_index)
    }

    /// Move the annotation cursor forward by `n` annotations; the text
    /// cursor lands on the end of the last one stepped over.
    ///
    /// When that annotation does not exist the location comes back
    /// unchanged (a defined no-op, not a failure).
    pub fn advance_by_index(&self, loc: Location, n: usize) -> Location {
        let Some(last) = (loc.ann_index + n).checked_sub(1) else {
            return loc;
        };
        match self.anns.get(last) {
            Some(ann) => Location::new(ann.end, loc.ann_index + n),
            None => loc,
        }
    }

    /// Place the text cursor at an absolute offset inside the scan range.
    ///
    /// Panics if `offset` lies outside `[start, end)`; jumping out of the
    /// scanned range is a programming error.
    pub fn advance_to_offset(&self, loc: Location, offset: usize) -> Location {
        assert!(
            self.start <= offset && offset < self.end,
            "offset {offset} outside scan range [{},{})",
            self.start,
            self.end
        );
        Location::new(offset, loc.ann_index)
    }

    /// Recompute the annotation cursor from the text cursor.
    pub fn realign_by_offset(&self, loc: Location) -> Location {
        Location::new(
            loc.text_offset,
            self.next_index_for_offset(loc, loc.text_offset, false),
        )
    }

    /// Recompute the text cursor from the annotation cursor: the end of the
    /// annotation just consumed. With nothing consumed yet the text cursor
    /// stays put.
    pub fn realign_by_index(&self, loc: Location) -> Location {
        let Some(last) = loc.ann_index.checked_sub(1) else {
            return loc;
        };
        match self.anns.get(last) {
            Some(ann) => Location::new(ann.end, loc.ann_index),
            None => loc,
        }
    }

    pub fn at_end_of_text(&self, loc: Location) -> bool {
        loc.text_offset >= self.end
    }

    pub fn at_end_of_anns(&self, loc: Location) -> bool {
        loc.ann_index >= self.anns.len()
    }

    // --- Spatial queries (positional constraints) ---

    pub fn covering(&self, span: Span) -> Vec<&'a Annotation> {
        match self.index {
            Some(ix) => ix.covering(span),
            None => annotation::scan_covering(self.anns, span),
        }
    }

    pub fn within(&self, span: Span) -> Vec<&'a Annotation> {
        match self.index {
            Some(ix) => ix.within(span),
            None => annotation::scan_within(self.anns, span),
        }
    }

    pub fn overlapping(&self, span: Span) -> Vec<&'a Annotation> {
        match self.index {
            Some(ix) => ix.overlapping(span),
            None => annotation::scan_overlapping(self.anns, span),
        }
    }

    pub fn coextensive(&self, span: Span) -> Vec<&'a Annotation> {
        match self.index {
            Some(ix) => ix.coextensive(span),
            None => annotation::scan_coextensive(self.anns, span),
        }
    }

    pub fn starting_at(&self, offset: usize) -> Vec<&'a Annotation> {
        match self.index {
            Some(ix) => ix.starting_at(offset),
            None => annotation::scan_starting_at(self.anns, offset),
        }
    }

    /// Annotations starting at or after `offset`, in document order.
    ///
    /// Used by the `before` constraint; a plain offset scan, not part of
    /// the spatial collaborator.
    pub fn starting_from(&self, offset: usize) -> &'a [Annotation] {
        let first = self.anns.partition_point(|a| a.start < offset);
        &self.anns[first..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnList;

    // Document "ab cd ab" with one annotation on each word.
    const DOC: &str = "ab cd ab";

    fn word_anns() -> Vec<Annotation> {
        vec![
            Annotation::new(0, 2, "Ann", 0),
            Annotation::new(3, 5, "Ann", 1),
            Annotation::new(6, 8, "Ann", 2),
        ]
    }

    #[test]
    fn next_index_skips_to_first_start_at_or_after() {
        let anns = word_anns();
        let mut out = AnnList::new();
        let ctx = Context::new(DOC, &anns, &mut out);
        let loc = ctx.start_location();
        assert_eq!(ctx.next_index_for_offset(loc, 0, false), 0);
        assert_eq!(ctx.next_index_for_offset(loc, 1, false), 1);
        assert_eq!(ctx.next_index_for_offset(loc, 3, false), 1);
        assert_eq!(ctx.next_index_for_offset(loc, 5, false), 2);
        assert_eq!(ctx.next_index_for_offset(loc, 8, false), 3);
    }

    #[test]
    fn force_next_always_moves() {
        let anns = word_anns();
        let mut out = AnnList::new();
        let ctx = Context::new(DOC, &anns, &mut out);
        let loc = ctx.start_location();
        assert_eq!(ctx.next_index_for_offset(loc, 0, true), 1);
        let last = Location::new(6, 2);
        assert_eq!(ctx.next_index_for_offset(last, 6, true), 3);
    }

    #[test]
    fn advance_by_offset_caps_and_realigns() {
        let anns = word_anns();
        let mut out = AnnList::new();
        let ctx = Context::new(DOC, &anns, &mut out);
        let loc = ctx.start_location();

        let mid = ctx.advance_by_offset(loc, 4);
        assert_eq!(mid, Location::new(4, 2));

        let capped = ctx.advance_by_offset(loc, 100);
        assert_eq!(capped, Location::new(8, 3));
        assert!(ctx.at_end_of_text(capped));
        assert!(ctx.at_end_of_anns(capped));
    }

    #[test]
    fn advance_by_offset_never_decreases_index() {
        let anns = word_anns();
        let mut out = AnnList::new();
        let ctx = Context::new(DOC, &anns, &mut out);
        // Index already past what the text offset alone would give.
        let loc = Location::new(0, 2);
        let next = ctx.advance_by_offset(loc, 1);
        assert_eq!(next, Location::new(1, 2));
    }

    #[test]
    fn advance_by_offset_lands_on_char_boundaries() {
        let doc = "aé b";
        let anns = vec![Annotation::new(4, 5, "Word", 0)];
        let mut out = AnnList::new();
        let ctx = Context::new(doc, &anns, &mut out);

        let one = ctx.advance_by_offset(Location::new(0, 0), 1);
        assert_eq!(one, Location::new(1, 0));
        // One byte into the two-byte character snaps past it.
        let two = ctx.advance_by_offset(one, 1);
        assert_eq!(two, Location::new(3, 0));
    }

    #[test]
    fn advance_by_index_lands_on_annotation_end() {
        let anns = word_anns();
        let mut out = AnnList::new();
        let ctx = Context::new(DOC, &anns, &mut out);
        let loc = ctx.start_location();

        assert_eq!(ctx.advance_by_index(loc, 1), Location::new(2, 1));
        assert_eq!(ctx.advance_by_index(loc, 3), Location::new(8, 3));
    }

    #[test]
    fn advance_by_index_past_end_is_a_no_op() {
        let anns = word_anns();
        let mut out = AnnList::new();
        let ctx = Context::new(DOC, &anns, &mut out);
        let loc = Location::new(5, 2);
        assert_eq!(ctx.advance_by_index(loc, 2), loc);
        assert_eq!(ctx.advance_by_index(loc, 0), loc);
    }

    #[test]
    fn realign_by_offset_recomputes_index_only() {
        let anns = word_anns();
        let mut out = AnnList::new();
        let ctx = Context::new(DOC, &anns, &mut out);
        assert_eq!(
            ctx.realign_by_offset(Location::new(5, 0)),
            Location::new(5, 2)
        );
    }

    #[test]
    fn realign_by_index_recomputes_text_only() {
        let anns = word_anns();
        let mut out = AnnList::new();
        let ctx = Context::new(DOC, &anns, &mut out);
        assert_eq!(
            ctx.realign_by_index(Location::new(0, 2)),
            Location::new(5, 2)
        );
        // Nothing consumed yet: text cursor stays.
        assert_eq!(
            ctx.realign_by_index(Location::new(1, 0)),
            Location::new(1, 0)
        );
    }

    #[test]
    fn advancement_fixed_point_at_ends() {
        let anns = word_anns();
        let mut out = AnnList::new();
        let ctx = Context::new(DOC, &anns, &mut out);
        let end = ctx.advance_by_offset(ctx.start_location(), 8);
        assert!(ctx.at_end_of_text(end) && ctx.at_end_of_anns(end));
        assert_eq!(ctx.advance_by_offset(end, 1), end);
        assert_eq!(ctx.advance_by_index(end, 1), end);
    }

    #[test]
    #[should_panic(expected = "outside scan range")]
    fn advance_to_offset_rejects_out_of_range() {
        let anns = word_anns();
        let mut out = AnnList::new();
        let ctx = Context::between(DOC, &anns[..2], &mut out, 0, 5);
        let _ = ctx.advance_to_offset(ctx.start_location(), 5);
    }

    #[test]
    fn restricted_range_bounds_the_cursor() {
        let anns = word_anns();
        let mut out = AnnList::new();
        let ctx = Context::between(DOC, &anns[..2], &mut out, 0, 5);
        let capped = ctx.advance_by_offset(ctx.start_location(), 10);
        assert_eq!(capped, Location::new(5, 2));
        assert!(ctx.at_end_of_text(capped));
    }

    #[test]
    fn starting_from_is_a_suffix_by_start() {
        let anns = word_anns();
        let mut out = AnnList::new();
        let ctx = Context::new(DOC, &anns, &mut out);
        let rest = ctx.starting_from(3);
        assert_eq!(rest.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1, 2]);
        assert!(ctx.starting_from(9).is_empty());
    }

    #[test]
    fn sink_is_reachable_through_the_context() {
        let anns = word_anns();
        let mut out = AnnList::new();
        {
            let ctx = Context::new(DOC, &anns, &mut out);
            let added = ctx.add_out(Span::new(0, 5), "Pair", Features::new());
            assert_eq!(added.id, 0);
        }
        assert_eq!(out.len(), 1);
    }
}
