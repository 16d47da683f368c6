//! Injected tracing for the rule driver.
//!
//! There is no global logging anywhere in the engine. The driver reports
//! what it does through a caller-supplied [`Tracer`]; the default
//! [`NoTrace`] drops everything. Rules are identified by their index in
//! the driver's rule list.

use crate::location::Location;

/// Observer of the driver's match loop. Every method defaults to a no-op,
/// so implementations override only what they care about.
pub trait Tracer {
    /// A rule's parser is about to be tried.
    fn rule_tried(&self, _rule: usize, _loc: Location) {}

    /// A rule's parser matched, with this many alternative results.
    fn rule_matched(&self, _rule: usize, _loc: Location, _alternatives: usize) {}

    /// A rule's actions were invoked.
    fn rule_fired(&self, _rule: usize, _loc: Location) {}

    /// The scan cursor moved.
    fn advanced(&self, _loc: Location) {}
}

/// Tracer that records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTrace;

impl Tracer for NoTrace {}
