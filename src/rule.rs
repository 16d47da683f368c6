//! Rules: a pattern bound to the actions it fires.

use anyhow::Result;

use crate::action::Action;
use crate::annotation::Annotation;
use crate::context::Context;
use crate::location::Location;
use crate::outcome::{ParseResult, Success};
use crate::pattern::Parser;

/// A pattern plus the actions that run when the driver fires it.
///
/// Parsing a rule is exactly parsing its pattern. Firing is a separate
/// step that only the driver invokes on the rules it selects; that
/// separation is what distinguishes a rule from a `Call` hook, which runs
/// on every parse attempt.
pub struct Rule {
    parser: Box<dyn Parser>,
    actions: Vec<Box<dyn Action>>,
    priority: i32,
}

impl Rule {
    pub fn new(parser: impl Parser + 'static, action: impl Action + 'static) -> Self {
        Self {
            parser: Box::new(parser),
            actions: vec![Box::new(action)],
            priority: 0,
        }
    }

    /// Fire another action after the ones already attached, in order.
    pub fn with_action(mut self, action: impl Action + 'static) -> Self {
        self.actions.push(Box::new(action));
        self
    }

    /// Priority considered by `Select::Highest`; equal-priority winners
    /// all fire.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Run every action against a success, collecting their outputs in
    /// firing order.
    pub(crate) fn fire(&self, succ: &Success, ctx: &Context) -> Result<Vec<Option<Annotation>>> {
        let mut outputs = Vec::with_capacity(self.actions.len());
        for action in &self.actions {
            outputs.push(action.fire(succ, ctx)?);
        }
        Ok(outputs)
    }
}

impl Parser for Rule {
    fn parse(&self, loc: Location, ctx: &Context) -> ParseResult {
        self.parser.parse(loc, ctx)
    }
}
