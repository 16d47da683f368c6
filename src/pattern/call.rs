//! Side-effect hooks around a parser.

use crate::context::Context;
use crate::location::Location;
use crate::outcome::{Failure, ParseResult, Success};
use crate::pattern::Parser;

type SuccessHook = Box<dyn Fn(&Success, Location, &Context)>;
type FailureHook = Box<dyn Fn(&Failure, Location, &Context)>;

/// Run a parser and report its outcome to a hook, returning the outcome
/// unchanged.
///
/// For counters and other observers only; annotation output belongs in
/// rule actions, which the driver invokes on fired rules rather than on
/// every attempted parse.
pub struct Call {
    inner: Box<dyn Parser>,
    on_success: SuccessHook,
    on_failure: Option<FailureHook>,
}

impl Call {
    pub fn new(
        inner: impl Parser + 'static,
        on_success: impl Fn(&Success, Location, &Context) + 'static,
    ) -> Self {
        Self {
            inner: Box::new(inner),
            on_success: Box::new(on_success),
            on_failure: None,
        }
    }

    /// Also observe failures.
    pub fn with_failure_hook(
        mut self,
        on_failure: impl Fn(&Failure, Location, &Context) + 'static,
    ) -> Self {
        self.on_failure = Some(Box::new(on_failure));
        self
    }
}

impl Parser for Call {
    fn parse(&self, loc: Location, ctx: &Context) -> ParseResult {
        match self.inner.parse(loc, ctx) {
            Ok(succ) => {
                (self.on_success)(&succ, loc, ctx);
                Ok(succ)
            }
            Err(fail) => {
                if let Some(hook) = &self.on_failure {
                    hook(&fail, loc, ctx);
                }
                Err(fail)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnList, Annotation};
    use crate::pattern::ann::Ann;
    use crate::span::Span;
    use std::cell::Cell;
    use std::rc::Rc;

    fn fixture() -> (&'static str, Vec<Annotation>) {
        ("ab cd", vec![Annotation::new(0, 2, "Word", 0)])
    }

    #[test]
    fn success_hook_observes_without_altering() {
        let (doc, anns) = fixture();
        let mut out = AnnList::new();
        let ctx = Context::new(doc, &anns, &mut out);

        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);
        let call = Call::new(Ann::with_type("Word"), move |succ, loc, _| {
            counter.set(counter.get() + 1);
            assert_eq!(succ.results()[0].span, Span::new(0, 2));
            assert_eq!(loc, Location::new(0, 0));
        });
        let succ = call.parse(Location::new(0, 0), &ctx).unwrap();
        assert_eq!(seen.get(), 1);
        assert_eq!(succ.results()[0].span, Span::new(0, 2));
    }

    #[test]
    fn failure_hook_fires_on_failure_only() {
        let (doc, anns) = fixture();
        let mut out = AnnList::new();
        let ctx = Context::new(doc, &anns, &mut out);

        let ok_count = Rc::new(Cell::new(0));
        let err_count = Rc::new(Cell::new(0));
        let ok_seen = Rc::clone(&ok_count);
        let err_seen = Rc::clone(&err_count);
        let call = Call::new(Ann::with_type("Number"), move |_, _, _| {
            ok_seen.set(ok_seen.get() + 1);
        })
        .with_failure_hook(move |fail, _, _| {
            err_seen.set(err_seen.get() + 1);
            assert_eq!(fail.parser, "Ann");
        });

        assert!(call.parse(Location::new(0, 0), &ctx).is_err());
        assert_eq!(ok_count.get(), 0);
        assert_eq!(err_count.get(), 1);
    }
}
