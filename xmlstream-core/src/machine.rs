//! State machine runtime.
//!
//! A state is a transition function: it does some work and returns the next
//! transition, or `None` to end the current phase. A [`StateMachine`] runs a
//! main chain starting at its `begin` transition and then a cleanup chain
//! starting at its `end` transition, and reports whatever the transitions
//! left in its error slot.
//!
//! ```text
//! begin ──▶ s1 ──▶ s2 ──▶ None      end ──▶ c1 ──▶ None      error slot
//!   └──────── main phase ────────┘   └─── cleanup phase ──┘   ──▶ run()
//! ```
//!
//! There are no hidden states: the machine's state is the transition it
//! currently holds. `run` is a plain loop and never looks at the context or
//! the error slot between steps.

use std::fmt;

use log::{debug, trace};

use crate::context::Context;
use crate::error::{Error, Result};

/// A boxed transition function.
///
/// The lifetime lets transitions borrow from the caller, e.g. a token source
/// or a collector the caller inspects after `run` returns.
pub struct StateFn<'a>(Box<dyn FnOnce(&Context, &mut StateMachine<'a>) -> Option<StateFn<'a>> + 'a>);

impl<'a> StateFn<'a> {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(&Context, &mut StateMachine<'a>) -> Option<StateFn<'a>> + 'a,
    {
        StateFn(Box::new(f))
    }

    /// Run this transition once.
    pub fn call(self, ctx: &Context, sm: &mut StateMachine<'a>) -> Option<StateFn<'a>> {
        (self.0)(ctx, sm)
    }
}

impl fmt::Debug for StateFn<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StateFn(..)")
    }
}

/// Drives a chain of transitions to completion.
#[derive(Debug, Default)]
pub struct StateMachine<'a> {
    begin: Option<StateFn<'a>>,
    end: Option<StateFn<'a>>,
    error: Option<Error>,
}

impl<'a> StateMachine<'a> {
    pub fn new(begin: StateFn<'a>) -> Self {
        StateMachine { begin: Some(begin), end: None, error: None }
    }

    /// Set the first transition of the cleanup phase.
    pub fn with_end(mut self, end: StateFn<'a>) -> Self {
        self.end = Some(end);
        self
    }

    pub fn set_begin(&mut self, begin: StateFn<'a>) {
        self.begin = Some(begin);
    }

    /// Set the cleanup entry point. A main-phase transition may call this;
    /// the cleanup phase reads it only once the main phase has ended.
    pub fn set_end(&mut self, end: StateFn<'a>) {
        self.end = Some(end);
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Store the terminal error, replacing any previous one.
    pub fn set_error(&mut self, err: Error) {
        self.error = Some(err);
    }

    pub fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }

    /// Run the main phase, then the cleanup phase, then return the error
    /// slot.
    ///
    /// Consumes both entry points and the error slot, so a second call with
    /// nothing re-installed returns `Ok(())` immediately.
    pub fn run(&mut self, ctx: &Context) -> Result<()> {
        debug!("state machine: main phase");
        let begin = self.begin.take();
        let steps = self.run_phase(ctx, begin);
        debug!("state machine: main phase done after {} steps, cleanup phase", steps);
        let end = self.end.take();
        let steps = self.run_phase(ctx, end);
        debug!("state machine: cleanup phase done after {} steps", steps);
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn run_phase(&mut self, ctx: &Context, mut state: Option<StateFn<'a>>) -> usize {
        let mut steps = 0;
        while let Some(transition) = state {
            steps += 1;
            trace!("state machine: step {}", steps);
            state = transition.call(ctx, self);
        }
        steps
    }
}

/// A transition that records `err` and ends the phase.
pub fn bail_with_error<'a>(err: Error) -> StateFn<'a> {
    StateFn::new(move |_ctx, sm| {
        sm.set_error(err);
        None
    })
}

/// Cleanup transition clearing the error slot if it holds exactly
/// [`Error::Eof`], so a fully consumed stream is not reported as a failure.
/// Any other error is left alone.
pub fn ignore_eof<'a>(_ctx: &Context, sm: &mut StateMachine<'a>) -> Option<StateFn<'a>> {
    if sm.error.as_ref().is_some_and(Error::is_eof) {
        sm.error = None;
    }
    None
}

/// A transition that bails with the context's error if the context is done,
/// and otherwise continues with `next`.
pub fn check_context<'a>(next: StateFn<'a>) -> StateFn<'a> {
    StateFn::new(move |ctx, sm| match ctx.err() {
        Some(err) => {
            sm.set_error(err);
            None
        }
        None => Some(next),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_machine() {
        let mut sm = StateMachine::default();
        assert!(sm.run(&Context::background()).is_ok());
    }

    #[test]
    fn test_bail_runs_end_chain() {
        let mut end_ran = false;
        let mut sm = StateMachine::new(StateFn::new(|_, _| Some(bail_with_error(Error::custom("E")))))
            .with_end(StateFn::new(|_, sm| {
                end_ran = true;
                assert!(sm.error().is_some());
                None
            }));
        let err = sm.run(&Context::background()).unwrap_err();
        assert_eq!(err.to_string(), "E");
        drop(sm);
        assert!(end_ran);
    }

    #[test]
    fn test_ignore_eof_clears_only_eof() {
        let mut sm = StateMachine::new(bail_with_error(Error::Eof)).with_end(StateFn::new(ignore_eof));
        assert!(sm.run(&Context::background()).is_ok());

        let mut sm = StateMachine::new(bail_with_error(Error::Cancelled)).with_end(StateFn::new(ignore_eof));
        assert!(matches!(sm.run(&Context::background()), Err(Error::Cancelled)));
    }

    #[test]
    fn test_chain_of_states() {
        fn count<'a>(n: usize, log: &'a mut Vec<usize>) -> StateFn<'a> {
            StateFn::new(move |_, _| {
                log.push(n);
                if n == 3 {
                    None
                } else {
                    Some(count(n + 1, log))
                }
            })
        }
        let mut log = Vec::new();
        let mut sm = StateMachine::new(count(1, &mut log));
        assert!(sm.run(&Context::background()).is_ok());
        drop(sm);
        assert_eq!(log, [1, 2, 3]);
    }

    #[test]
    fn test_end_installed_during_main_phase() {
        let mut sm = StateMachine::new(StateFn::new(|_, sm| {
            sm.set_error(Error::Eof);
            sm.set_end(StateFn::new(ignore_eof));
            None
        }));
        assert!(sm.run(&Context::background()).is_ok());
    }

    #[test]
    fn test_check_context() {
        let (ctx, cancel) = Context::background().with_cancel();
        cancel.cancel();
        let mut reached = false;
        let mut sm = StateMachine::new(check_context(StateFn::new(|_, _| {
            reached = true;
            None
        })));
        assert!(matches!(sm.run(&ctx), Err(Error::Cancelled)));
        drop(sm);
        assert!(!reached);
    }

    #[test]
    fn test_run_consumes_entry_points() {
        let mut sm = StateMachine::new(bail_with_error(Error::Eof));
        assert!(sm.run(&Context::background()).is_err());
        assert!(sm.run(&Context::background()).is_ok());
    }
}
