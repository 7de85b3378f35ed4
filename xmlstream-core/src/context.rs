//! Execution context handed to every transition and callback.
//!
//! Cancellation and deadlines are advisory. The runtime passes the context
//! along but never inspects it; a transition that wants to honour
//! cancellation checks [`Context::err`] itself (or is wrapped with
//! [`crate::check_context`]).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::Error;

/// Cancellation flags and an optional deadline.
///
/// Derived contexts inherit their parent's flags and deadline, so cancelling
/// a parent also cancels every context derived from it.
#[derive(Debug, Clone, Default)]
pub struct Context {
    flags: Vec<Arc<AtomicBool>>,
    deadline: Option<Instant>,
}

/// Cancels the context it was created with. May be sent to another thread.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Context::default()
    }

    /// Derive a context that can be cancelled through the returned handle.
    pub fn with_cancel(&self) -> (Context, CancelHandle) {
        let flag = Arc::new(AtomicBool::new(false));
        let mut ctx = self.clone();
        ctx.flags.push(Arc::clone(&flag));
        (ctx, CancelHandle { flag })
    }

    /// Derive a context that expires at `deadline`, or at the parent's
    /// deadline if that is earlier.
    pub fn with_deadline(&self, deadline: Instant) -> Context {
        let mut ctx = self.clone();
        ctx.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        ctx
    }

    /// A deadline `timeout` from now. A timeout too large to represent
    /// leaves the current deadline, if any, in place.
    pub fn with_timeout(&self, timeout: Duration) -> Context {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.clone(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context is done, or `None` while it is still live.
    pub fn err(&self) -> Option<Error> {
        if self.flags.iter().any(|flag| flag.load(Ordering::Acquire)) {
            return Some(Error::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Error::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }
}
