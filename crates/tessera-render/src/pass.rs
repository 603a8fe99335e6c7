//! Per-request render state.
//!
//! A [`RenderPass`] is created for one incoming request and dropped when the
//! response is done. It is the only state shared between the nested
//! `render_unit` calls of one page: the request, the caller, the outcomes of
//! actions executed so far and the first redirect requested.
//!
//! Values reachable from templates must be `Send + Sync`, so the mutable parts
//! sit behind mutexes. No lock is held while a behavior or a nested render runs.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::RenderError;
use crate::levels::Status;
use crate::request::{Caller, Request};
use crate::unit::Rendered;

/// Deepest unit nesting allowed in one render pass.
pub const MAX_DEPTH: usize = 32;

/// The result of running an action's behavior.
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    /// The behavior produced output (or a redirect).
    Succeeded(Rendered),
    /// The behavior failed; `message` is shown to the caller.
    Failed { message: String },
}

/// What [`RenderPass::begin`] found for a marker.
#[derive(Debug, Clone)]
pub enum Begin {
    /// Nothing ran yet; the caller now owns execution and must call
    /// [`RenderPass::finish`].
    Start,
    /// The behavior is running further up the stack.
    Running,
    /// The behavior already ran.
    Done(ExecutionOutcome),
}

#[derive(Debug)]
enum Slot {
    Running,
    Done(ExecutionOutcome),
}

/// State of one request's render.
pub struct RenderPass {
    request: Request,
    caller: Mutex<Caller>,
    outcomes: Mutex<HashMap<String, Slot>>,
    redirect: Mutex<Option<String>>,
    depth: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RenderPass {
    pub fn new(request: Request, caller: Caller) -> Arc<Self> {
        Arc::new(Self {
            request,
            caller: Mutex::new(caller),
            outcomes: Mutex::new(HashMap::new()),
            redirect: Mutex::new(None),
            depth: AtomicUsize::new(0),
        })
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The caller as of now; actions may elevate it mid-pass.
    pub fn caller(&self) -> Caller {
        *lock(&self.caller)
    }

    /// Changes the caller's current status for the rest of the pass.
    pub fn elevate(&self, status: Status) {
        lock(&self.caller).elevate(status);
    }

    /// Claims execution of the behavior behind `marker`.
    pub fn begin(&self, marker: &str) -> Begin {
        let mut outcomes = lock(&self.outcomes);
        match outcomes.get(marker) {
            Some(Slot::Running) => Begin::Running,
            Some(Slot::Done(outcome)) => Begin::Done(outcome.clone()),
            None => {
                outcomes.insert(marker.to_string(), Slot::Running);
                Begin::Start
            }
        }
    }

    /// Stores the outcome of a behavior claimed with [`begin`](Self::begin).
    pub fn finish(&self, marker: &str, outcome: ExecutionOutcome) {
        lock(&self.outcomes).insert(marker.to_string(), Slot::Done(outcome));
    }

    /// The outcome recorded for `marker`, if its behavior finished.
    pub fn outcome(&self, marker: &str) -> Option<ExecutionOutcome> {
        match lock(&self.outcomes).get(marker) {
            Some(Slot::Done(outcome)) => Some(outcome.clone()),
            _ => None,
        }
    }

    /// Whether the behavior behind `marker` ran (or is running) this pass.
    pub fn has_executed(&self, marker: &str) -> bool {
        lock(&self.outcomes).contains_key(marker)
    }

    /// Records a redirect. The first one requested wins.
    pub fn request_redirect(&self, target: impl Into<String>) {
        let mut redirect = lock(&self.redirect);
        if redirect.is_none() {
            *redirect = Some(target.into());
        }
    }

    /// The redirect requested during this pass, if any.
    pub fn redirect(&self) -> Option<String> {
        lock(&self.redirect).clone()
    }

    pub(crate) fn enter(&self) -> Result<DepthGuard<'_>, RenderError> {
        let depth = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
        let guard = DepthGuard { pass: self };
        if depth > MAX_DEPTH {
            return Err(RenderError::RecursionLimit(MAX_DEPTH));
        }
        Ok(guard)
    }
}

impl fmt::Debug for RenderPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderPass")
            .field("request", &self.request)
            .field("caller", &self.caller())
            .field("redirect", &self.redirect())
            .finish_non_exhaustive()
    }
}

pub(crate) struct DepthGuard<'a> {
    pass: &'a RenderPass,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.pass.depth.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass() -> Arc<RenderPass> {
        RenderPass::new(Request::get("/"), Caller::anonymous())
    }

    #[test]
    fn begin_claims_once() {
        let pass = pass();
        assert!(matches!(pass.begin("home-buy"), Begin::Start));
        assert!(matches!(pass.begin("home-buy"), Begin::Running));

        pass.finish("home-buy", ExecutionOutcome::Failed { message: "nope".into() });
        match pass.begin("home-buy") {
            Begin::Done(ExecutionOutcome::Failed { message }) => assert_eq!(message, "nope"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(pass.outcome("home-buy").is_some());
        assert!(pass.outcome("home-sell").is_none());
    }

    #[test]
    fn first_redirect_wins() {
        let pass = pass();
        assert_eq!(pass.redirect(), None);
        pass.request_redirect("/first");
        pass.request_redirect("/second");
        assert_eq!(pass.redirect().as_deref(), Some("/first"));
    }

    #[test]
    fn depth_is_released() {
        let pass = pass();
        {
            let _a = pass.enter().unwrap();
            let _b = pass.enter().unwrap();
        }
        let mut guards = Vec::new();
        for _ in 0..MAX_DEPTH {
            guards.push(pass.enter().unwrap());
        }
        assert!(matches!(pass.enter(), Err(RenderError::RecursionLimit(_))));
    }
}
