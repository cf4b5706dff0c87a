//! # Handler outcomes and dispatch results.
//!
//! Handlers answer with an [`Outcome`]; callers of `dispatch` / `resume`
//! receive a [`Dispatch`].
//!
//! ```text
//! Outcome (per handler)          Dispatch (per call)
//! ─────────────────────          ───────────────────────────────────────
//! Result(v)        ──────────►   Handled(v)
//! Continue  ─► next handler ─►   Unhandled            (chain exhausted)
//! Deferred(token)  ──────────►   Suspended(token)     (resume later)
//!                                Relayed              (resume reached a running handler)
//! ```

use crate::chain::token::ResumeToken;

/// What a single handler decided about a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The request is handled; dispatch stops and returns this value.
    Result(T),
    /// Pass the request to the next handler.
    Continue,
    /// The handler started asynchronous work and will complete through
    /// [`HandlerChain::resume`](crate::HandlerChain::resume).
    ///
    /// The token must come from [`Cx::defer`](crate::Cx::defer) of the same step.
    Deferred(ResumeToken),
}

/// Result of a `dispatch`, `dispatch_from` or `resume` call.
#[must_use = "a dispatch may be unhandled or suspended"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch<T> {
    /// A handler produced a value.
    Handled(T),
    /// Every handler passed; nobody handled the request. Not an error.
    Unhandled,
    /// A handler deferred; the dispatch continues on `resume(token, ..)`.
    Suspended(ResumeToken),
    /// Returned by `resume` when the deferring handler had not returned yet.
    /// The in-flight dispatch call picks up the outcome and reports the
    /// final result to its own caller.
    Relayed,
}

impl<T> Dispatch<T> {
    /// Returns `true` for [`Dispatch::Handled`].
    #[inline]
    pub fn is_handled(&self) -> bool {
        matches!(self, Dispatch::Handled(_))
    }

    /// Returns `true` for [`Dispatch::Suspended`].
    #[inline]
    pub fn is_suspended(&self) -> bool {
        matches!(self, Dispatch::Suspended(_))
    }

    /// Consumes the dispatch, returning the handled value if any.
    pub fn into_value(self) -> Option<T> {
        match self {
            Dispatch::Handled(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the resume token of a suspended dispatch.
    pub fn token(&self) -> Option<&ResumeToken> {
        match self {
            Dispatch::Suspended(t) => Some(t),
            _ => None,
        }
    }
}
