//! # Handlers and the per-step context.
//!
//! A [`Handler`] inspects a request and answers with an [`Outcome`]. It gets
//! the request by reference and a [`Cx`] that exposes the caller's context
//! and the ability to [`defer`](Cx::defer).
//!
//! [`HandlerFn`] adapts a closure `Fn(&R, &mut Cx<'_, C>) -> Outcome<T>`.
//!
//! ## Example
//! ```rust
//! use dispatchkit::{Cx, Handler, Outcome};
//!
//! /// Grants a coupon to prepaid orders of one tier.
//! struct Tier { kind: u8, coupon: u32 }
//!
//! impl Handler<(u8, bool), u32> for Tier {
//!     fn handle(&self, req: &(u8, bool), _cx: &mut Cx<'_, ()>) -> Outcome<u32> {
//!         let (kind, paid) = *req;
//!         if paid && kind == self.kind {
//!             Outcome::Result(self.coupon)
//!         } else {
//!             Outcome::Continue
//!         }
//!     }
//! }
//! ```

use std::borrow::Cow;

use crate::chain::outcome::Outcome;
use crate::chain::token::ResumeToken;
use crate::error::ChainError;

/// One link of a [`HandlerChain`](crate::HandlerChain).
///
/// Type parameters: request `R`, produced value `T`, context `C`.
pub trait Handler<R, T, C = ()>: Send + Sync + 'static {
    /// Inspects `request` and decides whether to handle it, pass it on, or defer.
    ///
    /// Panics are not caught: they abort the dispatch and unwind into its caller.
    /// Return a `T` that carries an error variant for anticipated failures.
    fn handle(&self, request: &R, cx: &mut Cx<'_, C>) -> Outcome<T>;

    /// Returns a name used in logs.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Function-backed handler implementation.
#[derive(Debug)]
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    ///
    /// Closures are easiest to pass through
    /// [`HandlerChain::append_fn`](crate::HandlerChain::append_fn), which pins down
    /// the argument types.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<R, T, C, F> Handler<R, T, C> for HandlerFn<F>
where
    F: Fn(&R, &mut Cx<'_, C>) -> Outcome<T> + Send + Sync + 'static,
{
    fn handle(&self, request: &R, cx: &mut Cx<'_, C>) -> Outcome<T> {
        (self.f)(request, cx)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Reservation side of the chain's suspension table, as seen by [`Cx`].
pub(crate) trait Reserve: Sync {
    fn reserve(&self, token: &ResumeToken) -> Result<(), ChainError>;

    /// Drops the slot of `token`; returns `true` if a resume had already arrived.
    fn release(&self, token: &ResumeToken) -> bool;
}

/// Per-step handler context.
///
/// Lives for one handler invocation. Gives access to the dispatch context `C`
/// and mints the resume token of a deferral. If the handler unwinds after
/// deferring, dropping the `Cx` releases the reservation.
pub struct Cx<'a, C> {
    context: &'a mut C,
    chain: u64,
    dispatch: u64,
    position: usize,
    minted: Option<ResumeToken>,
    table: &'a dyn Reserve,
}

impl<'a, C> Cx<'a, C> {
    pub(crate) fn new(
        context: &'a mut C,
        chain: u64,
        dispatch: u64,
        position: usize,
        table: &'a dyn Reserve,
    ) -> Self {
        Self {
            context,
            chain,
            dispatch,
            position,
            minted: None,
            table,
        }
    }

    /// Shared access to the dispatch context.
    #[inline]
    pub fn context(&self) -> &C {
        self.context
    }

    /// Exclusive access to the dispatch context.
    #[inline]
    pub fn context_mut(&mut self) -> &mut C {
        self.context
    }

    /// Id of the running dispatch call.
    #[inline]
    pub fn dispatch_id(&self) -> u64 {
        self.dispatch
    }

    /// Position (0-based) of the running handler in its chain.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Starts a deferral and returns its resume token.
    ///
    /// Return the token in [`Outcome::Deferred`] and hand a clone to whatever
    /// will call [`HandlerChain::resume`](crate::HandlerChain::resume). The
    /// resume may arrive before the handler returns.
    ///
    /// # Errors
    /// - [`ChainError::AlreadyDeferred`] if this step already deferred.
    /// - [`ChainError::PendingLimit`] if the chain holds `Config::max_pending`
    ///   suspended dispatches.
    pub fn defer(&mut self) -> Result<ResumeToken, ChainError> {
        if self.minted.is_some() {
            return Err(ChainError::AlreadyDeferred {
                dispatch: self.dispatch,
            });
        }
        let token = ResumeToken::mint(self.chain, self.dispatch, self.position);
        self.table.reserve(&token)?;
        self.minted = Some(token.clone());
        Ok(token)
    }

    pub(crate) fn into_minted(mut self) -> Option<ResumeToken> {
        self.minted.take()
    }
}

impl<C> Drop for Cx<'_, C> {
    fn drop(&mut self) {
        if let Some(token) = self.minted.take() {
            self.table.release(&token);
            tracing::warn!(%token, "handler unwound after defer; reservation released");
        }
    }
}
