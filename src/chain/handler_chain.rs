//! # Chain of responsibility with resumable suspension.
//!
//! [`HandlerChain`] walks its handlers in append order until one of them
//! produces a value, every one of them passes, or one of them defers.
//!
//! ## Traversal
//! ```text
//! dispatch(req, ctx)
//!   │
//!   ├─► h0.handle() ── Continue ──► h1.handle() ── Continue ──► ... ──► Unhandled
//!   │                                   │
//!   │                                   ├─ Result(v) ──► Handled(v)   (h2.. never run)
//!   │                                   │
//!   │                                   └─ Deferred(tok) ──► park {req, ctx, next = 2}
//!   │                                                           └─► Suspended(tok)
//!   │
//! resume(tok, outcome)
//!   ├─ Result(v) ──► Handled(v)
//!   └─ Continue  ──► h2.handle() ──► ...
//! ```
//!
//! ## Suspension table
//! One slot per suspended dispatch, keyed by dispatch id:
//! ```text
//! Cx::defer()           ──► Reserved
//! resume() while running ─► Early(outcome)   → the running dispatch continues inline
//! handler returns       ──► Parked {req, ctx, next}
//! resume() / abandon()  ──► (removed)
//! ```
//!
//! ## Rules
//! - Chains are acyclic by construction; appending checks the node's ownership tag.
//! - No lock is held while a handler runs; handlers may resume their own token.
//! - A token resumes at most once; later attempts fail with `StaleToken`.
//! - Handler panics are not caught; a reservation taken by `Cx::defer` before
//!   the panic is released while unwinding.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::chain::handler::{Cx, Handler, HandlerFn, Reserve};
use crate::chain::node::{Link, NodeRef};
use crate::chain::outcome::{Dispatch, Outcome};
use crate::chain::token::{next_chain_id, next_dispatch_id, ResumeToken};
use crate::config::Config;
use crate::error::ChainError;

/// Deferred outcome folded into a dispatch.
enum Resolution<T> {
    Handled(T),
    Continue,
}

enum Slot<R, T, C> {
    Reserved {
        seq: u64,
    },
    Early {
        seq: u64,
        resolution: Resolution<T>,
    },
    Parked {
        seq: u64,
        next: usize,
        request: R,
        context: C,
    },
}

impl<R, T, C> Slot<R, T, C> {
    fn seq(&self) -> u64 {
        match self {
            Slot::Reserved { seq } | Slot::Early { seq, .. } | Slot::Parked { seq, .. } => *seq,
        }
    }
}

/// Outcome of parking a dispatch after its handler returned `Deferred`.
enum Parking<R, T, C> {
    Parked,
    Early {
        resolution: Resolution<T>,
        request: R,
        context: C,
    },
}

/// What `resume` found in the suspension table.
enum Claim<R, T, C> {
    Relayed,
    Parked {
        next: usize,
        request: R,
        context: C,
        resolution: Resolution<T>,
    },
}

struct Suspensions<R, T, C> {
    slots: Mutex<HashMap<u64, Slot<R, T, C>>>,
    limit: Option<usize>,
}

impl<R, T, C> Suspensions<R, T, C> {
    fn new(limit: Option<usize>) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            limit,
        }
    }

    /// Slots are only ever replaced whole, so a poisoned lock is recovered.
    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Slot<R, T, C>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    /// Parks a dispatch, unless a resume already arrived for it.
    fn park(&self, token: &ResumeToken, next: usize, request: R, context: C) -> Parking<R, T, C> {
        let mut slots = self.lock();
        match slots.remove(&token.dispatch) {
            Some(Slot::Early { seq, resolution }) if seq == token.seq => Parking::Early {
                resolution,
                request,
                context,
            },
            _ => {
                slots.insert(
                    token.dispatch,
                    Slot::Parked {
                        seq: token.seq,
                        next,
                        request,
                        context,
                    },
                );
                Parking::Parked
            }
        }
    }

    fn claim(&self, token: &ResumeToken, resolution: Resolution<T>) -> Result<Claim<R, T, C>, ChainError> {
        let stale = ChainError::StaleToken {
            dispatch: token.dispatch,
        };
        let mut slots = self.lock();
        let slot = match slots.remove(&token.dispatch) {
            Some(slot) if slot.seq() == token.seq => slot,
            Some(other) => {
                slots.insert(token.dispatch, other);
                return Err(stale);
            }
            None => return Err(stale),
        };

        match slot {
            Slot::Reserved { seq } => {
                slots.insert(token.dispatch, Slot::Early { seq, resolution });
                Ok(Claim::Relayed)
            }
            early @ Slot::Early { .. } => {
                slots.insert(token.dispatch, early);
                Err(stale)
            }
            Slot::Parked {
                next,
                request,
                context,
                ..
            } => Ok(Claim::Parked {
                next,
                request,
                context,
                resolution,
            }),
        }
    }

    fn abandon(&self, token: &ResumeToken) -> bool {
        let mut slots = self.lock();
        match slots.get(&token.dispatch) {
            Some(Slot::Parked { seq, .. }) if *seq == token.seq => {
                slots.remove(&token.dispatch);
                true
            }
            _ => false,
        }
    }
}

impl<R: Send, T: Send, C: Send> Reserve for Suspensions<R, T, C> {
    fn reserve(&self, token: &ResumeToken) -> Result<(), ChainError> {
        let mut slots = self.lock();
        if slots.contains_key(&token.dispatch) {
            return Err(ChainError::AlreadyDeferred {
                dispatch: token.dispatch,
            });
        }
        if let Some(limit) = self.limit {
            if slots.len() >= limit {
                return Err(ChainError::PendingLimit { limit });
            }
        }
        slots.insert(token.dispatch, Slot::Reserved { seq: token.seq });
        Ok(())
    }

    fn release(&self, token: &ResumeToken) -> bool {
        let mut slots = self.lock();
        match slots.get(&token.dispatch) {
            Some(slot) if slot.seq() == token.seq => {
                let early = matches!(slot, Slot::Early { .. });
                slots.remove(&token.dispatch);
                early
            }
            _ => false,
        }
    }
}

/// Ordered chain of handlers for requests `R` producing `T`, with context `C`.
///
/// Build it with [`append`](Self::append) / [`append_fn`](Self::append_fn),
/// then share it (`Arc`) with whatever completes deferred work.
///
/// # Example
/// ```
/// use dispatchkit::{Dispatch, HandlerChain, Outcome};
///
/// let mut chain: HandlerChain<i32, &'static str> = HandlerChain::new();
/// chain.append_fn("negative", |n, _| if *n < 0 { Outcome::Result("negative") } else { Outcome::Continue })?;
/// chain.append_fn("zero", |n, _| if *n == 0 { Outcome::Result("zero") } else { Outcome::Continue })?;
///
/// assert_eq!(chain.dispatch(-3, ())?, Dispatch::Handled("negative"));
/// assert_eq!(chain.dispatch(0, ())?, Dispatch::Handled("zero"));
/// assert_eq!(chain.dispatch(5, ())?, Dispatch::Unhandled);
/// # Ok::<(), dispatchkit::ChainError>(())
/// ```
pub struct HandlerChain<R, T, C = ()> {
    id: u64,
    nodes: Vec<NodeRef<R, T, C>>,
    suspended: Suspensions<R, T, C>,
}

impl<R, T, C> HandlerChain<R, T, C>
where
    R: Send + 'static,
    T: Send + 'static,
    C: Send + 'static,
{
    /// Creates an empty chain with [`Config::default`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty chain with the given configuration.
    pub fn with_config(cfg: Config) -> Self {
        Self {
            id: next_chain_id(),
            nodes: Vec::new(),
            suspended: Suspensions::new(cfg.pending_limit()),
        }
    }

    /// Wraps `handler` in a new node and appends it to the tail.
    pub fn append(&mut self, handler: impl Handler<R, T, C>) -> Result<NodeRef<R, T, C>, ChainError> {
        let node = NodeRef::new(handler);
        self.append_node(&node)?;
        Ok(node)
    }

    /// Wraps a closure in a [`HandlerFn`] and appends it to the tail.
    pub fn append_fn<F>(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        f: F,
    ) -> Result<NodeRef<R, T, C>, ChainError>
    where
        F: Fn(&R, &mut Cx<'_, C>) -> Outcome<T> + Send + Sync + 'static,
    {
        self.append(HandlerFn::new(name, f))
    }

    /// Appends an existing node to the tail.
    ///
    /// # Errors
    /// - [`ChainError::Cycle`] if the node is already part of this chain.
    /// - [`ChainError::ForeignNode`] if the node belongs to another chain.
    pub fn append_node(&mut self, node: &NodeRef<R, T, C>) -> Result<(), ChainError> {
        let link = Link {
            chain: self.id,
            position: self.nodes.len(),
        };
        if let Err(existing) = node.attach(link) {
            return Err(if existing.chain == self.id {
                ChainError::Cycle { node: node.id() }
            } else {
                ChainError::ForeignNode { node: node.id() }
            });
        }

        tracing::trace!(chain = self.id, node = node.id(), name = node.name(), position = link.position, "append");
        self.nodes.push(node.clone());
        Ok(())
    }

    /// Walks the chain from its head.
    ///
    /// Returns `Unhandled` (not an error) when every handler passes.
    ///
    /// # Errors
    /// [`ChainError::ForeignToken`] if a handler returns a token it did not
    /// obtain from its own [`Cx::defer`].
    pub fn dispatch(&self, request: R, context: C) -> Result<Dispatch<T>, ChainError> {
        let dispatch = next_dispatch_id();
        tracing::debug!(chain = self.id, dispatch, "dispatch");
        self.walk(dispatch, 0, request, context)
    }

    /// Walks the chain starting at `node` instead of the head.
    ///
    /// # Errors
    /// [`ChainError::ForeignNode`] if `node` is not part of this chain.
    pub fn dispatch_from(
        &self,
        node: &NodeRef<R, T, C>,
        request: R,
        context: C,
    ) -> Result<Dispatch<T>, ChainError> {
        let start = match node.link() {
            Some(link) if link.chain == self.id => link.position,
            _ => return Err(ChainError::ForeignNode { node: node.id() }),
        };
        let dispatch = next_dispatch_id();
        tracing::debug!(chain = self.id, dispatch, start, "dispatch from node");
        self.walk(dispatch, start, request, context)
    }

    /// Continues a suspended dispatch with the deferring handler's final outcome.
    ///
    /// - `Outcome::Result(v)` → `Handled(v)`.
    /// - `Outcome::Continue` → traversal resumes at the next handler.
    ///
    /// Returns `Relayed` when the deferring handler is still running; that
    /// dispatch call then reports the final result.
    ///
    /// # Errors
    /// - [`ChainError::ForeignToken`] if `token` was minted by another chain.
    /// - [`ChainError::AlreadyDeferred`] if `outcome` is another `Deferred`.
    /// - [`ChainError::StaleToken`] if `token` was already resumed or abandoned.
    pub fn resume(&self, token: ResumeToken, outcome: Outcome<T>) -> Result<Dispatch<T>, ChainError> {
        if token.chain != self.id {
            return Err(ChainError::ForeignToken {
                dispatch: token.dispatch,
            });
        }
        let resolution = match outcome {
            Outcome::Result(v) => Resolution::Handled(v),
            Outcome::Continue => Resolution::Continue,
            Outcome::Deferred(_) => {
                return Err(ChainError::AlreadyDeferred {
                    dispatch: token.dispatch,
                })
            }
        };

        match self.suspended.claim(&token, resolution)? {
            Claim::Relayed => {
                tracing::debug!(chain = self.id, %token, "resume relayed to running dispatch");
                Ok(Dispatch::Relayed)
            }
            Claim::Parked {
                next,
                request,
                context,
                resolution,
            } => {
                tracing::debug!(chain = self.id, %token, "resume");
                match resolution {
                    Resolution::Handled(v) => Ok(Dispatch::Handled(v)),
                    Resolution::Continue => self.walk(token.dispatch, next, request, context),
                }
            }
        }
    }

    /// Drops a suspended dispatch together with its request and context.
    ///
    /// Returns `false` if the token is foreign, stale, or its handler is still running.
    pub fn abandon(&self, token: &ResumeToken) -> bool {
        if token.chain != self.id {
            return false;
        }
        let dropped = self.suspended.abandon(token);
        if dropped {
            tracing::debug!(chain = self.id, %token, "abandon");
        }
        dropped
    }

    /// Number of dispatches currently suspended (or about to be).
    pub fn pending(&self) -> usize {
        self.suspended.len()
    }

    /// Number of handlers.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the chain has no handlers.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node at `position`, for use with [`dispatch_from`](Self::dispatch_from).
    pub fn node(&self, position: usize) -> Option<&NodeRef<R, T, C>> {
        self.nodes.get(position)
    }

    fn walk(&self, dispatch: u64, start: usize, request: R, context: C) -> Result<Dispatch<T>, ChainError> {
        let mut request = request;
        let mut context = context;
        let mut position = start;

        while let Some(node) = self.nodes.get(position) {
            let mut cx = Cx::new(&mut context, self.id, dispatch, position, &self.suspended);
            let outcome = node.handler().handle(&request, &mut cx);
            let minted = cx.into_minted();

            let token = match outcome {
                Outcome::Result(v) => {
                    self.release_unused(minted);
                    tracing::debug!(chain = self.id, dispatch, position, handler = node.name(), "handled");
                    return Ok(Dispatch::Handled(v));
                }
                Outcome::Continue => {
                    self.release_unused(minted);
                    tracing::trace!(chain = self.id, dispatch, position, handler = node.name(), "continue");
                    position += 1;
                    continue;
                }
                Outcome::Deferred(token) => token,
            };

            match minted {
                Some(m) if m == token => {}
                other => {
                    self.release_unused(other);
                    return Err(ChainError::ForeignToken {
                        dispatch: token.dispatch,
                    });
                }
            }

            match self.suspended.park(&token, position + 1, request, context) {
                Parking::Parked => {
                    tracing::debug!(chain = self.id, %token, handler = node.name(), "suspended");
                    return Ok(Dispatch::Suspended(token));
                }
                Parking::Early {
                    resolution,
                    request: r,
                    context: c,
                } => match resolution {
                    Resolution::Handled(v) => return Ok(Dispatch::Handled(v)),
                    Resolution::Continue => {
                        request = r;
                        context = c;
                        position += 1;
                    }
                },
            }
        }

        tracing::debug!(chain = self.id, dispatch, "unhandled");
        Ok(Dispatch::Unhandled)
    }

    fn release_unused(&self, minted: Option<ResumeToken>) {
        if let Some(token) = minted {
            if self.suspended.release(&token) {
                tracing::warn!(chain = self.id, %token, "resume discarded: handler did not defer");
            }
        }
    }
}

impl<R, T, C> Default for HandlerChain<R, T, C>
where
    R: Send + 'static,
    T: Send + 'static,
    C: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R: 'static, T: 'static, C: 'static> fmt::Debug for HandlerChain<R, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerChain")
            .field("id", &self.id)
            .field("nodes", &self.nodes)
            .finish()
    }
}
