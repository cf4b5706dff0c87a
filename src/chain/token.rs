//! # Resume tokens.
//!
//! A [`ResumeToken`] names exactly one suspension of one dispatch:
//!
//! ```text
//! ResumeToken { chain, dispatch, seq, position }
//!                 │        │       │      └─ index of the deferring handler
//!                 │        │       └──────── unique per suspension (single use)
//!                 │        └──────────────── dispatch call it belongs to
//!                 └───────────────────────── chain that minted it
//! ```
//!
//! Tokens are cheap to clone so a handler can hand one to its background
//! work and return another in [`Outcome::Deferred`](crate::Outcome::Deferred).
//! The chain still accepts only **one** resume per suspension.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

static CHAIN_SEQ: AtomicU64 = AtomicU64::new(1);
static NODE_SEQ: AtomicU64 = AtomicU64::new(1);
static DISPATCH_SEQ: AtomicU64 = AtomicU64::new(1);
static SUSPEND_SEQ: AtomicU64 = AtomicU64::new(1);

#[inline]
pub(crate) fn next_chain_id() -> u64 {
    CHAIN_SEQ.fetch_add(1, AtomicOrdering::Relaxed)
}

#[inline]
pub(crate) fn next_node_id() -> u64 {
    NODE_SEQ.fetch_add(1, AtomicOrdering::Relaxed)
}

#[inline]
pub(crate) fn next_dispatch_id() -> u64 {
    DISPATCH_SEQ.fetch_add(1, AtomicOrdering::Relaxed)
}

/// Handle used to continue a suspended dispatch via
/// [`HandlerChain::resume`](crate::HandlerChain::resume).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResumeToken {
    pub(crate) chain: u64,
    pub(crate) dispatch: u64,
    pub(crate) seq: u64,
    pub(crate) position: usize,
}

impl ResumeToken {
    pub(crate) fn mint(chain: u64, dispatch: u64, position: usize) -> Self {
        Self {
            chain,
            dispatch,
            seq: SUSPEND_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            position,
        }
    }

    /// Id of the dispatch call this token suspends.
    #[inline]
    pub fn dispatch_id(&self) -> u64 {
        self.dispatch
    }

    /// Position (0-based) of the handler that deferred.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }
}

impl fmt::Display for ResumeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chain#{}/dispatch#{}@{} (suspension {})",
            self.chain, self.dispatch, self.position, self.seq
        )
    }
}
