//! # Chain nodes.
//!
//! A [`NodeRef`] wraps one handler with a process-unique id and an ownership
//! tag. The tag is written once, when the node is appended, and records the
//! owning chain and the node's position in it:
//!
//! ```text
//! NodeRef ──► Node { id, handler, link: OnceLock<Link { chain, position }> }
//!                                          │
//!                     unset ──append──► set (never changes again)
//! ```
//!
//! Because the tag can be written only once, a node is in at most one chain
//! at most once, so chains are acyclic by construction.

use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::chain::handler::{Cx, Handler, HandlerFn};
use crate::chain::outcome::Outcome;
use crate::chain::token::next_node_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Link {
    pub(crate) chain: u64,
    pub(crate) position: usize,
}

struct Node<R, T, C> {
    id: u64,
    handler: Box<dyn Handler<R, T, C>>,
    link: OnceLock<Link>,
}

/// Shared handle to a chain node.
///
/// Returned by [`HandlerChain::append`](crate::HandlerChain::append); pass it to
/// [`HandlerChain::dispatch_from`](crate::HandlerChain::dispatch_from) to start
/// traversal at this node.
pub struct NodeRef<R, T, C = ()>(Arc<Node<R, T, C>>);

impl<R: 'static, T: 'static, C: 'static> NodeRef<R, T, C> {
    /// Wraps a handler into a detached node.
    pub fn new(handler: impl Handler<R, T, C>) -> Self {
        Self(Arc::new(Node {
            id: next_node_id(),
            handler: Box::new(handler),
            link: OnceLock::new(),
        }))
    }

    /// Wraps a closure into a detached node.
    pub fn from_fn<F>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(&R, &mut Cx<'_, C>) -> Outcome<T> + Send + Sync + 'static,
    {
        Self::new(HandlerFn::new(name, f))
    }

    /// Process-unique node id.
    #[inline]
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Name of the wrapped handler.
    pub fn name(&self) -> &str {
        self.0.handler.name()
    }

    /// Position in the owning chain, or `None` while detached.
    pub fn position(&self) -> Option<usize> {
        self.0.link.get().map(|l| l.position)
    }

    /// Returns `true` once the node has been appended to a chain.
    pub fn is_linked(&self) -> bool {
        self.0.link.get().is_some()
    }

    pub(crate) fn handler(&self) -> &dyn Handler<R, T, C> {
        self.0.handler.as_ref()
    }

    pub(crate) fn link(&self) -> Option<Link> {
        self.0.link.get().copied()
    }

    /// Writes the ownership tag; returns the existing tag if already linked.
    pub(crate) fn attach(&self, link: Link) -> Result<(), Link> {
        match self.0.link.set(link) {
            Ok(()) => Ok(()),
            Err(_) => Err(self.0.link.get().copied().unwrap_or(link)),
        }
    }
}

impl<R, T, C> Clone for NodeRef<R, T, C> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<R: 'static, T: 'static, C: 'static> fmt::Debug for NodeRef<R, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.0.id)
            .field("name", &self.name())
            .field("link", &self.0.link.get())
            .finish()
    }
}
