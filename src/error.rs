//! Error types used by the dispatch primitives and their callbacks.
//!
//! This module defines four error types:
//!
//! - [`ChainError`]: misuse of a [`HandlerChain`](crate::HandlerChain) (cycles, foreign nodes or tokens).
//! - [`MachineError`]: invalid [`StateMachine`](crate::StateMachine) definitions, caught at build time.
//! - [`SubscriberError`]: failures returned by bus subscribers.
//! - [`PublishError`]: the aggregated subscriber failures of one publish.
//!
//! Expected misses are **not** errors: an exhausted chain yields
//! [`Dispatch::Unhandled`](crate::Dispatch::Unhandled), an unknown event yields
//! [`Fired::Ignored`](crate::Fired::Ignored), and publishing to an empty topic
//! yields an empty [`PublishReport`](crate::PublishReport).
//!
//! Every type provides `as_label` (stable snake_case label for logs/metrics).

use thiserror::Error;

use crate::bus::SubscriberFailure;

/// # Errors produced by handler chain construction and dispatch.
///
/// All variants are usage errors: they are raised at the call that introduced
/// them and are never silently tolerated.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The node is already linked into this chain; appending it again would
    /// make it its own transitive successor.
    #[error("node #{node} is already linked into this chain; appending it would close a cycle")]
    Cycle {
        /// Id of the rejected node.
        node: u64,
    },

    /// The node is owned by a different chain.
    #[error("node #{node} does not belong to this chain")]
    ForeignNode {
        /// Id of the rejected node.
        node: u64,
    },

    /// The resume token was minted by a different chain or a different step.
    #[error("resume token for dispatch #{dispatch} was not issued here")]
    ForeignToken {
        /// Dispatch id carried by the token.
        dispatch: u64,
    },

    /// The resume token was already consumed (double resume) or abandoned.
    #[error("resume token for dispatch #{dispatch} is stale (already resumed or abandoned)")]
    StaleToken {
        /// Dispatch id carried by the token.
        dispatch: u64,
    },

    /// A second deferral was issued while the first one was still outstanding.
    #[error("dispatch #{dispatch} already has an outstanding deferral")]
    AlreadyDeferred {
        /// Dispatch id of the offending call.
        dispatch: u64,
    },

    /// The chain already holds the configured maximum of suspended dispatches.
    #[error("chain already holds {limit} suspended dispatches")]
    PendingLimit {
        /// The configured limit (`Config::max_pending`).
        limit: usize,
    },
}

impl ChainError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use dispatchkit::ChainError;
    ///
    /// let err = ChainError::StaleToken { dispatch: 7 };
    /// assert_eq!(err.as_label(), "chain_stale_token");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ChainError::Cycle { .. } => "chain_cycle",
            ChainError::ForeignNode { .. } => "chain_foreign_node",
            ChainError::ForeignToken { .. } => "chain_foreign_token",
            ChainError::StaleToken { .. } => "chain_stale_token",
            ChainError::AlreadyDeferred { .. } => "chain_already_deferred",
            ChainError::PendingLimit { .. } => "chain_pending_limit",
        }
    }
}

/// # Errors produced while building a state machine.
///
/// Every declared transition target is validated before the machine exists,
/// so `fire` itself cannot fail.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MachineError {
    /// Two states were registered under the same name.
    #[error("state {state:?} is registered twice")]
    DuplicateState {
        /// The duplicated state name.
        state: String,
    },

    /// One state maps the same event label twice.
    #[error("state {state:?} maps event {event:?} twice")]
    DuplicateTransition {
        /// State declaring the transitions.
        state: String,
        /// The duplicated event label.
        event: String,
    },

    /// The initial state is not among the registered states.
    #[error("initial state {state:?} is not registered")]
    UnknownInitial {
        /// The requested initial state.
        state: String,
    },

    /// A transition points to a state that is not registered.
    #[error("transition {state:?} --{event:?}--> {target:?} targets an unregistered state")]
    UnknownTarget {
        /// Source state of the transition.
        state: String,
        /// Event label of the transition.
        event: String,
        /// The missing target.
        target: String,
    },
}

impl MachineError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            MachineError::DuplicateState { .. } => "machine_duplicate_state",
            MachineError::DuplicateTransition { .. } => "machine_duplicate_transition",
            MachineError::UnknownInitial { .. } => "machine_unknown_initial",
            MachineError::UnknownTarget { .. } => "machine_unknown_target",
        }
    }
}

/// # Errors returned by bus subscribers.
///
/// A subscriber error never stops delivery to the remaining subscribers; it is
/// collected into the [`PublishReport`](crate::PublishReport).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubscriberError {
    /// Processing failed.
    #[error("subscriber failed: {reason}")]
    Fail {
        /// The underlying error message.
        reason: String,
    },

    /// The subscriber refused the payload (wrong shape, unexpected topic).
    #[error("subscriber rejected event: {reason}")]
    Rejected {
        /// Why the event was rejected.
        reason: String,
    },
}

impl SubscriberError {
    /// Shorthand for [`SubscriberError::Fail`].
    pub fn fail(reason: impl Into<String>) -> Self {
        SubscriberError::Fail {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use dispatchkit::SubscriberError;
    ///
    /// let err = SubscriberError::fail("disk full");
    /// assert_eq!(err.as_label(), "subscriber_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SubscriberError::Fail { .. } => "subscriber_failed",
            SubscriberError::Rejected { .. } => "subscriber_rejected",
        }
    }
}

/// Aggregated subscriber failures of one publish.
///
/// Produced by [`PublishReport::into_result`](crate::PublishReport::into_result).
#[derive(Error, Debug, Clone)]
#[error("{} subscriber(s) of topic {topic:?} failed", failures.len())]
pub struct PublishError {
    /// Topic that was published.
    pub topic: String,
    /// Per-subscriber failures, in delivery order.
    pub failures: Vec<SubscriberFailure>,
}

impl PublishError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        "publish_failed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(ChainError::Cycle { node: 1 }.as_label(), "chain_cycle");
        assert_eq!(
            ChainError::PendingLimit { limit: 2 }.as_label(),
            "chain_pending_limit"
        );
        assert_eq!(
            MachineError::UnknownInitial { state: "a".into() }.as_label(),
            "machine_unknown_initial"
        );
        assert_eq!(
            SubscriberError::Rejected { reason: "x".into() }.as_label(),
            "subscriber_rejected"
        );
    }

    #[test]
    fn test_display_names_the_offender() {
        let err = MachineError::UnknownTarget {
            state: "off".into(),
            event: "press".into(),
            target: "dim".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("\"off\""));
        assert!(msg.contains("\"dim\""));
    }
}
