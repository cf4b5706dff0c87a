//! Transition descriptors and `fire` results.

use std::fmt;

/// Side effect attached to a transition.
///
/// Runs synchronously inside [`StateMachine::fire`](crate::StateMachine::fire),
/// before the current state changes. A panicking effect leaves the machine in
/// the source state.
pub type Effect<A> = Box<dyn FnMut(&Transit<'_>, &A) + Send>;

/// The transition being taken, as seen by an [`Effect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transit<'a> {
    /// Current state.
    pub from: &'a str,
    /// Target state.
    pub to: &'a str,
    /// Event label that triggered the transition.
    pub event: &'a str,
}

impl Transit<'_> {
    /// Returns `true` when the transition targets its own source state.
    #[inline]
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

impl fmt::Display for Transit<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} --{}--> {}", self.from, self.event, self.to)
    }
}

/// Result of [`StateMachine::fire`](crate::StateMachine::fire).
#[must_use = "an event may be ignored in the current state"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fired {
    /// The event was mapped; the machine moved (possibly to the same state).
    Moved {
        /// State before the transition.
        from: String,
        /// State after the transition.
        to: String,
    },
    /// The current state has no mapping for the event. State is unchanged.
    Ignored,
}

impl Fired {
    /// Returns `true` for [`Fired::Moved`].
    #[inline]
    pub fn is_moved(&self) -> bool {
        matches!(self, Fired::Moved { .. })
    }

    /// Returns `true` for [`Fired::Ignored`].
    #[inline]
    pub fn is_ignored(&self) -> bool {
        matches!(self, Fired::Ignored)
    }
}

/// Resolved transition: target index and optional effect slot.
#[derive(Debug, Clone)]
pub(crate) struct Transition {
    pub(crate) event: String,
    pub(crate) target: usize,
    pub(crate) effect: Option<usize>,
}
