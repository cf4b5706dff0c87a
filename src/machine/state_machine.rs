//! # Finite state machine.
//!
//! A [`StateMachine`] owns a validated transition table and a current state.
//! The only way to change state is [`fire`](StateMachine::fire):
//!
//! ```text
//! fire(event, &args)
//!   │
//!   ├─ current state maps event? ── no ──► Fired::Ignored (state unchanged)
//!   │
//!   └─ yes ─► effect(&Transit { from, to, event }, &args)   (if declared)
//!             ├─► record in history                          (if enabled)
//!             ├─► current = to                               (self-loop legal)
//!             └─► Fired::Moved { from, to }
//! ```
//!
//! Terminal states are simply states without mappings.

use std::fmt;

use crate::config::Config;
use crate::machine::builder::StateMachineBuilder;
use crate::machine::history::{History, TransitionRecord};
use crate::machine::transition::{Effect, Fired, Transit, Transition};

pub(crate) struct State {
    pub(crate) name: String,
    pub(crate) transitions: Vec<Transition>,
}

impl State {
    fn lookup(&self, event: &str) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.event == event)
    }
}

/// State machine over named states, with effects receiving arguments `A`.
///
/// # Example
/// ```
/// use dispatchkit::{Fired, StateMachine};
///
/// let mut door: StateMachine = StateMachine::builder("closed")
///     .state("closed", |s| s.on("open", "opened"))
///     .state("opened", |s| s.on("close", "closed"))
///     .build()?;
///
/// assert!(door.fire("open", &()).is_moved());
/// assert_eq!(door.state(), "opened");
/// assert_eq!(door.fire("open", &()), Fired::Ignored);
/// # Ok::<(), dispatchkit::MachineError>(())
/// ```
pub struct StateMachine<A = ()> {
    states: Vec<State>,
    effects: Vec<Effect<A>>,
    current: usize,
    history: History,
}

impl<A> StateMachine<A> {
    /// Starts a builder with the given initial state.
    pub fn builder(initial: impl Into<String>) -> StateMachineBuilder<A> {
        StateMachineBuilder::new(initial.into())
    }

    pub(crate) fn from_parts(states: Vec<State>, effects: Vec<Effect<A>>, current: usize, cfg: &Config) -> Self {
        Self {
            states,
            effects,
            current,
            history: History::new(cfg.history_limit()),
        }
    }

    /// Feeds `event` to the current state.
    ///
    /// Effects run before the state changes; a panicking effect unwinds into
    /// the caller and leaves the machine in the source state.
    pub fn fire(&mut self, event: &str, args: &A) -> Fired {
        let from = self.current;
        let Some((to, effect)) = self.states[from].lookup(event).map(|t| (t.target, t.effect)) else {
            tracing::trace!(state = self.states[from].name.as_str(), event, "event ignored");
            return Fired::Ignored;
        };

        let transit = Transit {
            from: &self.states[from].name,
            to: &self.states[to].name,
            event,
        };
        if let Some(effect) = effect.and_then(|slot| self.effects.get_mut(slot)) {
            effect(&transit, args);
        }

        tracing::debug!(%transit, "transition");
        self.history.record(transit.from, transit.to, event);
        let fired = Fired::Moved {
            from: transit.from.to_owned(),
            to: transit.to.to_owned(),
        };
        self.current = to;
        fired
    }

    /// Name of the current state.
    #[inline]
    pub fn state(&self) -> &str {
        &self.states[self.current].name
    }

    /// Returns `true` if `event` is mapped in the current state.
    pub fn can_fire(&self, event: &str) -> bool {
        self.states[self.current].lookup(event).is_some()
    }

    /// Event labels accepted in the current state, in declaration order.
    pub fn events(&self) -> impl Iterator<Item = &str> + '_ {
        self.states[self.current].transitions.iter().map(|t| t.event.as_str())
    }

    /// Returns `true` if the current state has no mappings.
    pub fn is_terminal(&self) -> bool {
        self.states[self.current].transitions.is_empty()
    }

    /// Registered state names, in registration order.
    pub fn states(&self) -> impl Iterator<Item = &str> + '_ {
        self.states.iter().map(|s| s.name.as_str())
    }

    /// Recent transitions, oldest first. Empty when history is disabled.
    pub fn history(&self) -> impl Iterator<Item = &TransitionRecord> + '_ {
        self.history.iter()
    }

    /// Total number of transitions taken, including evicted ones.
    pub fn transitions(&self) -> u64 {
        self.history.transitions()
    }
}

impl<A> fmt::Debug for StateMachine<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("state", &self.state())
            .field("states", &self.states().collect::<Vec<_>>())
            .field("transitions", &self.transitions())
            .finish()
    }
}
