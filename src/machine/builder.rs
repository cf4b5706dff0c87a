//! # Machine construction and validation.
//!
//! [`StateMachineBuilder`] collects states and their transitions, then
//! [`build`](StateMachineBuilder::build) validates the whole table at once.
//!
//! ## Rules
//! Checked in this order; the first violation is returned:
//! 1. state names are unique → [`MachineError::DuplicateState`]
//! 2. event labels are unique per state → [`MachineError::DuplicateTransition`]
//! 3. the initial state is registered → [`MachineError::UnknownInitial`]
//! 4. every target is registered → [`MachineError::UnknownTarget`]
//!
//! A built machine can therefore never enter an unregistered state.

use std::collections::{HashMap, HashSet};

use crate::config::Config;
use crate::error::MachineError;
use crate::machine::state_machine::{State, StateMachine};
use crate::machine::transition::{Effect, Transit, Transition};

struct Declared<A> {
    event: String,
    target: String,
    effect: Option<Effect<A>>,
}

/// Transition table of one state, filled inside
/// [`StateMachineBuilder::state`].
pub struct StateBuilder<A> {
    name: String,
    declared: Vec<Declared<A>>,
}

impl<A> StateBuilder<A> {
    fn new(name: String) -> Self {
        Self {
            name,
            declared: Vec::new(),
        }
    }

    /// Maps `event` to `target` without a side effect.
    pub fn on(mut self, event: impl Into<String>, target: impl Into<String>) -> Self {
        self.declared.push(Declared {
            event: event.into(),
            target: target.into(),
            effect: None,
        });
        self
    }

    /// Maps `event` to `target`, running `effect` when the transition is taken.
    pub fn on_with<F>(mut self, event: impl Into<String>, target: impl Into<String>, effect: F) -> Self
    where
        F: FnMut(&Transit<'_>, &A) + Send + 'static,
    {
        self.declared.push(Declared {
            event: event.into(),
            target: target.into(),
            effect: Some(Box::new(effect)),
        });
        self
    }
}

/// Builder returned by [`StateMachine::builder`].
pub struct StateMachineBuilder<A = ()> {
    initial: String,
    states: Vec<StateBuilder<A>>,
    cfg: Config,
}

impl<A> StateMachineBuilder<A> {
    pub(crate) fn new(initial: String) -> Self {
        Self {
            initial,
            states: Vec::new(),
            cfg: Config::default(),
        }
    }

    /// Registers a state and declares its transitions.
    pub fn state<F>(mut self, name: impl Into<String>, transitions: F) -> Self
    where
        F: FnOnce(StateBuilder<A>) -> StateBuilder<A>,
    {
        self.states.push(transitions(StateBuilder::new(name.into())));
        self
    }

    /// Registers a state without transitions.
    pub fn terminal(self, name: impl Into<String>) -> Self {
        self.state(name, |s| s)
    }

    /// Overrides the default [`Config`].
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Validates the table and builds the machine in its initial state.
    pub fn build(self) -> Result<StateMachine<A>, MachineError> {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(self.states.len());
        for (i, s) in self.states.iter().enumerate() {
            if index.insert(s.name.as_str(), i).is_some() {
                return Err(MachineError::DuplicateState {
                    state: s.name.clone(),
                });
            }
        }

        for s in &self.states {
            let mut seen = HashSet::with_capacity(s.declared.len());
            for d in &s.declared {
                if !seen.insert(d.event.as_str()) {
                    return Err(MachineError::DuplicateTransition {
                        state: s.name.clone(),
                        event: d.event.clone(),
                    });
                }
            }
        }

        let initial = *index
            .get(self.initial.as_str())
            .ok_or_else(|| MachineError::UnknownInitial {
                state: self.initial.clone(),
            })?;

        let mut resolved = Vec::with_capacity(self.states.len());
        for s in &self.states {
            let mut transitions = Vec::with_capacity(s.declared.len());
            for d in &s.declared {
                let Some(&target) = index.get(d.target.as_str()) else {
                    return Err(MachineError::UnknownTarget {
                        state: s.name.clone(),
                        event: d.event.clone(),
                        target: d.target.clone(),
                    });
                };
                transitions.push((d.event.clone(), target));
            }
            resolved.push(transitions);
        }
        drop(index);

        let mut effects = Vec::new();
        let mut states = Vec::with_capacity(self.states.len());
        for (s, targets) in self.states.into_iter().zip(resolved) {
            let transitions = s
                .declared
                .into_iter()
                .zip(targets)
                .map(|(d, (event, target))| Transition {
                    event,
                    target,
                    effect: d.effect.map(|e| {
                        effects.push(e);
                        effects.len() - 1
                    }),
                })
                .collect();
            states.push(State {
                name: s.name,
                transitions,
            });
        }

        tracing::debug!(states = states.len(), initial = self.initial.as_str(), "state machine built");
        Ok(StateMachine::from_parts(states, effects, initial, &self.cfg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_states() -> StateMachineBuilder {
        StateMachine::builder("a")
            .state("a", |s| s.on("go", "b"))
            .terminal("b")
    }

    #[test]
    fn test_valid_table_builds() {
        let m = two_states().build().unwrap();
        assert_eq!(m.state(), "a");
    }

    #[test]
    fn test_duplicate_state() {
        let err = two_states().terminal("a").build().unwrap_err();
        assert_eq!(err, MachineError::DuplicateState { state: "a".into() });
    }

    #[test]
    fn test_duplicate_transition() {
        let err = StateMachine::<()>::builder("a")
            .state("a", |s| s.on("go", "a").on("go", "a"))
            .build()
            .unwrap_err();
        assert_eq!(err.as_label(), "machine_duplicate_transition");
    }

    #[test]
    fn test_unknown_initial() {
        let err = StateMachine::<()>::builder("z").terminal("a").build().unwrap_err();
        assert_eq!(err, MachineError::UnknownInitial { state: "z".into() });
    }

    #[test]
    fn test_unknown_target_fails_before_any_fire() {
        let err = StateMachine::<()>::builder("a")
            .state("a", |s| s.on("go", "b").on("lost", "nowhere"))
            .terminal("b")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            MachineError::UnknownTarget {
                state: "a".into(),
                event: "lost".into(),
                target: "nowhere".into(),
            }
        );
    }

    #[test]
    fn test_duplicate_state_reported_before_unknown_target() {
        let err = StateMachine::<()>::builder("a")
            .state("a", |s| s.on("go", "missing"))
            .terminal("a")
            .build()
            .unwrap_err();
        assert!(matches!(err, MachineError::DuplicateState { .. }));
    }
}
