//! Finite state machine over a validated transition table.
//!
//! ## Contents
//! - [`StateMachine`] current state + `fire`
//! - [`StateMachineBuilder`], [`StateBuilder`] declaration and validation
//! - [`Transit`], [`Effect`] what a transition's side effect receives
//! - [`Fired`] result of `fire`
//! - [`TransitionRecord`] entries of the bounded history

mod builder;
mod history;
mod state_machine;
mod transition;

pub use builder::{StateBuilder, StateMachineBuilder};
pub use history::TransitionRecord;
pub use state_machine::StateMachine;
pub use transition::{Effect, Fired, Transit};
