//! # dispatchkit
//!
//! **dispatchkit** provides three small, independent primitives for routing
//! work inside a process:
//!
//! - [`EventBus`] publish/subscribe over string topics,
//! - [`HandlerChain`] chain of responsibility with resumable deferral,
//! - [`StateMachine`] finite state machine over a validated transition table.
//!
//! None of them requires another; client code composes them.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!        producer                      producer                    producer
//!           │ publish(topic, &E)          │ dispatch(req, ctx)        │ fire(event, &args)
//!           ▼                             ▼                           ▼
//! ┌───────────────────┐       ┌────────────────────────┐     ┌──────────────────────┐
//! │     EventBus      │       │      HandlerChain      │     │     StateMachine     │
//! │ topic → [subs..]  │       │ h0 → h1 → h2 → ...     │     │ state ─event─► state │
//! │ snapshot, fan-out │       │ Result/Continue/Defer  │     │ effect(&Transit, &A) │
//! └─────────┬─────────┘       └───────────┬────────────┘     └──────────┬───────────┘
//!           ▼                             ▼                             ▼
//!     PublishReport           Dispatch::{Handled, Unhandled,         Fired::{Moved,
//!    (delivered + failures)      Suspended(token), Relayed}            Ignored}
//!                                         │
//!                    resume(token, outcome) from any thread / task
//! ```
//!
//! ### Composition
//! ```text
//! HandlerChain handler ──(result)──► EventBus::publish("order.priced", ..)
//! StateMachine effect  ──(transit)─► EventBus::publish / HandlerChain::dispatch
//! ```
//!
//! ## Rules
//! - Expected misses are variants, not errors: `Dispatch::Unhandled`,
//!   `Fired::Ignored`, an empty `PublishReport`.
//! - Configuration mistakes fail at the call that introduced them:
//!   `append` (cycles), `build` (unknown states).
//! - No lock is held while user code runs; subscribers and handlers may
//!   re-enter the bus or chain they were called from.
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Event bus**     | Topic fan-out with one-shot topics and per-publish reports.   | [`EventBus`], [`Subscribe`], [`PublishReport`] |
//! | **Handler chain** | Ordered handlers, deferral and resume, skip-ahead entry.      | [`HandlerChain`], [`Handler`], [`Cx`]       |
//! | **State machine** | Named states, transition effects, bounded history.            | [`StateMachine`], [`Fired`], [`Transit`]    |
//! | **Errors**        | Typed errors with stable labels.                              | [`ChainError`], [`MachineError`], [`PublishError`] |
//! | **Configuration** | Shared settings with sentinel accessors.                      | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] subscriber _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use dispatchkit::{Dispatch, EventBus, HandlerChain, Outcome, StateMachine};
//!
//! let bus: Arc<EventBus<u32>> = Arc::new(EventBus::new());
//! bus.subscribe_fn("coupon", "print", |amount| {
//!     println!("coupon: {amount}");
//!     Ok(())
//! });
//!
//! let mut chain: HandlerChain<(u8, bool), u32> = HandlerChain::new();
//! chain.append_fn("tier-1", |&(kind, paid), _| {
//!     if kind == 1 && paid { Outcome::Result(100) } else { Outcome::Continue }
//! })?;
//! chain.append_fn("fallback", |_, _| Outcome::Result(0))?;
//!
//! let on_bus = Arc::clone(&bus);
//! let mut order: StateMachine<u32> = StateMachine::builder("open")
//!     .state("open", |s| {
//!         s.on_with("pay", "paid", move |_, amount| {
//!             let _ = on_bus.publish("coupon", amount);
//!         })
//!     })
//!     .terminal("paid")
//!     .build()?;
//!
//! if let Dispatch::Handled(coupon) = chain.dispatch((1, true), ())? {
//!     assert!(order.fire("pay", &coupon).is_moved());
//! }
//! assert_eq!(order.state(), "paid");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
mod bus;
mod chain;
mod config;
mod error;
mod machine;
mod subscribers;

// ---- Public re-exports ----

pub use bus::{EventBus, FailureKind, PublishReport, SubscriberFailure, SubscriptionId};
pub use chain::{Cx, Dispatch, Handler, HandlerChain, HandlerFn, NodeRef, Outcome, ResumeToken};
pub use config::Config;
pub use error::{ChainError, MachineError, PublishError, SubscriberError};
pub use machine::{Effect, Fired, StateBuilder, StateMachine, StateMachineBuilder, Transit, TransitionRecord};
pub use subscribers::{Subscribe, SubscriberFn, SubscriberRef};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
