//! # Event subscribers for the event bus.
//!
//! This module provides the [`Subscribe`] trait, the closure adapter
//! [`SubscriberFn`], and the optional built-in `LogWriter`.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   producer ── publish(topic, &E) ──► EventBus ──► snapshot of topic subscribers
//!                                                        │
//!                                                        ├──► Subscribe::on_event(topic, &E)
//!                                                        │         │
//!                                                        │    ┌────┴──────┬──────────┬───────┐
//!                                                        │    ▼           ▼          ▼       ▼
//!                                                        │  LogWriter  SubscriberFn  Custom  ...
//!                                                        │
//!                                                        └──► PublishReport (delivered + failures)
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use dispatchkit::{Subscribe, SubscriberError};
//!
//! struct Audit;
//!
//! impl Subscribe<String> for Audit {
//!     fn on_event(&self, topic: &str, event: &String) -> Result<(), SubscriberError> {
//!         if event.is_empty() {
//!             return Err(SubscriberError::Rejected { reason: format!("empty payload on {topic}") });
//!         }
//!         Ok(())
//!     }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscriber;
mod subscriber_fn;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_fn::{SubscriberFn, SubscriberRef};
