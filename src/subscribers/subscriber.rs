//! # Event subscriber trait.
//!
//! Provides [`Subscribe`] an extension point for plugging callbacks into an
//! [`EventBus`](crate::EventBus).
//!
//! Each subscriber gets:
//! - **Ordered delivery** (subscribers of a topic run in subscription order)
//! - **Synchronous invocation** on the publisher's thread
//! - **Failure isolation** (errors and, by default, panics are collected into the
//!   [`PublishReport`](crate::PublishReport); delivery continues)
//!
//! ## Architecture
//! ```text
//! EventBus::publish(topic, &event)
//!     └─► snapshot ──► sub1.on_event() ──► sub2.on_event() ──► ... ──► PublishReport
//!                         └─ Err / panic ──► SubscriberFailure (delivery continues)
//! ```
//!
//! ## Rules
//! - The bus lock is not held while `on_event` runs, so a subscriber may
//!   subscribe, unsubscribe or publish on the same bus.
//! - Subscribers added during a publish are not invoked by that publish.
//!
//! ## Example
//! ```rust
//! use dispatchkit::{EventBus, Subscribe, SubscriberError};
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Revenue {
//!     cents: AtomicU64,
//! }
//!
//! impl Subscribe<u64> for Revenue {
//!     fn on_event(&self, _topic: &str, amount: &u64) -> Result<(), SubscriberError> {
//!         self.cents.fetch_add(*amount, Ordering::Relaxed);
//!         Ok(())
//!     }
//!
//!     fn name(&self) -> &str { "revenue" }
//! }
//!
//! let bus: EventBus<u64> = EventBus::new();
//! let revenue = Arc::new(Revenue::default());
//! bus.subscribe("order.paid", revenue.clone());
//! let _ = bus.publish("order.paid", &1250);
//! assert_eq!(revenue.cents.load(Ordering::Relaxed), 1250);
//! ```

use crate::error::SubscriberError;

/// Event subscriber for an [`EventBus`](crate::EventBus) carrying payloads of type `E`.
///
/// ### Implementation requirements
/// - Report anticipated failures by returning `Err`; do not panic.
/// - Keep `on_event` short: it runs inline, before the next subscriber.
pub trait Subscribe<E>: Send + Sync + 'static {
    /// Processes a single event published on `topic`.
    ///
    /// Called on the publisher's thread, after every subscriber that was
    /// subscribed earlier to the same topic.
    fn on_event(&self, topic: &str, event: &E) -> Result<(), SubscriberError>;

    /// Returns the subscriber name used in logs and failure reports.
    ///
    /// The default uses `type_name::<Self>()`, which can be verbose - override it when possible.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
