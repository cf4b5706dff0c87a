//! Publish/subscribe: topic table, fan-out and publish reports.
//!
//! ## Contents
//! - [`EventBus`] topic → ordered subscribers, snapshot-on-publish fan-out
//! - [`SubscriptionId`] removal handle returned by `subscribe`
//! - [`PublishReport`], [`SubscriberFailure`], [`FailureKind`] per-publish outcome
//!
//! Subscribers themselves live in [`crate::subscribers`].

mod event_bus;
mod report;

pub use event_bus::{EventBus, SubscriptionId};
pub use report::{FailureKind, PublishReport, SubscriberFailure};
