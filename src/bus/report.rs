//! # Publish outcome.
//!
//! [`PublishReport`] is what every publish returns: how many subscribers
//! handled the event and which ones failed. Publishing never aborts half-way;
//! failures are collected here instead.
//!
//! ```text
//! publish ──► sub1 ok ──► sub2 Err ──► sub3 panic ──► sub4 ok
//!                           │             │
//!                           ▼             ▼
//!                PublishReport { delivered: 2, failures: [sub2, sub3] }
//! ```

use std::fmt;

use crate::bus::SubscriptionId;
use crate::error::{PublishError, SubscriberError};

/// Why a single subscriber did not handle an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The subscriber returned an error.
    Error(SubscriberError),
    /// The subscriber panicked; carries the panic message.
    Panicked(String),
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Error(err) => write!(f, "{err}"),
            FailureKind::Panicked(info) => write!(f, "panicked: {info}"),
        }
    }
}

/// One subscriber failure collected during a publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberFailure {
    /// Subscription that failed.
    pub id: SubscriptionId,
    /// Subscriber name (see [`Subscribe::name`](crate::Subscribe::name)).
    pub subscriber: String,
    /// What went wrong.
    pub kind: FailureKind,
}

impl SubscriberFailure {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match &self.kind {
            FailureKind::Error(err) => err.as_label(),
            FailureKind::Panicked(_) => "subscriber_panicked",
        }
    }

    /// Returns `true` if the subscriber panicked.
    #[inline]
    pub fn is_panic(&self) -> bool {
        matches!(self.kind, FailureKind::Panicked(_))
    }
}

/// Result of delivering one event to a topic's subscribers.
#[must_use = "a publish report may carry subscriber failures"]
#[derive(Debug, Clone)]
pub struct PublishReport {
    topic: String,
    delivered: usize,
    failures: Vec<SubscriberFailure>,
}

impl PublishReport {
    pub(crate) fn new(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            delivered: 0,
            failures: Vec::new(),
        }
    }

    pub(crate) fn record_delivered(&mut self) {
        self.delivered += 1;
    }

    pub(crate) fn record_failure(&mut self, failure: SubscriberFailure) {
        self.failures.push(failure);
    }

    /// Topic the event was published on.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Number of subscribers that handled the event without failing.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Number of subscribers that were invoked (successful or not).
    pub fn attempted(&self) -> usize {
        self.delivered + self.failures.len()
    }

    /// Failures in delivery order.
    pub fn failures(&self) -> &[SubscriberFailure] {
        &self.failures
    }

    /// `true` if no subscriber was invoked (topic unknown or empty).
    pub fn is_empty(&self) -> bool {
        self.attempted() == 0
    }

    /// `true` if no subscriber failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Converts the report into a `Result`, surfacing failures as [`PublishError`].
    ///
    /// Returns the number of successful deliveries otherwise.
    ///
    /// # Example
    /// ```
    /// use dispatchkit::EventBus;
    ///
    /// let bus: EventBus<u8> = EventBus::new();
    /// assert_eq!(bus.publish("nobody.listens", &1).into_result().unwrap(), 0);
    /// ```
    pub fn into_result(self) -> Result<usize, PublishError> {
        if self.failures.is_empty() {
            Ok(self.delivered)
        } else {
            Err(PublishError {
                topic: self.topic,
                failures: self.failures,
            })
        }
    }
}
