//! # Topic-keyed publish/subscribe bus.
//!
//! [`EventBus`] maps topic names to ordered subscriber lists and fans each
//! published event out to every current subscriber of its topic.
//!
//! ## Architecture
//! ```text
//! Producers (many):                                     Subscribers (per topic, ordered):
//!   UI callback ──┐                                    ┌──► sub#1.on_event()
//!   timer       ──┼──► publish(topic, &E) ──► snapshot ┼──► sub#2.on_event()
//!   I/O done    ──┘        (lock held only here)       └──► sub#N.on_event()
//!                                                               │
//!                                                               ▼
//!                                                         PublishReport
//! ```
//!
//! ## Rules
//! - **Ordering**: subscribers run in subscription order; duplicates run once each.
//! - **Snapshot**: the subscriber list is copied before the first callback; changes
//!   made during a publish only affect later publishes.
//! - **Re-entrancy**: no lock is held while callbacks run; a subscriber may
//!   publish (nested publishes take their own snapshot), subscribe or unsubscribe.
//! - **Fail-soft**: errors and panics (see [`Config::catch_panics`]) are
//!   collected; remaining subscribers still run.
//! - **One-shot**: after the first publish on a one-shot topic that at least
//!   one subscriber handled, the subscribers of its snapshot are removed. A
//!   publish where every subscriber failed leaves them in place.
//! - **No persistence**: publishing to a topic without subscribers is a no-op.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::bus::report::{FailureKind, PublishReport, SubscriberFailure};
use crate::config::Config;
use crate::error::SubscriberError;
use crate::subscribers::{SubscriberFn, SubscriberRef};

/// Global counter for subscription ids.
static SUBSCRIPTION_SEQ: AtomicU64 = AtomicU64::new(1);

/// Identity token of one subscription, used for removal.
///
/// Ids are unique across all buses of the process, so an id obtained from one
/// bus never removes an entry of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    fn next() -> Self {
        Self(SUBSCRIPTION_SEQ.fetch_add(1, AtomicOrdering::Relaxed))
    }

    /// Raw numeric value.
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

struct Entry<E> {
    id: SubscriptionId,
    subscriber: SubscriberRef<E>,
}

impl<E> Clone for Entry<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            subscriber: SubscriberRef::clone(&self.subscriber),
        }
    }
}

struct Topic<E> {
    entries: Vec<Entry<E>>,
    one_shot: bool,
}

impl<E> Topic<E> {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            one_shot: false,
        }
    }

    /// A topic with no subscribers and no flag carries no information.
    fn is_vacant(&self) -> bool {
        self.entries.is_empty() && !self.one_shot
    }
}

/// Publish/subscribe bus for payloads of type `E`.
///
/// Share it behind an `Arc` when subscribers need to publish themselves.
/// Dropping the bus releases every subscriber.
///
/// # Example
/// ```
/// use std::sync::{Arc, Mutex};
/// use dispatchkit::EventBus;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Order { id: u32 }
///
/// let bus = EventBus::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
///
/// let sink = Arc::clone(&seen);
/// let id = bus.subscribe_fn("order.paid", "audit", move |o: &Order| {
///     sink.lock().unwrap().push(o.id);
///     Ok(())
/// });
///
/// let _ = bus.publish("order.paid", &Order { id: 1 });
/// bus.unsubscribe("order.paid", id);
/// let _ = bus.publish("order.paid", &Order { id: 2 });
///
/// assert_eq!(*seen.lock().unwrap(), vec![1]);
/// ```
pub struct EventBus<E> {
    topics: Mutex<HashMap<String, Topic<E>>>,
    cfg: Config,
}

impl<E: 'static> EventBus<E> {
    /// Creates a bus with [`Config::default`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a bus with the given configuration.
    pub fn with_config(cfg: Config) -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
            cfg,
        }
    }

    /// The table is always left consistent between statements, so a poisoned
    /// lock is recovered rather than propagated.
    fn table(&self) -> MutexGuard<'_, HashMap<String, Topic<E>>> {
        self.topics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a subscriber to `topic` and returns its removal handle.
    ///
    /// Subscribing the same subscriber twice yields two independent entries.
    pub fn subscribe(&self, topic: impl Into<String>, subscriber: SubscriberRef<E>) -> SubscriptionId {
        let topic = topic.into();
        let id = SubscriptionId::next();
        tracing::trace!(topic = %topic, %id, subscriber = subscriber.name(), "subscribe");

        self.table()
            .entry(topic)
            .or_insert_with(Topic::new)
            .entries
            .push(Entry { id, subscriber });
        id
    }

    /// Wraps a closure in a [`SubscriberFn`] and subscribes it.
    pub fn subscribe_fn<F>(
        &self,
        topic: impl Into<String>,
        name: impl Into<Cow<'static, str>>,
        f: F,
    ) -> SubscriptionId
    where
        F: Fn(&E) -> Result<(), SubscriberError> + Send + Sync + 'static,
    {
        self.subscribe(topic, SubscriberFn::arc(name, f))
    }

    /// Removes exactly the entry identified by `id`.
    ///
    /// Returns `false` (not an error) if the topic is unknown or the entry was
    /// already removed.
    pub fn unsubscribe(&self, topic: &str, id: SubscriptionId) -> bool {
        let mut table = self.table();
        let Some(t) = table.get_mut(topic) else {
            return false;
        };

        let before = t.entries.len();
        t.entries.retain(|e| e.id != id);
        let removed = t.entries.len() != before;

        if t.is_vacant() {
            table.remove(topic);
        }
        if removed {
            tracing::trace!(topic, %id, "unsubscribe");
        }
        removed
    }

    /// Removes every subscriber of `topic` and returns how many were removed.
    ///
    /// The one-shot flag of the topic is kept.
    pub fn unsubscribe_all(&self, topic: &str) -> usize {
        let mut table = self.table();
        let Some(t) = table.get_mut(topic) else {
            return 0;
        };

        let removed = std::mem::take(&mut t.entries).len();
        if t.is_vacant() {
            table.remove(topic);
        }
        tracing::trace!(topic, removed, "unsubscribe all");
        removed
    }

    /// Marks (or unmarks) `topic` as one-shot.
    ///
    /// May be called before anyone subscribes; the flag survives the
    /// clearing that a one-shot publish performs.
    pub fn set_one_shot(&self, topic: impl Into<String>, one_shot: bool) {
        let topic = topic.into();
        let mut table = self.table();
        if one_shot {
            table.entry(topic).or_insert_with(Topic::new).one_shot = true;
        } else if let Some(t) = table.get_mut(&topic) {
            t.one_shot = false;
            if t.is_vacant() {
                table.remove(&topic);
            }
        }
    }

    /// Returns `true` if `topic` is marked one-shot.
    pub fn is_one_shot(&self, topic: &str) -> bool {
        self.table().get(topic).is_some_and(|t| t.one_shot)
    }

    /// Delivers `event` to every current subscriber of `topic`.
    ///
    /// Zero subscribers is a no-op that returns an empty report.
    pub fn publish(&self, topic: &str, event: &E) -> PublishReport {
        self.deliver(topic, event, false)
    }

    /// Delivers `event` and then drops the subscribers it reached, as if the
    /// topic were one-shot for this publish only.
    ///
    /// Nothing is dropped when every subscriber failed.
    pub fn publish_once(&self, topic: &str, event: &E) -> PublishReport {
        self.deliver(topic, event, true)
    }

    /// Number of current subscribers of `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.table().get(topic).map_or(0, |t| t.entries.len())
    }

    /// Returns `true` if `topic` has at least one subscriber.
    pub fn has_subscribers(&self, topic: &str) -> bool {
        self.subscriber_count(topic) > 0
    }

    /// Returns the sorted list of topics that currently have subscribers.
    pub fn topics(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .table()
            .iter()
            .filter(|(_, t)| !t.entries.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort_unstable();
        names
    }

    fn deliver(&self, topic: &str, event: &E, once: bool) -> PublishReport {
        let mut report = PublishReport::new(topic);

        let (snapshot, one_shot) = {
            let table = self.table();
            let Some(t) = table.get(topic) else {
                return report;
            };
            if t.entries.is_empty() {
                return report;
            }
            (t.entries.clone(), once || t.one_shot)
        };

        tracing::debug!(topic, subscribers = snapshot.len(), one_shot, "publish");

        for entry in &snapshot {
            match self.invoke(entry, topic, event) {
                Ok(()) => report.record_delivered(),
                Err(kind) => {
                    tracing::warn!(
                        topic,
                        id = %entry.id,
                        subscriber = entry.subscriber.name(),
                        error = %kind,
                        "subscriber failed"
                    );
                    report.record_failure(SubscriberFailure {
                        id: entry.id,
                        subscriber: entry.subscriber.name().to_string(),
                        kind,
                    });
                }
            }
        }

        if one_shot && report.delivered() > 0 {
            self.retire(topic, &snapshot);
        }
        report
    }

    /// Drops the entries a successful one-shot publish reached.
    ///
    /// Entries subscribed while the publish was running are kept.
    fn retire(&self, topic: &str, snapshot: &[Entry<E>]) {
        let mut table = self.table();
        let Some(t) = table.get_mut(topic) else {
            return;
        };

        let before = t.entries.len();
        t.entries.retain(|e| !snapshot.iter().any(|s| s.id == e.id));
        let retired = before - t.entries.len();

        if t.is_vacant() {
            table.remove(topic);
        }
        tracing::trace!(topic, retired, "one-shot subscribers retired");
    }

    fn invoke(&self, entry: &Entry<E>, topic: &str, event: &E) -> Result<(), FailureKind> {
        let sub = &entry.subscriber;
        if !self.cfg.catch_panics {
            return sub.on_event(topic, event).map_err(FailureKind::Error);
        }

        match panic::catch_unwind(AssertUnwindSafe(|| sub.on_event(topic, event))) {
            Ok(res) => res.map_err(FailureKind::Error),
            Err(payload) => {
                let info = if let Some(msg) = payload.downcast_ref::<&'static str>() {
                    (*msg).to_string()
                } else if let Some(msg) = payload.downcast_ref::<String>() {
                    msg.clone()
                } else {
                    "unknown panic".to_string()
                };
                Err(FailureKind::Panicked(info))
            }
        }
    }
}

impl<E: 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let topics = self
            .topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("EventBus")
            .field("topics", &topics)
            .field("cfg", &self.cfg)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    type Log = Arc<Mutex<Vec<String>>>;

    fn recorder(bus: &EventBus<u32>, topic: &str, label: &'static str, log: &Log) -> SubscriptionId {
        let log = Arc::clone(log);
        bus.subscribe_fn(topic, label, move |v: &u32| {
            log.lock().unwrap().push(format!("{label}:{v}"));
            Ok(())
        })
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn test_subscribers_run_in_subscription_order() {
        let bus = EventBus::new();
        let log = Log::default();
        recorder(&bus, "t", "a", &log);
        recorder(&bus, "t", "b", &log);
        recorder(&bus, "t", "c", &log);

        let report = bus.publish("t", &7);
        assert_eq!(report.delivered(), 3);
        assert!(report.is_clean());
        assert_eq!(entries(&log), vec!["a:7", "b:7", "c:7"]);
    }

    #[test]
    fn test_unsubscribed_callback_never_receives_again() {
        let bus = EventBus::new();
        let log = Log::default();
        let a = recorder(&bus, "t", "a", &log);
        recorder(&bus, "t", "b", &log);

        let _ = bus.publish("t", &1);
        assert!(bus.unsubscribe("t", a));
        let _ = bus.publish("t", &2);

        assert_eq!(entries(&log), vec!["a:1", "b:1", "b:2"]);
    }

    #[test]
    fn test_unsubscribe_is_noop_when_unknown() {
        let bus: EventBus<u32> = EventBus::new();
        let log = Log::default();
        let id = recorder(&bus, "t", "a", &log);

        assert!(!bus.unsubscribe("other", id));
        assert!(bus.unsubscribe("t", id));
        assert!(!bus.unsubscribe("t", id));
        assert!(!bus.has_subscribers("t"));
    }

    #[test]
    fn test_publish_to_empty_topic_is_noop() {
        let bus: EventBus<u32> = EventBus::new();
        let report = bus.publish("nobody", &1);
        assert!(report.is_empty());
        assert!(report.is_clean());
        assert!(bus.topics().is_empty());
    }

    #[test]
    fn test_duplicate_subscriptions_each_invoked() {
        let bus = EventBus::new();
        let log = Log::default();
        let sink = Arc::clone(&log);
        let sub: SubscriberRef<u32> = SubscriberFn::arc("dup", move |v: &u32| {
            sink.lock().unwrap().push(format!("dup:{v}"));
            Ok(())
        });

        let first = bus.subscribe("t", Arc::clone(&sub));
        bus.subscribe("t", sub);
        let _ = bus.publish("t", &1);
        assert_eq!(entries(&log), vec!["dup:1", "dup:1"]);

        bus.unsubscribe("t", first);
        let _ = bus.publish("t", &2);
        assert_eq!(entries(&log).last().map(String::as_str), Some("dup:2"));
        assert_eq!(entries(&log).len(), 3);
    }

    #[test]
    fn test_one_shot_topic_fires_once() {
        let bus = EventBus::new();
        let log = Log::default();
        bus.set_one_shot("boot", true);
        recorder(&bus, "boot", "a", &log);
        recorder(&bus, "boot", "b", &log);

        assert_eq!(bus.publish("boot", &1).delivered(), 2);
        assert!(bus.publish("boot", &2).is_empty());
        assert_eq!(entries(&log), vec!["a:1", "b:1"]);
        assert!(bus.is_one_shot("boot"));
    }

    #[test]
    fn test_one_shot_topic_rearms_for_new_subscribers() {
        let bus = EventBus::new();
        let log = Log::default();
        bus.set_one_shot("boot", true);
        recorder(&bus, "boot", "a", &log);
        let _ = bus.publish("boot", &1);

        recorder(&bus, "boot", "b", &log);
        let _ = bus.publish("boot", &2);
        let _ = bus.publish("boot", &3);
        assert_eq!(entries(&log), vec!["a:1", "b:2"]);
    }

    #[test]
    fn test_publish_once_clears_plain_topic() {
        let bus = EventBus::new();
        let log = Log::default();
        recorder(&bus, "t", "a", &log);

        let _ = bus.publish_once("t", &1);
        let _ = bus.publish("t", &2);
        assert_eq!(entries(&log), vec!["a:1"]);
        assert!(!bus.is_one_shot("t"));
    }

    #[test]
    fn test_failed_one_shot_publish_keeps_subscribers() {
        let bus: EventBus<u32> = EventBus::new();
        bus.set_one_shot("boot", true);
        bus.subscribe_fn("boot", "flaky", |v: &u32| {
            if *v == 1 {
                Err(SubscriberError::fail("not ready"))
            } else {
                Ok(())
            }
        });

        let first = bus.publish("boot", &1);
        assert_eq!(first.delivered(), 0);
        assert_eq!(first.failures().len(), 1);
        assert_eq!(bus.subscriber_count("boot"), 1);

        assert_eq!(bus.publish("boot", &2).delivered(), 1);
        assert!(!bus.has_subscribers("boot"));
    }

    #[test]
    fn test_one_shot_keeps_subscribers_added_during_publish() {
        let bus = Arc::new(EventBus::new());
        let log = Log::default();
        bus.set_one_shot("boot", true);

        let inner_bus = Arc::clone(&bus);
        let inner_log = Arc::clone(&log);
        bus.subscribe_fn("boot", "spawner", move |v: &u32| {
            if *v == 1 {
                recorder(&inner_bus, "boot", "late", &inner_log);
            }
            Ok(())
        });

        assert_eq!(bus.publish("boot", &1).delivered(), 1);
        assert_eq!(bus.subscriber_count("boot"), 1);
        assert_eq!(bus.publish("boot", &2).delivered(), 1);
        assert_eq!(entries(&log), vec!["late:2"]);
        assert!(!bus.has_subscribers("boot"));
    }

    #[test]
    fn test_subscription_ids_are_unique_and_increasing() {
        let bus: EventBus<u32> = EventBus::new();
        let log = Log::default();
        let a = recorder(&bus, "t", "a", &log);
        let b = recorder(&bus, "u", "b", &log);

        assert!(b.as_u64() > a.as_u64());
        assert_eq!(a.to_string(), format!("sub#{}", a.as_u64()));
    }

    #[test]
    fn test_unsubscribe_all() {
        let bus = EventBus::new();
        let log = Log::default();
        recorder(&bus, "t", "a", &log);
        recorder(&bus, "t", "b", &log);
        recorder(&bus, "u", "c", &log);

        assert_eq!(bus.unsubscribe_all("t"), 2);
        assert_eq!(bus.unsubscribe_all("t"), 0);
        let _ = bus.publish("t", &1);
        let _ = bus.publish("u", &1);
        assert_eq!(entries(&log), vec!["c:1"]);
        assert_eq!(bus.topics(), vec!["u".to_string()]);
    }

    #[test]
    fn test_failures_do_not_halt_fan_out() {
        let bus = EventBus::new();
        let log = Log::default();
        recorder(&bus, "t", "a", &log);
        let bad = bus.subscribe_fn("t", "bad", |_: &u32| Err(SubscriberError::fail("disk full")));
        bus.subscribe_fn("t", "boom", |_: &u32| -> Result<(), SubscriberError> {
            panic!("boom")
        });
        recorder(&bus, "t", "d", &log);

        let report = bus.publish("t", &5);
        assert_eq!(report.delivered(), 2);
        assert_eq!(report.attempted(), 4);
        assert_eq!(entries(&log), vec!["a:5", "d:5"]);

        let failures = report.failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].id, bad);
        assert_eq!(failures[0].subscriber, "bad");
        assert_eq!(failures[0].as_label(), "subscriber_failed");
        assert!(failures[1].is_panic());
        assert_eq!(failures[1].kind, FailureKind::Panicked("boom".into()));

        let err = report.into_result().unwrap_err();
        assert_eq!(err.topic, "t");
        assert_eq!(err.failures.len(), 2);
    }

    #[test]
    #[should_panic(expected = "boom")]
    fn test_panics_propagate_when_not_caught() {
        let bus = EventBus::with_config(Config {
            catch_panics: false,
            ..Config::default()
        });
        bus.subscribe_fn("t", "boom", |_: &u32| -> Result<(), SubscriberError> {
            panic!("boom")
        });
        let _ = bus.publish("t", &1);
    }

    #[test]
    fn test_subscribe_during_publish_affects_next_publish_only() {
        let bus = Arc::new(EventBus::new());
        let log = Log::default();

        let inner_bus = Arc::clone(&bus);
        let inner_log = Arc::clone(&log);
        bus.subscribe_fn("t", "spawner", move |v: &u32| {
            if *v == 1 {
                recorder(&inner_bus, "t", "late", &inner_log);
            }
            Ok(())
        });

        assert_eq!(bus.publish("t", &1).delivered(), 1);
        assert!(entries(&log).is_empty());

        assert_eq!(bus.publish("t", &2).delivered(), 2);
        assert_eq!(entries(&log), vec!["late:2"]);
    }

    #[test]
    fn test_unsubscribe_during_publish_keeps_in_flight_snapshot() {
        let bus = Arc::new(EventBus::new());
        let log = Log::default();

        let victim_slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::default();
        let inner_bus = Arc::clone(&bus);
        let slot = Arc::clone(&victim_slot);
        bus.subscribe_fn("t", "remover", move |_: &u32| {
            if let Some(id) = *slot.lock().unwrap() {
                inner_bus.unsubscribe("t", id);
            }
            Ok(())
        });
        let victim = recorder(&bus, "t", "victim", &log);
        *victim_slot.lock().unwrap() = Some(victim);

        let _ = bus.publish("t", &1);
        let _ = bus.publish("t", &2);
        assert_eq!(entries(&log), vec!["victim:1"]);
    }

    #[test]
    fn test_nested_publish_uses_fresh_snapshot() {
        let bus = Arc::new(EventBus::new());
        let log = Log::default();

        let inner_bus = Arc::clone(&bus);
        bus.subscribe_fn("t", "echo", move |v: &u32| {
            if *v < 3 {
                let _ = inner_bus.publish("t", &(v + 1));
            }
            Ok(())
        });
        recorder(&bus, "t", "rec", &log);

        let _ = bus.publish("t", &1);
        assert_eq!(entries(&log), vec!["rec:3", "rec:2", "rec:1"]);
    }

    #[test]
    fn test_topics_are_isolated() {
        let bus = EventBus::new();
        let log = Log::default();
        recorder(&bus, "a", "x", &log);
        recorder(&bus, "b", "y", &log);

        let _ = bus.publish("a", &1);
        assert_eq!(entries(&log), vec!["x:1"]);
        assert_eq!(bus.subscriber_count("b"), 1);
        assert_eq!(bus.topics(), vec!["a".to_string(), "b".to_string()]);
    }
}
