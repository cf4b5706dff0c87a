//! # Function-backed subscriber (`SubscriberFn`)
//!
//! [`SubscriberFn`] wraps a closure `F: Fn(&E) -> Result<(), SubscriberError>`
//! together with a name, so plain closures can be registered on a bus.
//!
//! ## Concurrency semantics
//! - The closure is `Fn`, not `FnMut`: state it mutates must live behind an
//!   explicit `Arc<Atomic*>` / `Arc<Mutex<_>>` captured by the closure.
//!
//! ## Example
//! ```rust
//! use dispatchkit::{Subscribe, SubscriberFn, SubscriberRef, SubscriberError};
//!
//! let s: SubscriberRef<String> = SubscriberFn::arc("printer", |msg: &String| {
//!     println!("{msg}");
//!     Ok::<_, SubscriberError>(())
//! });
//!
//! assert_eq!(s.name(), "printer");
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use crate::error::SubscriberError;
use crate::subscribers::Subscribe;

/// Shared handle to a subscriber (`Arc<dyn Subscribe<E>>`).
pub type SubscriberRef<E> = Arc<dyn Subscribe<E>>;

/// Function-backed subscriber implementation.
#[derive(Debug)]
pub struct SubscriberFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> SubscriberFn<F> {
    /// Creates a new function-backed subscriber.
    ///
    /// Prefer [`SubscriberFn::arc`] when you immediately need a shared handle.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the subscriber and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<E, F> Subscribe<E> for SubscriberFn<F>
where
    F: Fn(&E) -> Result<(), SubscriberError> + Send + Sync + 'static,
{
    fn on_event(&self, _topic: &str, event: &E) -> Result<(), SubscriberError> {
        (self.f)(event)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
