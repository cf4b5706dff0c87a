//! # LogWriter: bus event logger
//!
//! A minimal subscriber that logs every event it receives through `tracing`
//! at `INFO` level. Use it for tests, demos, or as a catch-all audit trail.
//!
//! ## Example output (with `tracing_subscriber::fmt`)
//! ```text
//! INFO dispatchkit::subscribers::log: event topic="order.paid" event=Order { id: 1 }
//! INFO dispatchkit::subscribers::log: event topic="order.shipped" event=Order { id: 1 }
//! ```

use std::fmt::Debug;

use crate::error::SubscriberError;
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl<E: Debug> Subscribe<E> for LogWriter {
    fn on_event(&self, topic: &str, event: &E) -> Result<(), SubscriberError> {
        tracing::info!(topic, ?event, "event");
        Ok(())
    }

    fn name(&self) -> &str {
        "LogWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_writer_never_fails() {
        let w = LogWriter::new();
        assert!(Subscribe::<u32>::on_event(&w, "t", &1).is_ok());
        assert_eq!(Subscribe::<u32>::name(&w), "LogWriter");
    }
}
