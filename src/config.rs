//! # Shared configuration.
//!
//! Provides [`Config`] centralized settings for the three dispatch primitives.
//!
//! Config is used in three ways:
//! 1. **Event bus**: `EventBus::with_config(config)` (panic isolation)
//! 2. **Handler chain**: `HandlerChain::with_config(config)` (suspension limit)
//! 3. **State machine**: `StateMachine::builder(initial).with_config(config)` (history)
//!
//! ## Sentinel values
//! - `max_pending = 0` → unlimited suspended dispatches per chain
//! - `history_capacity = 0` → transition history disabled
//!
//! # Example
//! ```
//! use dispatchkit::Config;
//!
//! let mut cfg = Config::default();
//! cfg.max_pending = 4;
//! cfg.history_capacity = 0;
//!
//! assert_eq!(cfg.pending_limit(), Some(4));
//! assert_eq!(cfg.history_limit(), None);
//! ```

/// Configuration shared by [`EventBus`](crate::EventBus),
/// [`HandlerChain`](crate::HandlerChain) and [`StateMachine`](crate::StateMachine).
///
/// ## Field semantics
/// - `max_pending`: Suspended dispatches a chain may hold at once (`0` = unlimited)
/// - `catch_panics`: Report subscriber panics as publish failures instead of unwinding
/// - `history_capacity`: Transitions remembered per state machine (`0` = none)
///
/// ## Notes
/// All fields are public for flexibility. Prefer using helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of dispatches a single chain keeps suspended.
    ///
    /// - `0` = unlimited
    /// - `n > 0` = the `n + 1`-th concurrent `Cx::defer` fails with
    ///   `ChainError::PendingLimit`
    pub max_pending: usize,

    /// Whether the event bus isolates subscriber panics.
    ///
    /// When `true`, a panicking subscriber is recorded as a
    /// `FailureKind::Panicked` failure and delivery continues with the next
    /// subscriber. When `false`, the panic unwinds into the publisher.
    pub catch_panics: bool,

    /// Number of recent transitions a state machine keeps.
    ///
    /// Oldest entries are evicted first. `0` disables history.
    pub history_capacity: usize,
}

impl Config {
    /// Returns the suspension limit as an `Option`.
    ///
    /// - `None` → unlimited
    /// - `Some(n)` → at most `n` suspended dispatches per chain
    #[inline]
    pub fn pending_limit(&self) -> Option<usize> {
        if self.max_pending == 0 {
            None
        } else {
            Some(self.max_pending)
        }
    }

    /// Returns the history capacity as an `Option`.
    ///
    /// - `None` → history disabled
    /// - `Some(n)` → the last `n` transitions are kept
    #[inline]
    pub fn history_limit(&self) -> Option<usize> {
        if self.history_capacity == 0 {
            None
        } else {
            Some(self.history_capacity)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `max_pending = 0` (unlimited)
    /// - `catch_panics = true` (fail-soft fan-out)
    /// - `history_capacity = 32`
    fn default() -> Self {
        Self {
            max_pending: 0,
            catch_panics: true,
            history_capacity: 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sentinels() {
        let cfg = Config::default();
        assert_eq!(cfg.pending_limit(), None);
        assert_eq!(cfg.history_limit(), Some(32));
        assert!(cfg.catch_panics);
    }

    #[test]
    fn test_zero_history_disables() {
        let cfg = Config {
            history_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.history_limit(), None);
    }
}
