//! # Bounded transition history.
//!
//! Keeps the last `Config::history_capacity` transitions of one machine,
//! each stamped with a monotonic sequence number (per machine, starting at 1).
//!
//! ```text
//! push(#5) ──► [#2 #3 #4] ─ full ─► evict #2 ──► [#3 #4 #5]
//! ```

use std::collections::VecDeque;

/// One recorded transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRecord {
    /// Sequence number within the machine (1-based, gap-free).
    pub seq: u64,
    /// Source state.
    pub from: String,
    /// Target state.
    pub to: String,
    /// Event label.
    pub event: String,
}

#[derive(Debug)]
pub(crate) struct History {
    records: VecDeque<TransitionRecord>,
    limit: Option<usize>,
    seq: u64,
}

impl History {
    pub(crate) fn new(limit: Option<usize>) -> Self {
        Self {
            records: VecDeque::with_capacity(limit.unwrap_or(0)),
            limit,
            seq: 0,
        }
    }

    /// Counts the transition; stores it only when history is enabled.
    pub(crate) fn record(&mut self, from: &str, to: &str, event: &str) {
        self.seq += 1;
        let Some(limit) = self.limit else {
            return;
        };
        if self.records.len() == limit {
            self.records.pop_front();
        }
        self.records.push_back(TransitionRecord {
            seq: self.seq,
            from: from.to_owned(),
            to: to.to_owned(),
            event: event.to_owned(),
        });
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    pub(crate) fn transitions(&self) -> u64 {
        self.seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest_first() {
        let mut h = History::new(Some(2));
        h.record("a", "b", "x");
        h.record("b", "c", "y");
        h.record("c", "a", "z");

        let seqs: Vec<u64> = h.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![2, 3]);
        assert_eq!(h.iter().next().map(|r| r.event.as_str()), Some("y"));
        assert_eq!(h.transitions(), 3);
    }

    #[test]
    fn test_disabled_still_counts() {
        let mut h = History::new(None);
        h.record("a", "b", "x");
        assert_eq!(h.iter().count(), 0);
        assert_eq!(h.transitions(), 1);
    }
}
