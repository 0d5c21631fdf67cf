//! Search input debouncing and response ordering.
//!
//! Keystrokes arrive faster than searches should be issued, and responses
//! can arrive out of order. Two counters keep both problems out of the
//! catalog:
//!
//! - an *epoch* incremented per keystroke. The debounce timer scheduled for
//!   a keystroke remembers its epoch; if newer input has bumped the epoch by
//!   the time the timer fires, the firing is stale and dispatches nothing.
//! - a *sequence* incremented per dispatched request. Only the response
//!   carrying the latest issued sequence may replace the catalog, so a slow
//!   response to an old query can never overwrite a newer result.
//!
//! The debouncer is pure bookkeeping; the caller owns the actual timers and
//! requests.

/// Debounce and ordering state for the search box.
#[derive(Debug, Default)]
pub struct SearchDebouncer {
    epoch: u64,
    pending: Option<String>,
    last_issued: u64,
}

impl SearchDebouncer {
    /// Create a debouncer with no pending input.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a keystroke and return the epoch to schedule its timer under.
    ///
    /// Empty text is a valid query (it asks for the full catalog).
    pub fn note_input(&mut self, text: impl Into<String>) -> u64 {
        self.epoch += 1;
        self.pending = Some(text.into());
        self.epoch
    }

    /// Handle a debounce timer firing for `epoch`.
    ///
    /// Returns the `(sequence, query)` to dispatch, or `None` when newer
    /// input has superseded the timer.
    pub fn timer_fired(&mut self, epoch: u64) -> Option<(u64, String)> {
        if epoch != self.epoch {
            return None;
        }
        let query = self.pending.take()?;
        self.last_issued += 1;
        Some((self.last_issued, query))
    }

    /// Whether a response for `sequence` is still the latest and may land.
    #[must_use]
    pub const fn is_latest(&self, sequence: u64) -> bool {
        sequence == self.last_issued
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_of_input_dispatches_once_for_final_text() {
        let mut debouncer = SearchDebouncer::new();
        let first = debouncer.note_input("s");
        let second = debouncer.note_input("sn");
        let third = debouncer.note_input("sneaker");

        // Timers for superseded keystrokes fire but dispatch nothing.
        assert_eq!(debouncer.timer_fired(first), None);
        assert_eq!(debouncer.timer_fired(second), None);

        let (sequence, query) = debouncer.timer_fired(third).unwrap();
        assert_eq!(sequence, 1);
        assert_eq!(query, "sneaker");
    }

    #[test]
    fn test_timer_dispatches_at_most_once_per_epoch() {
        let mut debouncer = SearchDebouncer::new();
        let epoch = debouncer.note_input("watch");

        assert!(debouncer.timer_fired(epoch).is_some());
        assert_eq!(debouncer.timer_fired(epoch), None);
    }

    #[test]
    fn test_empty_text_is_a_valid_query() {
        let mut debouncer = SearchDebouncer::new();
        let epoch = debouncer.note_input("");

        let (_, query) = debouncer.timer_fired(epoch).unwrap();
        assert_eq!(query, "");
    }

    #[test]
    fn test_only_latest_sequence_may_land() {
        let mut debouncer = SearchDebouncer::new();

        let epoch = debouncer.note_input("ph");
        let (first, _) = debouncer.timer_fired(epoch).unwrap();

        let epoch = debouncer.note_input("phone");
        let (second, _) = debouncer.timer_fired(epoch).unwrap();

        assert!(!debouncer.is_latest(first));
        assert!(debouncer.is_latest(second));
    }

    #[test]
    fn test_input_after_dispatch_starts_a_fresh_cycle() {
        let mut debouncer = SearchDebouncer::new();
        let epoch = debouncer.note_input("bag");
        debouncer.timer_fired(epoch).unwrap();

        let epoch = debouncer.note_input("bags");
        let (sequence, query) = debouncer.timer_fired(epoch).unwrap();
        assert_eq!(sequence, 2);
        assert_eq!(query, "bags");
    }
}
