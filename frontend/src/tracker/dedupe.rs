use std::cell::RefCell;
use std::collections::HashMap;

pub const DEDUPE_WINDOW_MS: u64 = 5000;

/// Once the map grows past this many keys, entries older than twice the
/// window are purged. A soft memory bound, not an LRU.
const CLEANUP_THRESHOLD: usize = 100;

/// Recency map keyed by `client_id:event_name:cta_id`. Session-scoped; a
/// page reload starts empty.
pub struct Deduplicator {
    window_ms: u64,
    recent: RefCell<HashMap<String, u64>>,
}

impl Deduplicator {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            recent: RefCell::new(HashMap::new()),
        }
    }

    /// True when a send for this key happened within the window. The stored
    /// timestamp is NOT refreshed on suppression, so a burst keeps being
    /// measured against its first occurrence rather than sliding.
    pub fn should_dedupe(&self, key: &str, now_ms: u64) -> bool {
        let mut recent = self.recent.borrow_mut();
        if let Some(&last_sent) = recent.get(key) {
            if now_ms.saturating_sub(last_sent) < self.window_ms {
                return true;
            }
        }
        recent.insert(key.to_string(), now_ms);
        if recent.len() > CLEANUP_THRESHOLD {
            let cutoff = self.window_ms * 2;
            recent.retain(|_, &mut sent_at| now_ms.saturating_sub(sent_at) <= cutoff);
        }
        false
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.recent.borrow().len()
    }
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(DEDUPE_WINDOW_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suppresses_repeats_within_the_window() {
        let dedupe = Deduplicator::default();
        assert!(!dedupe.should_dedupe("k", 1000));
        assert!(dedupe.should_dedupe("k", 1001));
        assert!(dedupe.should_dedupe("k", 5999));
        assert!(!dedupe.should_dedupe("k", 6000));
    }

    #[test]
    fn window_is_anchored_to_the_first_occurrence() {
        let dedupe = Deduplicator::default();
        assert!(!dedupe.should_dedupe("k", 0));
        // Each suppressed repeat must not push the window forward.
        assert!(dedupe.should_dedupe("k", 3000));
        assert!(dedupe.should_dedupe("k", 4500));
        assert!(!dedupe.should_dedupe("k", 5000));
    }

    #[test]
    fn distinct_keys_do_not_interfere() {
        let dedupe = Deduplicator::default();
        assert!(!dedupe.should_dedupe("a", 0));
        assert!(!dedupe.should_dedupe("b", 1));
    }

    #[test]
    fn cleanup_purges_stale_entries_past_the_threshold() {
        let dedupe = Deduplicator::default();
        for i in 0..101 {
            assert!(!dedupe.should_dedupe(&format!("old-{}", i), 0));
        }
        // All the "old" entries are now well past twice the window.
        assert!(!dedupe.should_dedupe("fresh", 100_000));
        assert_eq!(dedupe.len(), 1);
    }
}
