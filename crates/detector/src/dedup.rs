//! Suppresses re-emission of an unchanged opportunity.
//!
//! The engine runs on every state update, so an unmoved book would emit
//! the same record at feed cadence. Within the TTL a repeated content hash
//! is dropped; a changed price on either leg re-emits immediately.

use common::ArbitrageOpportunity;
use std::collections::HashSet;
use std::time::{Duration, Instant};

pub struct OpportunityDeduplicator {
    seen: HashSet<[u8; 32]>,
    last_pruned: Instant,
    ttl: Duration,
}

impl OpportunityDeduplicator {
    pub fn new(ttl: Duration) -> Self {
        Self {
            seen: HashSet::new(),
            last_pruned: Instant::now(),
            ttl,
        }
    }

    /// Checks if an opportunity is a duplicate. If not, it's added to the
    /// set. The whole set is cleared once the TTL elapses.
    pub fn is_duplicate(&mut self, opportunity: &ArbitrageOpportunity) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_pruned) > self.ttl {
            self.seen.clear();
            self.last_pruned = now;
        }

        let hash = opportunity.hash();
        if self.seen.contains(&hash) {
            true
        } else {
            self.seen.insert(hash);
            false
        }
    }
}
