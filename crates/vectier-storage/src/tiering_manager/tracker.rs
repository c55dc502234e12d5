use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use vectier_core::{Tier, VectorId};

/// Time source for heat bookkeeping.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by `Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests and simulations.
///
/// Clones share the same instant, so a test can keep one handle and give
/// another to the manager.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Move time forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock() = instant;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Access statistics for a stored vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRecord {
    pub vector_id: VectorId,
    /// Tier the vector currently occupies
    pub tier: Tier,
    /// Recency/frequency estimate in [0, 1]
    pub heat_score: f64,
    /// Store plus every retrieve
    pub total_accesses: u64,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    /// Instant up to which decay has already been applied
    pub last_decayed_at: DateTime<Utc>,
}

impl AccessRecord {
    fn fresh(vector_id: VectorId, now: DateTime<Utc>) -> Self {
        Self {
            vector_id,
            tier: Tier::Hot,
            heat_score: 1.0,
            total_accesses: 1,
            created_at: now,
            last_accessed_at: now,
            last_decayed_at: now,
        }
    }

    /// Halve heat once per `half_life_hours` of idle time not yet decayed.
    ///
    /// Returns true if the score changed.
    fn decay(&mut self, now: DateTime<Utc>, half_life_hours: f64) -> bool {
        let since = self.last_accessed_at.max(self.last_decayed_at);
        let elapsed_ms = (now - since).num_milliseconds();
        if elapsed_ms <= 0 {
            return false;
        }

        let elapsed_hours = elapsed_ms as f64 / 3_600_000.0;
        let before = self.heat_score;
        self.heat_score = (before * 0.5f64.powf(elapsed_hours / half_life_hours)).clamp(0.0, 1.0);
        self.last_decayed_at = now;
        self.heat_score != before
    }
}

/// In-memory access tracker
///
/// Holds one `AccessRecord` per stored vector and applies access boosts
/// and exponential heat decay.
#[derive(Debug, Default)]
pub struct AccessTracker {
    records: HashMap<VectorId, AccessRecord>,
}

impl AccessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or reset the record for a freshly stored vector.
    pub fn record_store(&mut self, vector_id: VectorId, now: DateTime<Utc>) -> &AccessRecord {
        let record = AccessRecord::fresh(vector_id.clone(), now);
        self.records
            .entry(vector_id)
            .and_modify(|existing| *existing = record.clone())
            .or_insert(record)
    }

    /// Record a retrieve: bump the counter and add `boost` heat (max 1.0).
    pub fn record_access(
        &mut self,
        vector_id: &str,
        now: DateTime<Utc>,
        boost: f64,
    ) -> Option<&AccessRecord> {
        let record = self.records.get_mut(vector_id)?;
        record.total_accesses += 1;
        record.last_accessed_at = now;
        record.heat_score = (record.heat_score + boost).clamp(0.0, 1.0);
        Some(record)
    }

    pub fn set_tier(&mut self, vector_id: &str, tier: Tier) {
        if let Some(record) = self.records.get_mut(vector_id) {
            record.tier = tier;
        }
    }

    /// Decay every record up to `now`. Returns how many scores changed.
    pub fn decay_all(&mut self, now: DateTime<Utc>, half_life_hours: f64) -> usize {
        self.records
            .values_mut()
            .map(|record| record.decay(now, half_life_hours))
            .filter(|changed| *changed)
            .count()
    }

    pub fn get(&self, vector_id: &str) -> Option<&AccessRecord> {
        self.records.get(vector_id)
    }

    pub fn remove(&mut self, vector_id: &str) -> Option<AccessRecord> {
        self.records.remove(vector_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccessRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_record_store() {
        let mut tracker = AccessTracker::new();
        let record = tracker.record_store(VectorId::new("a"), start());

        assert_eq!(record.heat_score, 1.0);
        assert_eq!(record.total_accesses, 1);
        assert_eq!(record.tier, Tier::Hot);
        assert_eq!(record.created_at, start());
    }

    #[test]
    fn test_multiple_accesses() {
        let mut tracker = AccessTracker::new();
        tracker.record_store(VectorId::new("a"), start());

        for _ in 0..3 {
            tracker.record_access("a", start(), 0.1).unwrap();
        }

        let record = tracker.get("a").unwrap();
        assert_eq!(record.total_accesses, 4);
        assert_eq!(record.heat_score, 1.0);
        assert!(tracker.record_access("missing", start(), 0.1).is_none());
    }

    #[test]
    fn test_restore_resets_record() {
        let mut tracker = AccessTracker::new();
        tracker.record_store(VectorId::new("a"), start());
        tracker.record_access("a", start(), 0.1);
        tracker.set_tier("a", Tier::Cool);

        let later = start() + Duration::hours(5);
        let record = tracker.record_store(VectorId::new("a"), later);
        assert_eq!(record.total_accesses, 1);
        assert_eq!(record.tier, Tier::Hot);
        assert_eq!(record.created_at, later);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_decay_half_life() {
        let mut tracker = AccessTracker::new();
        tracker.record_store(VectorId::new("a"), start());

        let changed = tracker.decay_all(start() + Duration::hours(24), 24.0);
        assert_eq!(changed, 1);
        assert!((tracker.get("a").unwrap().heat_score - 0.5).abs() < 1e-12);

        // Same instant again: already decayed
        assert_eq!(tracker.decay_all(start() + Duration::hours(24), 24.0), 0);
        assert!((tracker.get("a").unwrap().heat_score - 0.5).abs() < 1e-12);

        tracker.decay_all(start() + Duration::hours(48), 24.0);
        assert!((tracker.get("a").unwrap().heat_score - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_zero_elapsed_decay_is_noop() {
        let mut tracker = AccessTracker::new();
        tracker.record_store(VectorId::new("a"), start());
        assert_eq!(tracker.decay_all(start(), 24.0), 0);
        assert_eq!(tracker.get("a").unwrap().heat_score, 1.0);
    }

    #[test]
    fn test_access_boost_after_decay() {
        let mut tracker = AccessTracker::new();
        tracker.record_store(VectorId::new("a"), start());
        tracker.decay_all(start() + Duration::hours(24), 24.0);

        let record = tracker
            .record_access("a", start() + Duration::hours(24), 0.1)
            .unwrap();
        assert!((record.heat_score - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut tracker = AccessTracker::new();
        tracker.record_store(VectorId::new("a"), start());
        tracker.record_store(VectorId::new("b"), start());

        assert!(tracker.remove("a").is_some());
        assert!(tracker.remove("a").is_none());
        tracker.clear();
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new(start());
        let handle = clock.clone();
        handle.advance(Duration::minutes(90));
        assert_eq!(clock.now(), start() + Duration::minutes(90));

        clock.set(start());
        assert_eq!(handle.now(), start());
    }
}
