// src/novelty.rs
//! Which quakes in a snapshot have not been seen before?
//!
//! The detector remembers identities `(date, time, location)` and reports
//! each one at most once while it is remembered. The very first non-empty
//! snapshot only seeds the memory so a fresh start does not alert on the
//! whole listing. Memory is capped: once full, the oldest identities are
//! forgotten first, except those present in the snapshot being observed,
//! so a listing larger than the cap never re-alerts on itself.
//!
//! Reported events also carry a short-lived "fresh" marker for UI use;
//! it expires after the display window, independent of the memory.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use metrics::counter;

use crate::bulletin::types::{EarthquakeRecord, QuakeId};

#[derive(Debug, Clone, PartialEq)]
pub struct NoveltyEvent {
    pub record: EarthquakeRecord,
    pub detected_at: DateTime<Utc>,
}

impl NoveltyEvent {
    pub fn id(&self) -> QuakeId {
        self.record.id()
    }
}

#[derive(Debug, Clone)]
pub struct NoveltyDetector {
    seen: HashSet<QuakeId>,
    order: VecDeque<QuakeId>,
    capacity: usize,
    fresh_window: ChronoDuration,
    fresh: VecDeque<NoveltyEvent>,
}

impl NoveltyDetector {
    /// `capacity` of 0 is treated as 1.
    pub fn new(capacity: usize, fresh_window: ChronoDuration) -> Self {
        Self {
            seen: HashSet::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
            fresh_window,
            fresh: VecDeque::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(5_000, ChronoDuration::seconds(2))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn contains(&self, id: &QuakeId) -> bool {
        self.seen.contains(id)
    }

    /// Feed one snapshot; returns the records not seen before, in snapshot order.
    pub fn observe(&mut self, snapshot: &[EarthquakeRecord], now: DateTime<Utc>) -> Vec<NoveltyEvent> {
        self.prune_fresh(now);
        let current: HashSet<QuakeId> = snapshot.iter().map(EarthquakeRecord::id).collect();

        if self.seen.is_empty() {
            for r in snapshot {
                self.remember(r.id());
            }
            self.evict(&current);
            if !snapshot.is_empty() {
                tracing::debug!(target: "novelty", seeded = self.seen.len(), "novelty bootstrap");
            }
            return Vec::new();
        }

        let mut out = Vec::new();
        for r in snapshot {
            let id = r.id();
            if self.seen.contains(&id) {
                continue;
            }
            self.remember(id);
            let ev = NoveltyEvent {
                record: r.clone(),
                detected_at: now,
            };
            self.fresh.push_back(ev.clone());
            out.push(ev);
        }
        self.evict(&current);

        if !out.is_empty() {
            counter!("novelty_events_total").increment(out.len() as u64);
            tracing::info!(target: "novelty", new = out.len(), remembered = self.seen.len(), "new quakes");
        }
        out
    }

    /// Events still inside the display window at `now`. Expired ones are dropped.
    pub fn fresh(&mut self, now: DateTime<Utc>) -> Vec<NoveltyEvent> {
        self.prune_fresh(now);
        self.fresh.iter().cloned().collect()
    }

    /// Number of events currently held for the display window.
    pub fn fresh_len(&self) -> usize {
        self.fresh.len()
    }

    pub fn is_fresh(&self, id: &QuakeId, now: DateTime<Utc>) -> bool {
        self.fresh.iter().any(|ev| {
            now.signed_duration_since(ev.detected_at) < self.fresh_window && &ev.id() == id
        })
    }

    fn prune_fresh(&mut self, now: DateTime<Utc>) {
        while let Some(front) = self.fresh.front() {
            if now.signed_duration_since(front.detected_at) >= self.fresh_window {
                self.fresh.pop_front();
            } else {
                break;
            }
        }
    }

    fn remember(&mut self, id: QuakeId) {
        if self.seen.insert(id.clone()) {
            self.order.push_back(id);
        }
    }

    /// Drop oldest identities down to capacity; ids in `pinned` survive
    /// and keep their place in the queue.
    fn evict(&mut self, pinned: &HashSet<QuakeId>) {
        let mut kept = Vec::new();
        while self.order.len() + kept.len() > self.capacity {
            let Some(old) = self.order.pop_front() else {
                break;
            };
            if pinned.contains(&old) {
                kept.push(old);
            } else {
                self.seen.remove(&old);
            }
        }
        for id in kept.into_iter().rev() {
            self.order.push_front(id);
        }
    }
}

impl Default for NoveltyDetector {
    fn default() -> Self {
        Self::with_defaults()
    }
}
