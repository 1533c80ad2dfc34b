// Aggregate index: (type, id) -> slot owning the version and the ordered event log.
//
// Locking
// - The map sits behind one RwLock. Structural changes (insert, evict) take it exclusively.
// - Each slot has its own RwLock. save holds it exclusively for check + append + bump.
// - Lock order is index then slot, and the index guard is never held while awaiting a slot.
//   Eviction only try-locks slots, so a busy slot is skipped rather than waited on.
// - A removed slot is flagged evicted so holders of a stale Arc fail with not found.

use crate::shared::infrastructure::event_store::eviction::{
    EvictionCandidate, EvictionPolicy, EvictionReport,
};
use crate::shared::infrastructure::event_store::{AggregateKey, EventStoreError, RecordedEvent};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

pub(crate) struct AggregateLog<P> {
    pub version: i64,
    pub events: Vec<RecordedEvent<P>>,
    pub last_activity_at: i64,
    pub activity_seq: u64,
    pub evicted: bool,
}

impl<P: Clone> AggregateLog<P> {
    fn new(created_at: i64, activity_seq: u64) -> Self {
        Self {
            version: 0,
            events: Vec::new(),
            last_activity_at: created_at,
            activity_seq,
            evicted: false,
        }
    }

    pub fn last_event_at(&self) -> Option<i64> {
        self.events.last().map(|e| e.metadata.timestamp)
    }

    /// Version guard: the caller must have seen exactly the stored version.
    pub fn ensure_version(
        &self,
        key: &AggregateKey,
        originating_version: i64,
    ) -> Result<(), EventStoreError> {
        if self.version != originating_version {
            return Err(EventStoreError::ConcurrencyConflict {
                key: key.clone(),
                stored: self.version,
                claimed: originating_version,
            });
        }
        Ok(())
    }

    pub fn commit(&mut self, batch: &[RecordedEvent<P>], at: i64, activity_seq: u64) {
        if batch.is_empty() {
            return;
        }
        self.events.extend_from_slice(batch);
        self.version += batch.len() as i64;
        self.last_activity_at = at;
        self.activity_seq = activity_seq;
    }

    pub fn ensure_consistent(&self, key: &AggregateKey) -> Result<(), EventStoreError> {
        if self.events.len() as i64 != self.version {
            return Err(EventStoreError::InternalConsistency {
                key: key.clone(),
                reason: format!(
                    "version {} does not match {} logged events",
                    self.version,
                    self.events.len()
                ),
            });
        }
        let out_of_order = self
            .events
            .iter()
            .enumerate()
            .find(|(position, e)| e.metadata.sequence != *position as i64 + 1);
        if let Some((position, event)) = out_of_order {
            return Err(EventStoreError::InternalConsistency {
                key: key.clone(),
                reason: format!(
                    "event at position {position} carries sequence {}",
                    event.metadata.sequence
                ),
            });
        }
        Ok(())
    }
}

pub(crate) struct AggregateSlot<P> {
    pub key: AggregateKey,
    pub log: RwLock<AggregateLog<P>>,
}

pub(crate) struct AggregateIndex<P> {
    slots: RwLock<HashMap<AggregateKey, Arc<AggregateSlot<P>>>>,
    activity: AtomicU64,
}

impl<P: Clone + Send + Sync + 'static> AggregateIndex<P> {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            activity: AtomicU64::new(0),
        }
    }

    pub fn next_activity(&self) -> u64 {
        self.activity.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn find(&self, key: &AggregateKey) -> Option<Arc<AggregateSlot<P>>> {
        self.slots.read().await.get(key).cloned()
    }

    pub async fn find_or_create(
        &self,
        key: &AggregateKey,
        originating_version: Option<i64>,
        now: i64,
    ) -> Result<Arc<AggregateSlot<P>>, EventStoreError> {
        if let Some(slot) = self.find(key).await {
            return Ok(slot);
        }

        let mut slots = self.slots.write().await;
        // Another caller may have created it between the two guards.
        if let Some(slot) = slots.get(key) {
            return Ok(slot.clone());
        }
        if let Some(claimed) = originating_version.filter(|v| *v > 0) {
            return Err(EventStoreError::InvalidOriginatingVersion {
                key: key.clone(),
                claimed,
            });
        }

        let slot = Arc::new(AggregateSlot {
            key: key.clone(),
            log: RwLock::new(AggregateLog::new(now, self.next_activity())),
        });
        slots.insert(key.clone(), slot.clone());
        Ok(slot)
    }

    /// Apply the policy and remove the selected aggregates one at a time.
    /// Returns the report and the number of events dropped with them.
    pub async fn evict(&self, policy: &EvictionPolicy, now: i64) -> (EvictionReport, usize) {
        let mut slots = self.slots.write().await;

        let candidates: Vec<EvictionCandidate> = slots
            .values()
            .map(|slot| match slot.log.try_read() {
                Ok(log) => EvictionCandidate {
                    key: slot.key.clone(),
                    last_event_at: log.last_event_at(),
                    last_activity_at: log.last_activity_at,
                    activity_seq: log.activity_seq,
                },
                Err(_) => EvictionCandidate::busy(slot.key.clone()),
            })
            .collect();
        let observed: HashMap<AggregateKey, u64> = candidates
            .iter()
            .map(|c| (c.key.clone(), c.activity_seq))
            .collect();

        let plan = policy.plan(now, candidates);
        let mut report = EvictionReport::default();
        let mut dropped_events = 0;

        for key in &plan.by_age {
            if let Some(events) = remove_slot(&mut slots, key, observed.get(key).copied()) {
                report.by_age += 1;
                dropped_events += events;
            }
        }
        for key in &plan.by_count {
            if let Some(events) = remove_slot(&mut slots, key, observed.get(key).copied()) {
                report.by_count += 1;
                dropped_events += events;
            }
        }

        (report, dropped_events)
    }
}

// Skips the slot when a writer holds it or committed since it was ranked.
fn remove_slot<P>(
    slots: &mut HashMap<AggregateKey, Arc<AggregateSlot<P>>>,
    key: &AggregateKey,
    observed_activity: Option<u64>,
) -> Option<usize> {
    let dropped = {
        let slot = slots.get(key)?;
        let mut log = slot.log.try_write().ok()?;
        if Some(log.activity_seq) != observed_activity {
            return None;
        }
        log.evicted = true;
        std::mem::take(&mut log.events).len()
    };
    slots.remove(key);
    Some(dropped)
}
