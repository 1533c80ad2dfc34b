// Operation counters owned by the store, read by the telemetry recorder.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct StoreCounters {
    aggregate_reads: AtomicU64,
    aggregate_writes: AtomicU64,
    event_reads: AtomicU64,
    event_writes: AtomicU64,
    live_events: AtomicU64,
}

impl StoreCounters {
    pub fn record_lookup(&self) {
        self.aggregate_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_read(&self, events: usize) {
        self.event_reads.fetch_add(events as u64, Ordering::Relaxed);
    }

    pub fn record_write(&self, events: usize) {
        self.aggregate_writes.fetch_add(1, Ordering::Relaxed);
        self.event_writes.fetch_add(events as u64, Ordering::Relaxed);
        self.live_events.fetch_add(events as u64, Ordering::Relaxed);
    }

    pub fn record_eviction(&self, events: usize) {
        self.live_events.fetch_sub(events as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self, aggregates: usize) -> StoreStats {
        StoreStats {
            aggregates: aggregates as u64,
            events: self.live_events.load(Ordering::Relaxed),
            aggregate_reads: self.aggregate_reads.load(Ordering::Relaxed),
            aggregate_writes: self.aggregate_writes.load(Ordering::Relaxed),
            event_reads: self.event_reads.load(Ordering::Relaxed),
            event_writes: self.event_writes.load(Ordering::Relaxed),
        }
    }
}

/// Point in time view of the store. Gauges first, monotonic counters after.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub aggregates: u64,
    pub events: u64,
    pub aggregate_reads: u64,
    pub aggregate_writes: u64,
    pub event_reads: u64,
    pub event_writes: u64,
}
