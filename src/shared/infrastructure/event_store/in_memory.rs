// In memory implementation of the EventStore port.
//
// Purpose
// - Hold every aggregate and its ordered event log for the lifetime of the process.
//
// Responsibilities
// - Enforce optimistic concurrency by checking the originating version under the aggregate lock.
// - Stamp sequence, timestamp and event id at commit time.
// - Publish committed events after they are visible, best effort.
// - Keep the index bounded with the configured eviction policy, inline after every save
//   and on demand from the eviction worker.
// - Count lookups, saves and events for the telemetry recorder.

use crate::shared::core::clock::{Clock, SystemClock};
use crate::shared::infrastructure::event_publisher::EventPublisher;
use crate::shared::infrastructure::event_store::counters::{StoreCounters, StoreStats};
use crate::shared::infrastructure::event_store::eviction::{EvictionPolicy, EvictionReport};
use crate::shared::infrastructure::event_store::index::{AggregateIndex, AggregateSlot};
use crate::shared::infrastructure::event_store::{
    AggregateKey, EventMetadata, EventStore, EventStoreError, RecordedEvent,
};
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

pub struct InMemoryEventStore<Payload: Clone + Send + Sync + 'static> {
    index: AggregateIndex<Payload>,
    counters: StoreCounters,
    policy: EvictionPolicy,
    clock: Arc<dyn Clock>,
    publisher: Option<Arc<dyn EventPublisher<Payload>>>,
}

impl<Payload: Clone + Send + Sync + 'static> Default for InMemoryEventStore<Payload> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Payload: Clone + Send + Sync + 'static> InMemoryEventStore<Payload> {
    pub fn new() -> Self {
        Self {
            index: AggregateIndex::new(),
            counters: StoreCounters::default(),
            policy: EvictionPolicy::disabled(),
            clock: Arc::new(SystemClock),
            publisher: None,
        }
    }

    pub fn with_eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher<Payload>>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn eviction_policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Current version of an existing aggregate, for callers re-reading after a conflict.
    pub async fn version(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
    ) -> Result<i64, EventStoreError> {
        let key = AggregateKey::new(aggregate_type, aggregate_id);
        let slot = self.lookup(&key).await?;
        let log = slot.log.read().await;
        if log.evicted {
            return Err(EventStoreError::AggregateNotFound { key });
        }
        Ok(log.version)
    }

    pub async fn stats(&self) -> StoreStats {
        self.counters.snapshot(self.index.len().await)
    }

    /// One eviction pass with the configured policy. A no-op when the policy is disabled.
    pub async fn evict(&self) -> EvictionReport {
        if self.policy.is_disabled() {
            return EvictionReport::default();
        }
        let now = self.clock.now_millis();
        let (report, dropped_events) = self.index.evict(&self.policy, now).await;
        self.counters.record_eviction(dropped_events);
        if report.total() > 0 {
            debug!(
                by_age = report.by_age,
                by_count = report.by_count,
                dropped_events,
                "evicted aggregates"
            );
        }
        report
    }

    async fn lookup(
        &self,
        key: &AggregateKey,
    ) -> Result<Arc<AggregateSlot<Payload>>, EventStoreError> {
        self.counters.record_lookup();
        self.index
            .find(key)
            .await
            .ok_or_else(|| EventStoreError::AggregateNotFound { key: key.clone() })
    }

    async fn lookup_or_create(
        &self,
        key: &AggregateKey,
        originating_version: i64,
    ) -> Result<Arc<AggregateSlot<Payload>>, EventStoreError> {
        self.counters.record_lookup();
        self.index
            .find_or_create(key, Some(originating_version), self.clock.now_millis())
            .await
    }

    async fn publish(&self, key: &AggregateKey, committed: &[RecordedEvent<Payload>]) {
        let Some(publisher) = &self.publisher else {
            return;
        };
        for event in committed {
            if let Err(error) = publisher.publish(key, event).await {
                warn!(
                    aggregate = %key,
                    sequence = event.metadata.sequence,
                    %error,
                    "failed to publish committed event"
                );
            }
        }
    }

    async fn append_to(
        &self,
        key: &AggregateKey,
        slot: &AggregateSlot<Payload>,
        originating_version: i64,
        events: Vec<Payload>,
    ) -> Result<(), EventStoreError> {
        let mut log = slot.log.write().await;
        if log.evicted {
            return Err(EventStoreError::AggregateNotFound { key: key.clone() });
        }
        log.ensure_version(key, originating_version)?;

        let now = self.clock.now_millis();
        let committed: Vec<RecordedEvent<Payload>> = events
            .into_iter()
            .enumerate()
            .map(|(position, payload)| RecordedEvent {
                metadata: EventMetadata {
                    event_id: Uuid::now_v7(),
                    sequence: log.version + position as i64 + 1,
                    timestamp: now,
                },
                payload,
            })
            .collect();
        let activity_seq = self.index.next_activity();
        log.commit(&committed, now, activity_seq);
        self.counters.record_write(committed.len());

        debug!(
            aggregate = %key,
            originating_version,
            committed = committed.len(),
            "events committed"
        );

        // The next writer waits until this batch is published; readers do not.
        let log = log.downgrade();
        self.publish(key, &committed).await;
        drop(log);
        Ok(())
    }

    async fn read_from(
        &self,
        key: &AggregateKey,
        slot: &AggregateSlot<Payload>,
    ) -> Result<Vec<RecordedEvent<Payload>>, EventStoreError> {
        let events = {
            let log = slot.log.read().await;
            if log.evicted {
                return Err(EventStoreError::AggregateNotFound { key: key.clone() });
            }
            if let Err(violation) = log.ensure_consistent(key) {
                error!(aggregate = %key, error = %violation, "event log is corrupt");
                return Err(violation);
            }
            log.events.clone()
        };

        self.counters.record_read(events.len());
        Ok(events)
    }
}

#[async_trait::async_trait]
impl<Payload> EventStore<Payload> for InMemoryEventStore<Payload>
where
    Payload: Clone + Send + Sync + 'static,
{
    async fn save(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        originating_version: i64,
        events: Vec<Payload>,
    ) -> Result<(), EventStoreError> {
        let key = AggregateKey::new(aggregate_type, aggregate_id);
        let slot = self.lookup_or_create(&key, originating_version).await?;
        self.append_to(&key, &slot, originating_version, events)
            .await?;
        self.evict().await;
        Ok(())
    }

    async fn list(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
    ) -> Result<Vec<RecordedEvent<Payload>>, EventStoreError> {
        let key = AggregateKey::new(aggregate_type, aggregate_id);
        let slot = self.lookup(&key).await?;
        self.read_from(&key, &slot).await
    }
}
