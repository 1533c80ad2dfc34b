// Telemetry recorder: push the store's gauges and counters into a metrics registry.
// Driven periodically by the telemetry worker in shell::workers.

use crate::shared::infrastructure::event_store::counters::StoreStats;
use crate::shared::infrastructure::event_store::in_memory::InMemoryEventStore;
use crate::shared::infrastructure::metrics_registry::{
    AGGREGATE_READS, AGGREGATE_WRITES, AGGREGATES, EVENT_READS, EVENT_WRITES, EVENTS,
    MetricsRegistry,
};
use std::sync::Arc;

pub struct TelemetryRecorder<Payload: Clone + Send + Sync + 'static> {
    store: Arc<InMemoryEventStore<Payload>>,
    registry: Arc<dyn MetricsRegistry>,
}

impl<Payload: Clone + Send + Sync + 'static> Clone for TelemetryRecorder<Payload> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            registry: self.registry.clone(),
        }
    }
}

impl<Payload: Clone + Send + Sync + 'static> TelemetryRecorder<Payload> {
    pub fn new(store: Arc<InMemoryEventStore<Payload>>, registry: Arc<dyn MetricsRegistry>) -> Self {
        Self { store, registry }
    }

    pub async fn record(&self) -> StoreStats {
        let stats = self.store.stats().await;
        self.registry.record_gauge(AGGREGATES, stats.aggregates).await;
        self.registry.record_gauge(EVENTS, stats.events).await;
        self.registry
            .record_counter(AGGREGATE_READS, stats.aggregate_reads)
            .await;
        self.registry
            .record_counter(AGGREGATE_WRITES, stats.aggregate_writes)
            .await;
        self.registry
            .record_counter(EVENT_READS, stats.event_reads)
            .await;
        self.registry
            .record_counter(EVENT_WRITES, stats.event_writes)
            .await;
        stats
    }
}

#[cfg(test)]
mod telemetry_recorder_tests {
    use super::*;
    use crate::shared::infrastructure::event_store::EventStore;
    use crate::shared::infrastructure::metrics_registry::in_memory::{
        InMemoryMetricsRegistry, MetricValue,
    };
    use crate::tests::fixtures::{DomainEvent, domain_events};
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn it_should_export_index_size_and_operation_counts() {
        let store = Arc::new(InMemoryEventStore::<DomainEvent>::new());
        let registry = Arc::new(InMemoryMetricsRegistry::new());
        let recorder = TelemetryRecorder::new(store.clone(), registry.clone());

        store
            .save("serverGroup", "asg-1", 0, domain_events(&["e1", "e2"]))
            .await
            .unwrap();
        store
            .save("serverGroup", "asg-2", 0, domain_events(&["e3"]))
            .await
            .unwrap();
        store.list("serverGroup", "asg-1").await.unwrap();

        let stats = recorder.record().await;

        assert_eq!(stats.aggregates, 2);
        assert_eq!(registry.get(AGGREGATES).await, Some(MetricValue::Gauge(2)));
        assert_eq!(registry.get(EVENTS).await, Some(MetricValue::Gauge(3)));
        assert_eq!(
            registry.get(AGGREGATE_READS).await,
            Some(MetricValue::Counter(3))
        );
        assert_eq!(
            registry.get(AGGREGATE_WRITES).await,
            Some(MetricValue::Counter(2))
        );
        assert_eq!(registry.get(EVENT_READS).await, Some(MetricValue::Counter(2)));
        assert_eq!(
            registry.get(EVENT_WRITES).await,
            Some(MetricValue::Counter(3))
        );
    }
}
