// MetricsRegistry backed by the `metrics` facade. Whatever exporter the host process installs
// (Prometheus, statsd, ...) receives the store metrics; without one the calls are no-ops.

use crate::shared::infrastructure::metrics_registry::{
    AGGREGATE_READS, AGGREGATE_WRITES, AGGREGATES, EVENT_READS, EVENT_WRITES, EVENTS,
    MetricsRegistry,
};
use metrics::{counter, describe_counter, describe_gauge, gauge};

#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsFacadeRegistry;

impl MetricsFacadeRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Register descriptions with the installed recorder. Call once at startup.
    pub fn describe(&self) {
        describe_gauge!(AGGREGATES, "Number of aggregates held in the index");
        describe_gauge!(EVENTS, "Number of events held across all aggregate logs");
        describe_counter!(AGGREGATE_READS, "Total aggregate lookups");
        describe_counter!(AGGREGATE_WRITES, "Total successful aggregate saves");
        describe_counter!(EVENT_READS, "Total events returned by list");
        describe_counter!(EVENT_WRITES, "Total events committed");
    }
}

#[async_trait::async_trait]
impl MetricsRegistry for MetricsFacadeRegistry {
    async fn record_gauge(&self, name: &'static str, value: u64) {
        gauge!(name).set(value as f64);
    }

    async fn record_counter(&self, name: &'static str, total: u64) {
        counter!(name).absolute(total);
    }
}
