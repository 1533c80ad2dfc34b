// Metrics registry port: where store gauges and counters are exported.
//
// Boundaries
// - The store owns the numbers. A registry only receives them, so the core never depends
//   on a specific telemetry backend.

use async_trait::async_trait;

pub mod facade;
pub mod in_memory;
pub mod recorder;

pub const AGGREGATES: &str = "eventing.aggregates";
pub const AGGREGATE_READS: &str = "eventing.aggregates.reads";
pub const AGGREGATE_WRITES: &str = "eventing.aggregates.writes";
pub const EVENTS: &str = "eventing.events";
pub const EVENT_READS: &str = "eventing.events.reads";
pub const EVENT_WRITES: &str = "eventing.events.writes";

#[async_trait]
pub trait MetricsRegistry: Send + Sync {
    async fn record_gauge(&self, name: &'static str, value: u64);

    /// Counters are reported as their absolute, monotonically increasing total.
    async fn record_counter(&self, name: &'static str, total: u64);
}
