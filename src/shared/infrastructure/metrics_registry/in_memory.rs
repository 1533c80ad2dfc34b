// In memory implementation of the MetricsRegistry port, for tests and local inspection.

use crate::shared::infrastructure::metrics_registry::MetricsRegistry;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricValue {
    Gauge(u64),
    Counter(u64),
}

#[derive(Default)]
pub struct InMemoryMetricsRegistry {
    values: RwLock<HashMap<&'static str, MetricValue>>,
    recordings: RwLock<u64>,
}

impl InMemoryMetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, name: &str) -> Option<MetricValue> {
        self.values.read().await.get(name).copied()
    }

    pub async fn recordings(&self) -> u64 {
        *self.recordings.read().await
    }

    async fn put(&self, name: &'static str, value: MetricValue) {
        self.values.write().await.insert(name, value);
        *self.recordings.write().await += 1;
    }
}

#[async_trait::async_trait]
impl MetricsRegistry for InMemoryMetricsRegistry {
    async fn record_gauge(&self, name: &'static str, value: u64) {
        self.put(name, MetricValue::Gauge(value)).await;
    }

    async fn record_counter(&self, name: &'static str, total: u64) {
        self.put(name, MetricValue::Counter(total)).await;
    }
}
