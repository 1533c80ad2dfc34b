// Background workers owned by the composition root.
//
// Responsibilities
// - Eviction runner: one eviction pass per cleanup interval, when configured and the
//   store has an eviction policy.
// - Telemetry recorder: push gauges and counters to the registry per metrics interval.
//
// Shutdown
// - shutdown() stops scheduling further runs and waits for an in flight run to finish.

use crate::shared::infrastructure::event_store::in_memory::InMemoryEventStore;
use crate::shared::infrastructure::metrics_registry::MetricsRegistry;
use crate::shared::infrastructure::metrics_registry::recorder::TelemetryRecorder;
use crate::shell::config::StoreConfig;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

pub struct BackgroundWorkers {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundWorkers {
    pub fn spawn<Payload>(
        store: Arc<InMemoryEventStore<Payload>>,
        registry: Arc<dyn MetricsRegistry>,
        config: &StoreConfig,
    ) -> Self
    where
        Payload: Clone + Send + Sync + 'static,
    {
        let (shutdown, _) = watch::channel(false);
        let mut handles = Vec::new();

        let evicts = !store.eviction_policy().is_disabled();
        if let Some(period) = config.cleanup_interval.filter(|_| evicts) {
            let store = store.clone();
            handles.push(spawn_periodic(
                "eviction",
                period,
                shutdown.subscribe(),
                move || {
                    let store = store.clone();
                    async move {
                        store.evict().await;
                    }
                },
            ));
        }

        let recorder = TelemetryRecorder::new(store, registry);
        handles.push(spawn_periodic(
            "telemetry",
            config.metrics_interval,
            shutdown.subscribe(),
            move || {
                let recorder = recorder.clone();
                async move {
                    recorder.record().await;
                }
            },
        ));

        Self { shutdown, handles }
    }

    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    pub async fn shutdown(self) {
        // Err only means every worker already exited.
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            if let Err(error) = handle.await {
                warn!(%error, "background worker ended abnormally");
            }
        }
    }
}

fn spawn_periodic<Job, Run>(
    name: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut job: Job,
) -> JoinHandle<()>
where
    Job: FnMut() -> Run + Send + 'static,
    Run: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; runs start one period after spawn.
        ticker.tick().await;
        info!(worker = name, period_ms = period.as_millis() as u64, "worker started");

        loop {
            tokio::select! {
                _ = ticker.tick() => job().await,
                _ = shutdown.changed() => break,
            }
        }

        info!(worker = name, "worker stopped");
    })
}

#[cfg(test)]
mod background_workers_tests {
    use super::*;
    use crate::shared::core::clock::ManualClock;
    use crate::shared::infrastructure::event_store::eviction::EvictionPolicy;
    use crate::shared::infrastructure::event_store::{EventStore, EventStoreError};
    use crate::shared::infrastructure::metrics_registry::in_memory::{
        InMemoryMetricsRegistry, MetricValue,
    };
    use crate::shared::infrastructure::metrics_registry::{AGGREGATES, EVENT_WRITES};
    use crate::tests::fixtures::{DomainEvent, START_MILLIS, domain_events};
    use rstest::rstest;

    fn config(cleanup_ms: Option<u64>) -> StoreConfig {
        StoreConfig {
            max_aggregate_age: Some(Duration::from_secs(60)),
            cleanup_interval: cleanup_ms.map(Duration::from_millis),
            metrics_interval: Duration::from_millis(1_000),
            ..StoreConfig::default()
        }
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn it_should_record_telemetry_every_interval() {
        let store = Arc::new(InMemoryEventStore::<DomainEvent>::new());
        let registry = Arc::new(InMemoryMetricsRegistry::new());
        let workers = BackgroundWorkers::spawn(store.clone(), registry.clone(), &config(None));
        assert_eq!(workers.worker_count(), 1);

        store
            .save("serverGroup", "asg-1", 0, domain_events(&["e1", "e2"]))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1_500)).await;

        assert_eq!(registry.get(AGGREGATES).await, Some(MetricValue::Gauge(1)));
        assert_eq!(
            registry.get(EVENT_WRITES).await,
            Some(MetricValue::Counter(2))
        );
        workers.shutdown().await;
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn it_should_evict_stale_aggregates_on_the_cleanup_interval() {
        let clock = Arc::new(ManualClock::new(START_MILLIS));
        let store_config = config(Some(500));
        let store = Arc::new(
            InMemoryEventStore::<DomainEvent>::new()
                .with_clock(clock.clone())
                .with_eviction_policy(store_config.eviction_policy()),
        );
        let workers = BackgroundWorkers::spawn(
            store.clone(),
            Arc::new(InMemoryMetricsRegistry::new()),
            &store_config,
        );
        assert_eq!(workers.worker_count(), 2);

        store
            .save("serverGroup", "asg-1", 0, domain_events(&["e1"]))
            .await
            .unwrap();
        clock.advance(Duration::from_secs(61));
        tokio::time::sleep(Duration::from_millis(750)).await;

        assert!(matches!(
            store.list("serverGroup", "asg-1").await,
            Err(EventStoreError::AggregateNotFound { .. })
        ));
        workers.shutdown().await;
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn it_should_stop_recording_after_shutdown() {
        let store = Arc::new(InMemoryEventStore::<DomainEvent>::new());
        let registry = Arc::new(InMemoryMetricsRegistry::new());
        let workers = BackgroundWorkers::spawn(store, registry.clone(), &config(None));

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        workers.shutdown().await;
        let recorded = registry.recordings().await;
        assert!(recorded > 0);

        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(registry.recordings().await, recorded);
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn it_should_keep_fresh_aggregates_on_the_cleanup_interval() {
        let clock = Arc::new(ManualClock::new(START_MILLIS));
        let store = Arc::new(
            InMemoryEventStore::<DomainEvent>::new()
                .with_clock(clock.clone())
                .with_eviction_policy(EvictionPolicy::disabled().with_max_age(Duration::from_secs(60))),
        );
        let workers = BackgroundWorkers::spawn(
            store.clone(),
            Arc::new(InMemoryMetricsRegistry::new()),
            &config(Some(500)),
        );

        store
            .save("serverGroup", "asg-1", 0, domain_events(&["e1"]))
            .await
            .unwrap();
        clock.advance(Duration::from_secs(10));
        tokio::time::sleep(Duration::from_millis(750)).await;

        assert_eq!(store.list("serverGroup", "asg-1").await.unwrap().len(), 1);
        workers.shutdown().await;
    }

    #[rstest]
    #[tokio::test(start_paused = true)]
    async fn it_should_skip_the_eviction_worker_when_the_store_never_evicts() {
        let store = Arc::new(InMemoryEventStore::<DomainEvent>::new());
        let workers = BackgroundWorkers::spawn(
            store,
            Arc::new(InMemoryMetricsRegistry::new()),
            &config(Some(500)),
        );
        assert_eq!(workers.worker_count(), 1);
        workers.shutdown().await;
    }
}
