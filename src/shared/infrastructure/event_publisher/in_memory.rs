// In memory implementation of the EventPublisher port.
//
// Purpose
// - Let tests assert what was published, in which order, and what happens when the bus is down.

use crate::shared::infrastructure::event_publisher::{EventPublisher, PublishError};
use crate::shared::infrastructure::event_store::{AggregateKey, RecordedEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

pub struct InMemoryEventPublisher<Payload> {
    published: Mutex<Vec<(AggregateKey, RecordedEvent<Payload>)>>,
    is_offline: AtomicBool,
}

impl<Payload> Default for InMemoryEventPublisher<Payload> {
    fn default() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            is_offline: AtomicBool::new(false),
        }
    }
}

impl<Payload: Clone> InMemoryEventPublisher<Payload> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_offline(&self) {
        self.is_offline.fetch_xor(true, Ordering::SeqCst);
    }

    pub async fn published(&self) -> Vec<(AggregateKey, RecordedEvent<Payload>)> {
        self.published.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl<Payload> EventPublisher<Payload> for InMemoryEventPublisher<Payload>
where
    Payload: Clone + Send + Sync + 'static,
{
    async fn publish(
        &self,
        key: &AggregateKey,
        event: &RecordedEvent<Payload>,
    ) -> Result<(), PublishError> {
        if self.is_offline.load(Ordering::SeqCst) {
            return Err(PublishError::Unavailable("Event publisher offline".into()));
        }
        self.published
            .lock()
            .await
            .push((key.clone(), event.clone()));
        Ok(())
    }
}
