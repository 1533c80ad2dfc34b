// Event publisher port: hand committed events to downstream subscribers.
//
// Boundaries
// - The bus itself lives outside the store. The store publishes after the commit is visible
//   and never rolls back on a publish failure, so delivery is at least once from its side.

use crate::shared::infrastructure::event_store::{AggregateKey, RecordedEvent};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PublishError {
    #[error("publisher unavailable: {0}")]
    Unavailable(String),

    #[error("backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait EventPublisher<Payload: Send + Sync + 'static>: Send + Sync {
    async fn publish(
        &self,
        key: &AggregateKey,
        event: &RecordedEvent<Payload>,
    ) -> Result<(), PublishError>;
}

pub mod in_memory;
pub mod tracing_log;
