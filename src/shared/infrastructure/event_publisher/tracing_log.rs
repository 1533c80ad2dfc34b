// Publisher that writes every committed event to the tracing log.
// Used by the binary until a real bus is wired in.

use crate::shared::infrastructure::event_publisher::{EventPublisher, PublishError};
use crate::shared::infrastructure::event_store::{AggregateKey, RecordedEvent};
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventPublisher;

#[async_trait]
impl<Payload> EventPublisher<Payload> for TracingEventPublisher
where
    Payload: Serialize + Send + Sync + 'static,
{
    async fn publish(
        &self,
        key: &AggregateKey,
        event: &RecordedEvent<Payload>,
    ) -> Result<(), PublishError> {
        let payload = serde_json::to_string(&event.payload)
            .map_err(|error| PublishError::Backend(error.to_string()))?;
        tracing::info!(
            aggregate = %key,
            event_id = %event.metadata.event_id,
            sequence = event.metadata.sequence,
            timestamp = event.metadata.timestamp,
            payload = %payload,
            "event published"
        );
        Ok(())
    }
}
