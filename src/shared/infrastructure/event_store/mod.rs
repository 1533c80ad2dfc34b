// Event store port: append to and replay the ordered log of an aggregate.
//
// Responsibilities
// - Define the aggregate identity, the recorded event envelope and the error taxonomy.
// - Describe save/list as a trait so inbound adapters do not depend on the in memory index.
//
// Versioning
// - An aggregate starts at version 0. Every committed event bumps the version by one and
//   receives sequence = previous version + position in batch + 1.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub mod counters;
pub mod eviction;
pub mod in_memory;
mod index;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AggregateKey {
    pub aggregate_type: String,
    pub aggregate_id: String,
}

impl AggregateKey {
    pub fn new(aggregate_type: impl Into<String>, aggregate_id: impl Into<String>) -> Self {
        Self {
            aggregate_type: aggregate_type.into(),
            aggregate_id: aggregate_id.into(),
        }
    }
}

impl fmt::Display for AggregateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.aggregate_type, self.aggregate_id)
    }
}

/// Metadata assigned by the store at commit time, never by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    pub event_id: Uuid,
    pub sequence: i64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent<P> {
    pub metadata: EventMetadata,
    pub payload: P,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventStoreError {
    #[error("concurrency conflict on {key}: stored version {stored}, originating version {claimed}")]
    ConcurrencyConflict {
        key: AggregateKey,
        stored: i64,
        claimed: i64,
    },

    #[error("invalid originating version {claimed} for aggregate {key} which does not exist")]
    InvalidOriginatingVersion { key: AggregateKey, claimed: i64 },

    #[error("aggregate {key} not found")]
    AggregateNotFound { key: AggregateKey },

    #[error("internal consistency error on {key}: {reason}")]
    InternalConsistency { key: AggregateKey, reason: String },
}

#[async_trait]
pub trait EventStore<Payload: Clone + Send + Sync + 'static>: Send + Sync {
    async fn save(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        originating_version: i64,
        events: Vec<Payload>,
    ) -> Result<(), EventStoreError>;

    async fn list(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
    ) -> Result<Vec<RecordedEvent<Payload>>, EventStoreError>;
}
