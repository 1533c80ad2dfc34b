use crate::shared::infrastructure::event_store::EventStore;
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub event_store: Arc<dyn EventStore<Value>>,
}
