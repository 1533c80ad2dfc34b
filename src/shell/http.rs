use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;

use crate::modules::aggregates::use_cases::list_events::inbound::http as list_http;
use crate::modules::aggregates::use_cases::save_events::inbound::http as save_http;
use crate::shared::infrastructure::event_store::EventStoreError;
use crate::shell::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/aggregates/{aggregate_type}/{aggregate_id}/events",
            get(list_http::handle).post(save_http::handle),
        )
        .with_state(state)
}

pub fn error_response(error: EventStoreError) -> Response {
    let (status, kind) = match &error {
        EventStoreError::ConcurrencyConflict { .. } => (StatusCode::CONFLICT, "concurrency_conflict"),
        EventStoreError::InvalidOriginatingVersion { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "invalid_originating_version",
        ),
        EventStoreError::AggregateNotFound { .. } => (StatusCode::NOT_FOUND, "aggregate_not_found"),
        EventStoreError::InternalConsistency { .. } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_consistency",
        ),
    };
    (
        status,
        Json(json!({ "kind": kind, "error": error.to_string() })),
    )
        .into_response()
}
