use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::shell::http::error_response;
use crate::shell::state::AppState;

pub async fn handle(
    State(state): State<AppState>,
    Path((aggregate_type, aggregate_id)): Path<(String, String)>,
) -> impl IntoResponse {
    match state.event_store.list(&aggregate_type, &aggregate_id).await {
        Ok(events) => Json(events).into_response(),
        Err(error) => error_response(error),
    }
}

#[cfg(test)]
mod list_events_http_inbound_tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::shared::infrastructure::event_store::EventStore;
    use crate::shared::infrastructure::event_store::in_memory::InMemoryEventStore;
    use crate::shell::state::AppState;

    use super::handle;

    fn app(store: Arc<InMemoryEventStore<serde_json::Value>>) -> Router {
        Router::new()
            .route("/aggregates/{aggregate_type}/{aggregate_id}/events", get(handle))
            .with_state(AppState { event_store: store })
    }

    fn list_request(path: &str) -> Request<Body> {
        Request::get(path).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn it_should_return_200_with_events_and_metadata() {
        let store = Arc::new(InMemoryEventStore::new());
        store
            .save(
                "serverGroup",
                "asg-1",
                0,
                vec![
                    serde_json::json!({"kind": "created"}),
                    serde_json::json!({"kind": "resized"}),
                ],
            )
            .await
            .unwrap();

        let response = app(store)
            .oneshot(list_request("/aggregates/serverGroup/asg-1/events"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let events = json.as_array().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["metadata"]["sequence"], 1);
        assert_eq!(events[1]["metadata"]["sequence"], 2);
        assert_eq!(events[1]["payload"]["kind"], "resized");
    }

    #[tokio::test]
    async fn it_should_return_200_with_an_empty_list_for_a_created_aggregate() {
        let store = Arc::new(InMemoryEventStore::new());
        store
            .save("serverGroup", "asg-1", 0, Vec::new())
            .await
            .unwrap();

        let response = app(store)
            .oneshot(list_request("/aggregates/serverGroup/asg-1/events"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"[]");
    }

    #[tokio::test]
    async fn it_should_return_404_for_an_unknown_aggregate() {
        let response = app(Arc::new(InMemoryEventStore::new()))
            .oneshot(list_request("/aggregates/orderQueue/missing-1/events"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "aggregate orderQueue/missing-1 not found");
    }
}
