pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::composition::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Assist API
        .route("/api/v1/assist/reply", post(handlers::handle_reply))
        .route("/api/v1/assist/compose", post(handlers::handle_compose))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::composition::pipeline::PipelineSettings;
    use crate::llm_client::testing::ScriptedClient;
    use crate::llm_client::ServiceError;

    fn app(client: ScriptedClient) -> Router {
        build_router(AppState {
            completion: Arc::new(client),
            settings: PipelineSettings::default(),
        })
    }

    async fn post_json(app: Router, uri: &str, payload: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn draft(body: &str) -> String {
        json!({ "subject": "Re: Order", "body": body }).to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(ScriptedClient::new(vec![]))
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_reply_round_trip() {
        let client = ScriptedClient::always(&draft("Thanks, noted.\n\nBest regards,\nJohn Doe"));
        let (status, body) = post_json(
            app(client),
            "/api/v1/assist/reply",
            json!({
                "recipient_display_name": "John Doe",
                "incoming_sender_name": "Jane Smith",
                "incoming_subject": "Order",
                "incoming_body": "Your order 123456 has shipped.",
                "greeting_style": "casual"
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["subject"], "Re: Order");
        assert_eq!(body["body"], "Hi Jane,\n\nThanks, noted.\n\nBest regards,\nJohn Doe");
        assert_eq!(body["gate_satisfied"], true);
        assert_eq!(body["attempts"], 1);
        assert_eq!(body["warnings"], json!([]));
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_blank_incoming_body_is_rejected() {
        let client = ScriptedClient::new(vec![]);
        let (status, body) = post_json(
            app(client),
            "/api/v1/assist/reply",
            json!({ "incoming_body": "   " }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_service_error_surfaces_with_kind() {
        let client = ScriptedClient::new(vec![Err(ServiceError::Quota { retries: 3 })]);
        let (status, body) = post_json(
            app(client),
            "/api/v1/assist/reply",
            json!({ "incoming_body": "Hello there." }),
        )
        .await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "SERVICE_QUOTA");
    }

    #[tokio::test]
    async fn test_compose_requires_topic() {
        let (status, _) = post_json(
            app(ScriptedClient::new(vec![])),
            "/api/v1/assist/compose",
            json!({ "topic_description": "" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_compose_returns_draft() {
        let client = ScriptedClient::always(&draft("Hi team,\n\nPlease review."));
        let (status, body) = post_json(
            app(client),
            "/api/v1/assist/compose",
            json!({ "topic_description": "Access review", "language": "en" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["subject"], "Re: Order");
        assert_eq!(body["body"], "Hi team,\n\nPlease review.");
    }
}
