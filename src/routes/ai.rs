use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use crate::errors::AppError;
use crate::models::{ExtractRequest, ExtractedFields, KeyState};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/extract", post(extract))
        .route("/keys", get(key_state))
        .route("/models", get(list_models))
}

/// POST /api/ai/extract
/// Run the extraction prompt (or a caller-supplied template) over arbitrary text
async fn extract(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<ExtractedFields>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text must not be empty".to_string()));
    }

    info!("POST /api/ai/extract - {} chars", request.text.len());

    let fields = state.enrichment
        .extract(&request.text, request.prompt_template.as_deref())
        .await?;

    Ok(Json(fields))
}

/// GET /api/ai/keys
async fn key_state(State(state): State<AppState>) -> Json<KeyState> {
    Json(state.enrichment.key_state())
}

/// GET /api/ai/models
async fn list_models(State(state): State<AppState>) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.enrichment.list_available_models().await?))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use tower::ServiceExt;

    use crate::errors::BackendError;
    use crate::routes::test_support::{json_body, TestApp};

    fn extract_request(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/ai/extract")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_extract_returns_fields() {
        let app = TestApp::with(vec![], vec![Ok(r#"{"job_name":"X"}"#.to_string())], &["test-key-0001-abcd"]);

        let response = app.router()
            .oneshot(extract_request(r#"{"text":"we are hiring"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["job_name"], "X");
    }

    #[tokio::test]
    async fn test_extract_without_keys_is_bad_gateway() {
        let app = TestApp::with(vec![], vec![], &[]);

        let response = app.router()
            .oneshot(extract_request(r#"{"text":"we are hiring"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_extract_quota_exhaustion_is_429() {
        let app = TestApp::with(
            vec![],
            vec![Err(BackendError::RateLimited("RESOURCE_EXHAUSTED".to_string()))],
            &["test-key-0001-abcd"],
        );

        let response = app.router()
            .oneshot(extract_request(r#"{"text":"we are hiring"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_extract_rejects_blank_text() {
        let app = TestApp::new();
        let response = app.router().oneshot(extract_request(r#"{"text":"  "}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_keys_are_masked() {
        let app = TestApp::new();

        let response = app.router()
            .oneshot(Request::builder().uri("/api/ai/keys").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let body = json_body(response).await;
        assert_eq!(body["keys_loaded"], 1);
        assert_eq!(body["masked_keys"][0], "test...abcd");
    }

    #[tokio::test]
    async fn test_models_listed_with_current_key() {
        let app = TestApp::new();

        let response = app.router()
            .oneshot(Request::builder().uri("/api/ai/models").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await[0], "models/gemini-2.5-flash");
    }
}
