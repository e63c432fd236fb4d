use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::RawCandidate;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:username/posts", get(channel_posts))
}

#[derive(Debug, Deserialize)]
struct ChannelPostsQuery {
    limit: Option<usize>,
}

/// GET /api/channels/:username/posts - Latest raw posts of a public channel, unfiltered
async fn channel_posts(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(params): Query<ChannelPostsQuery>,
) -> Result<Json<Vec<RawCandidate>>, AppError> {
    let username = username.trim_start_matches('@').to_string();
    if username.is_empty() {
        return Err(AppError::Validation("channel username must not be empty".to_string()));
    }

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::Validation(format!("limit must be between 1 and {}", MAX_LIMIT)));
    }

    info!("GET /api/channels/{}/posts - limit: {}", username, limit);

    let posts = state.telegram
        .recent_posts(&username, limit)
        .await
        .map_err(|e| {
            error!("Failed to fetch posts from @{}: {}", username, e);
            AppError::External(e.to_string())
        })?;

    Ok(Json(posts))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::routes::test_support::{json_body, TestApp};

    const PREVIEW: &str = r#"<html><body>
        <div class="tgme_widget_message" data-post="somegroup/7">
          <div class="tgme_widget_message_text">Hiring a receptionist</div>
          <div class="tgme_widget_message_footer"><a class="tgme_widget_message_date"><time datetime="2024-05-01T09:00:00+00:00">09:00</time></a></div>
        </div>
        </body></html>"#;

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_channel_posts_are_returned_unfiltered() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/s/somegroup"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PREVIEW))
            .mount(&server)
            .await;
        let app = TestApp::new().with_telegram(&server.uri());

        let response = app.router().oneshot(get("/api/channels/@somegroup/posts")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["text"], "Hiring a receptionist");
    }

    #[tokio::test]
    async fn test_unreachable_channel_is_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let app = TestApp::new().with_telegram(&server.uri());

        let response = app.router().oneshot(get("/api/channels/missing/posts")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_limit_out_of_range_is_rejected() {
        let app = TestApp::new();
        let response = app.router().oneshot(get("/api/channels/somegroup/posts?limit=0")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
