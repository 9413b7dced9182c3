// Authentication and CORS middleware for the HTTP transport

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::routes::AppState;

/// Authentication middleware
///
/// Only active when an API key is configured. Accepts "Bearer {MCP_API_KEY}"
/// in the Authorization header or the bare key in x-api-key.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected_key) = state.api_key.as_deref() else {
        return next.run(request).await;
    };

    if let Some(auth_header) = request.headers().get("authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if auth_str.strip_prefix("Bearer ") == Some(expected_key) {
                return next.run(request).await;
            }
        }
    }

    if let Some(api_key_header) = request.headers().get("x-api-key") {
        if let Ok(key_str) = api_key_header.to_str() {
            if key_str == expected_key {
                return next.run(request).await;
            }
        }
    }

    let request_id = uuid::Uuid::new_v4().to_string()[..8].to_string();
    tracing::warn!(
        "[{}] Access attempt with invalid or missing API key: {} {}",
        request_id,
        request.method(),
        request.uri().path()
    );

    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": {
                "message": "Invalid or missing API Key",
                "type": "auth_error",
            }
        })),
    )
        .into_response()
}

/// Create CORS middleware layer
///
/// Configures CORS to allow all origins, methods, and headers.
/// Handles OPTIONS preflight requests automatically.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use tower::util::ServiceExt;

    fn create_test_state(api_key: Option<&str>) -> AppState {
        AppState {
            api_key: api_key.map(str::to_string),
        }
    }

    fn guarded_app(state: AppState) -> Router {
        Router::new()
            .route("/protected", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(state, auth_middleware))
    }

    async fn status_for(app: Router, header: Option<(&str, &str)>) -> StatusCode {
        let mut builder = Request::builder().uri("/protected");
        if let Some((name, value)) = header {
            builder = builder.header(name, value);
        }
        app.oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_no_key_configured_allows_all() {
        let app = guarded_app(create_test_state(None));
        assert_eq!(status_for(app, None).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bearer_key_accepted() {
        let app = guarded_app(create_test_state(Some("key-123")));
        assert_eq!(
            status_for(app, Some(("authorization", "Bearer key-123"))).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_x_api_key_accepted() {
        let app = guarded_app(create_test_state(Some("key-123")));
        assert_eq!(
            status_for(app, Some(("x-api-key", "key-123"))).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_wrong_or_missing_key_rejected() {
        let state = create_test_state(Some("key-123"));
        assert_eq!(
            status_for(guarded_app(state.clone()), None).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(guarded_app(state.clone()), Some(("authorization", "Bearer nope"))).await,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(guarded_app(state), Some(("authorization", "key-123"))).await,
            StatusCode::UNAUTHORIZED
        );
    }
}
