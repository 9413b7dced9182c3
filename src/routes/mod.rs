use axum::{middleware as axum_middleware, routing::get, Json, Router};
use chrono::Utc;
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpService,
};
use serde_json::{json, Value};

use crate::mcp::McpServer;
use crate::middleware;

/// Application version from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub api_key: Option<String>,
}

/// Health check routes (no authentication required)
pub fn health_routes() -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
}

/// Streamable HTTP tool protocol at /mcp (API key checked when configured)
pub fn mcp_routes(server: McpServer, state: AppState) -> Router {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    Router::new()
        .nest_service("/mcp", service)
        .layer(axum_middleware::from_fn_with_state(
            state,
            middleware::auth_middleware,
        ))
}

/// GET / - Simple health check
async fn root_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Keycloak MCP server is running",
        "version": VERSION
    }))
}

/// GET /health - Detailed health check
async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "version": VERSION
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;
    use crate::client::KeycloakClient;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn create_test_server() -> McpServer {
        let creds = Credentials::new("http://127.0.0.1:1", "c", "s", "master").unwrap();
        let client = KeycloakClient::new(creds, Duration::from_secs(1)).unwrap();
        McpServer::new(Arc::new(client))
    }

    fn app(api_key: Option<&str>) -> Router {
        mcp_routes(
            create_test_server(),
            AppState {
                api_key: api_key.map(str::to_string),
            },
        )
    }

    fn post_initialize(auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/mcp")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(value) = auth {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder
            .body(Body::from(
                r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{
                    "protocolVersion":"2025-06-18","capabilities":{},
                    "clientInfo":{"name":"test","version":"1.0"}}}"#,
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn test_api_key_enforced() {
        let response = app(Some("key-123"))
            .oneshot(post_initialize(None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app(Some("key-123"))
            .oneshot(post_initialize(Some("Bearer wrong")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_key_reaches_tool_service() {
        let response = app(Some("key-123"))
            .oneshot(post_initialize(Some("Bearer key-123")))
            .await
            .unwrap();
        assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_no_key_configured_reaches_tool_service() {
        let response = app(None).oneshot(post_initialize(None)).await.unwrap();
        assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_health_routes() {
        let response = health_routes()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
    }
}
