use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::TokenManager;
use crate::error::{KeycloakError, Result};

/// Longest error body excerpt carried in an error message
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Successful outcome of an admin API call
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// 2xx without a body (204 No Content)
    NoContent,

    /// 2xx with a JSON body, returned as-is
    Json(Value),
}

/// Query parameters for a request
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }
}

/// Why a single attempt did not succeed
#[derive(Debug)]
enum AttemptError {
    /// 401: the server no longer accepts the token
    Unauthorized { body: String },

    /// Any other non-success status
    Status { status: StatusCode, body: String },

    /// 2xx whose body is not JSON
    Decode { status: StatusCode, error: String },

    /// Request never completed
    Transport(reqwest::Error),
}

impl AttemptError {
    fn status(&self) -> Option<u16> {
        match self {
            AttemptError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED.as_u16()),
            AttemptError::Status { status, .. } | AttemptError::Decode { status, .. } => {
                Some(status.as_u16())
            }
            AttemptError::Transport(_) => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            AttemptError::Unauthorized { body } => format_status(StatusCode::UNAUTHORIZED, body),
            AttemptError::Status { status, body } => format_status(*status, body),
            AttemptError::Decode { status, error } => {
                format!("{} returned invalid JSON: {}", status, error)
            }
            AttemptError::Transport(e) => {
                format!("failed to communicate with Keycloak ({}): {}", transport_error_kind(e), e)
            }
        }
    }
}

/// HTTP client for the Keycloak admin API with a single token-refresh retry
pub struct KeycloakHttpClient {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// Token manager
    token_manager: Arc<TokenManager>,
}

impl KeycloakHttpClient {
    /// Create a new HTTP client; every attempt is bounded by `request_timeout`
    pub fn new(token_manager: Arc<TokenManager>, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| KeycloakError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            token_manager,
        })
    }

    pub fn token_manager(&self) -> &Arc<TokenManager> {
        &self.token_manager
    }

    /// Perform one logical API call against the path below the base address.
    ///
    /// - 401: forces a token refresh and retries exactly once
    /// - other failure statuses and transport errors: fail immediately
    ///
    /// Each attempt gets its own full timeout.
    pub async fn execute(
        &self,
        method: Method,
        path: &[&str],
        options: &RequestOptions,
    ) -> Result<ApiResponse> {
        let url = self.token_manager.credentials().endpoint(path)?;
        let token = self.token_manager.ensure_valid_token().await?;

        tracing::debug!(method = %method, url = %url, "Sending Keycloak API request");

        let first = self.attempt(&method, &url, options, &token).await;
        let body = match first {
            Ok(response) => return Ok(response),
            Err(AttemptError::Unauthorized { body }) => body,
            Err(e) => {
                tracing::error!(
                    method = %method,
                    url = %url,
                    status = ?e.status(),
                    "Keycloak API error: {}",
                    e.describe()
                );
                return Err(KeycloakError::api(e.status(), e.describe()));
            }
        };

        tracing::info!(
            method = %method,
            url = %url,
            response_body = %truncate(&body),
            "Received 401, refreshing token and retrying"
        );

        let token = self.token_manager.force_refresh().await?;

        self.attempt(&method, &url, options, &token)
            .await
            .map_err(|e| {
                tracing::error!(
                    method = %method,
                    url = %url,
                    status = ?e.status(),
                    "Retry after token refresh failed: {}",
                    e.describe()
                );
                KeycloakError::api(
                    e.status(),
                    format!("request failed after token refresh: {}", e.describe()),
                )
            })
    }

    async fn attempt(
        &self,
        method: &Method,
        url: &reqwest::Url,
        options: &RequestOptions,
        token: &str,
    ) -> std::result::Result<ApiResponse, AttemptError> {
        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .bearer_auth(token);
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(
                error_kind = transport_error_kind(&e),
                error = %e,
                url = %url,
                "HTTP request error"
            );
            AttemptError::Transport(e)
        })?;

        let status = response.status();
        tracing::debug!(status = %status, "Received HTTP response");

        let body = response.text().await.map_err(AttemptError::Transport)?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(AttemptError::Unauthorized { body });
        }
        if !status.is_success() {
            return Err(AttemptError::Status { status, body });
        }
        if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
            return Ok(ApiResponse::NoContent);
        }

        serde_json::from_str(&body)
            .map(ApiResponse::Json)
            .map_err(|e| AttemptError::Decode {
                status,
                error: e.to_string(),
            })
    }
}

/// Categorize a transport error for logs and messages
fn transport_error_kind(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connection_failed"
    } else if e.is_request() {
        "request_error"
    } else if e.is_body() {
        "body_error"
    } else if e.is_decode() {
        "decode_error"
    } else {
        "unknown"
    }
}

fn format_status(status: StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        status.to_string()
    } else {
        format!("{} - {}", status, truncate(body))
    }
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
