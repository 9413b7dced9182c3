// Client-credentials token exchange

use chrono::{DateTime, Utc};
use reqwest::Client;

use super::credentials::Credentials;
use super::types::{TokenResponse, TokenState, TOKEN_SAFETY_MARGIN_SECS};
use crate::error::{AuthFailure, KeycloakError, Result};

/// Exchange the client credentials for a fresh access token.
///
/// Transport failures, non-success statuses and unusable bodies all surface as
/// `KeycloakError::Auth`, distinguished by [`AuthFailure`]. Nothing is retried
/// here.
pub async fn exchange_client_credentials(
    client: &Client,
    creds: &Credentials,
) -> Result<TokenState> {
    let url = creds.token_endpoint()?;

    tracing::debug!(
        url = %url,
        client_id = %creds.client_id(),
        "Requesting access token via client credentials grant"
    );

    let form = [
        ("grant_type", "client_credentials"),
        ("client_id", creds.client_id()),
        ("client_secret", creds.client_secret()),
    ];

    let response = client.post(url).form(&form).send().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to obtain access token");
        KeycloakError::auth(AuthFailure::Transport, format!("token endpoint unreachable: {}", e))
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to read token response");
        KeycloakError::auth(AuthFailure::Transport, format!("failed to read token response: {}", e))
    })?;

    if !status.is_success() {
        let detail = oauth_error_detail(&body).unwrap_or_else(|| body.clone());
        tracing::error!(
            status = status.as_u16(),
            detail = %detail,
            "Token endpoint rejected client credentials"
        );
        return Err(KeycloakError::auth(
            AuthFailure::Rejected {
                status: status.as_u16(),
            },
            format!("token endpoint returned {}: {}", status, detail),
        ));
    }

    parse_token_response(&body, Utc::now())
}

/// Turn a 2xx token endpoint body into token state issued at `issued_at`
pub(crate) fn parse_token_response(body: &str, issued_at: DateTime<Utc>) -> Result<TokenState> {
    let malformed = |reason: String| {
        tracing::error!(reason = %reason, "Failed to parse token response");
        KeycloakError::auth(
            AuthFailure::MalformedResponse,
            format!("invalid token response format: {}", reason),
        )
    };

    let data: TokenResponse = serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;

    if data.access_token.is_empty() {
        return Err(malformed("access_token is empty".to_string()));
    }

    if data.expires_in <= TOKEN_SAFETY_MARGIN_SECS.unsigned_abs() {
        return Err(malformed(format!(
            "expires_in {}s does not exceed the {}s safety margin",
            data.expires_in, TOKEN_SAFETY_MARGIN_SECS
        )));
    }

    let state = TokenState::issued(&data, issued_at)
        .ok_or_else(|| malformed(format!("expires_in out of range: {}", data.expires_in)))?;

    if let Some(exp) = state.expires_at() {
        tracing::info!(
            expires_at = %exp.to_rfc3339(),
            token_type = data.token_type.as_deref().unwrap_or("unknown"),
            "Access token obtained"
        );
    }

    Ok(state)
}

/// Extract `error: error_description` from an OAuth error body
fn oauth_error_detail(body: &str) -> Option<String> {
    let json = serde_json::from_str::<serde_json::Value>(body).ok()?;
    let code = json.get("error").and_then(|v| v.as_str())?;
    match json.get("error_description").and_then(|v| v.as_str()) {
        Some(desc) => Some(format!("{}: {}", code, desc)),
        None => Some(code.to_string()),
    }
}
