use chrono::Utc;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::Mutex;

use super::credentials::Credentials;
use super::exchange;
use super::types::TokenState;
use crate::error::{KeycloakError, Result};

/// Token manager
/// Owns the cached bearer token and decides when it has to be exchanged again
pub struct TokenManager {
    /// Client credentials used for every exchange
    credentials: Credentials,

    /// Cached token and expiry; held across an exchange so concurrent
    /// callers wait for the in-flight exchange instead of starting another
    state: Mutex<TokenState>,

    /// HTTP client for token requests
    client: Client,
}

impl TokenManager {
    /// Create a token manager with an empty cache
    pub fn new(credentials: Credentials, request_timeout: Duration) -> Result<Self> {
        Self::with_state(credentials, request_timeout, TokenState::default())
    }

    /// Create a token manager whose cache already holds a token
    /// Available in test builds and integration tests
    #[cfg(any(test, feature = "test-utils"))]
    pub fn new_for_testing(
        credentials: Credentials,
        access_token: String,
        expires_at: chrono::DateTime<Utc>,
    ) -> Result<Self> {
        Self::with_state(
            credentials,
            Duration::from_secs(10),
            TokenState::new(access_token, expires_at),
        )
    }

    fn with_state(
        credentials: Credentials,
        request_timeout: Duration,
        state: TokenState,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| KeycloakError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            credentials,
            state: Mutex::new(state),
            client,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Return the cached token while it is still valid, otherwise exchange
    /// the credentials for a new one. Never returns an expired token.
    pub async fn ensure_valid_token(&self) -> Result<String> {
        let mut state = self.state.lock().await;

        if let Some(token) = state.valid_token(Utc::now()) {
            return Ok(token.to_string());
        }

        tracing::debug!("Token missing or expired, obtaining new token");
        self.exchange(&mut state).await
    }

    /// Discard the cached token and exchange unconditionally.
    /// Used after the resource server rejected a token the cache still
    /// considered valid.
    pub async fn force_refresh(&self) -> Result<String> {
        let mut state = self.state.lock().await;
        state.clear();

        tracing::info!("Discarding rejected token, obtaining new token");
        self.exchange(&mut state).await
    }

    /// Current cache contents
    pub async fn snapshot(&self) -> TokenState {
        self.state.lock().await.clone()
    }

    async fn exchange(&self, state: &mut TokenState) -> Result<String> {
        let fresh = exchange::exchange_client_credentials(&self.client, &self.credentials).await?;
        // A successful exchange always carries a non-empty token
        let token = fresh.access_token().unwrap_or_default().to_string();
        *state = fresh;
        Ok(token)
    }
}
