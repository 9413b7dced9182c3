// Authentication types

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Seconds subtracted from the declared token lifetime so a request never
/// goes out with a token that expires mid-flight
pub const TOKEN_SAFETY_MARGIN_SECS: i64 = 10;

/// Token endpoint response for the client-credentials grant.
///
/// Only `access_token` and `expires_in` are required; a body lacking either
/// fails to deserialize.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Cached bearer token and the instant after which it must not be used
#[derive(Clone, Default)]
pub struct TokenState {
    access_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl TokenState {
    pub fn new(access_token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: Some(access_token),
            expires_at: Some(expires_at),
        }
    }

    /// Build the state for a token issued at `issued_at`.
    /// Returns `None` when the declared lifetime cannot be represented or
    /// does not outlast the safety margin.
    pub fn issued(response: &TokenResponse, issued_at: DateTime<Utc>) -> Option<Self> {
        let lifetime = i64::try_from(response.expires_in).ok()?;
        if lifetime <= TOKEN_SAFETY_MARGIN_SECS {
            return None;
        }
        let usable = Duration::try_seconds(lifetime - TOKEN_SAFETY_MARGIN_SECS)?;
        let expires_at = issued_at.checked_add_signed(usable)?;
        Some(Self::new(response.access_token.clone(), expires_at))
    }

    /// Token usable at `now`, if any. Valid strictly before the expiry instant.
    pub fn valid_token(&self, now: DateTime<Utc>) -> Option<&str> {
        match (&self.access_token, self.expires_at) {
            (Some(token), Some(exp)) if now < exp => Some(token.as_str()),
            _ => None,
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_token(now).is_some()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn clear(&mut self) {
        self.access_token = None;
        self.expires_at = None;
    }
}

impl fmt::Debug for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenState")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
