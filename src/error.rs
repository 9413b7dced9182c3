// Error handling module
// Closed error taxonomy shared by the client, the executor and the tool layer

use std::fmt;

use thiserror::Error;

/// Why a token exchange failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// The token endpoint could not be reached (connect, timeout, DNS)
    Transport,

    /// The token endpoint answered with a non-success status
    Rejected { status: u16 },

    /// The token endpoint answered 2xx but the body was unusable
    MalformedResponse,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthFailure::Transport => write!(f, "transport"),
            AuthFailure::Rejected { status } => write!(f, "rejected ({})", status),
            AuthFailure::MalformedResponse => write!(f, "malformed response"),
        }
    }
}

/// Errors surfaced by the Keycloak client and everything built on top of it
#[derive(Error, Debug)]
pub enum KeycloakError {
    /// Invalid or missing input, detected before any network call
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token exchange failed
    #[error("Authentication failed: {message}")]
    Auth { kind: AuthFailure, message: String },

    /// Admin API request failed
    #[error("API request failed: {message}")]
    Api { status: Option<u16>, message: String },
}

impl KeycloakError {
    pub fn config(message: impl Into<String>) -> Self {
        KeycloakError::Config(message.into())
    }

    pub fn auth(kind: AuthFailure, message: impl Into<String>) -> Self {
        KeycloakError::Auth {
            kind,
            message: message.into(),
        }
    }

    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        KeycloakError::Api {
            status,
            message: message.into(),
        }
    }

    /// HTTP status of the failed request, when the server answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            KeycloakError::Api { status, .. } => *status,
            KeycloakError::Auth {
                kind: AuthFailure::Rejected { status },
                ..
            } => Some(*status),
            _ => None,
        }
    }

    /// Short stable label used in logs and tool error payloads
    pub fn kind(&self) -> &'static str {
        match self {
            KeycloakError::Config(_) => "config",
            KeycloakError::Auth { .. } => "auth",
            KeycloakError::Api { .. } => "api",
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, KeycloakError>;
