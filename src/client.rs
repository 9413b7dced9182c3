// Keycloak admin client
// Read-only operations on realms and users

use reqwest::Method;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{Credentials, TokenManager};
use crate::error::{KeycloakError, Result};
use crate::http_client::{ApiResponse, KeycloakHttpClient, RequestOptions};
use crate::models::{RealmSummary, UserDetail, UserSummary};

/// Default page size for `list_users`
pub const DEFAULT_MAX_USERS: u32 = 100;

/// Client for the Keycloak Admin REST API.
///
/// Constructed explicitly and passed to whoever performs operations; it owns
/// the token manager, so one instance means one cached token.
pub struct KeycloakClient {
    http: KeycloakHttpClient,
}

impl KeycloakClient {
    pub fn new(credentials: Credentials, request_timeout: Duration) -> Result<Self> {
        let token_manager = Arc::new(TokenManager::new(credentials, request_timeout)?);
        Self::with_token_manager(token_manager, request_timeout)
    }

    pub fn with_token_manager(
        token_manager: Arc<TokenManager>,
        request_timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            http: KeycloakHttpClient::new(token_manager, request_timeout)?,
        })
    }

    pub fn token_manager(&self) -> &Arc<TokenManager> {
        self.http.token_manager()
    }

    /// All realms, in the order the server returns them
    pub async fn list_realms(&self) -> Result<Vec<RealmSummary>> {
        self.get_json(&["admin", "realms"], &RequestOptions::default())
            .await
    }

    /// Users of `realm`, at most `max_users` of them
    pub async fn list_users(&self, realm: &str, max_users: u32) -> Result<Vec<UserSummary>> {
        require("realm", realm)?;

        let options = RequestOptions::default().query("max", max_users);
        self.get_json(&["admin", "realms", realm, "users"], &options)
            .await
    }

    /// A single user by id (not username)
    pub async fn get_user(&self, realm: &str, user_id: &str) -> Result<UserDetail> {
        require("realm", realm)?;
        require("user_id", user_id)?;

        self.get_json(
            &["admin", "realms", realm, "users", user_id],
            &RequestOptions::default(),
        )
        .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &[&str],
        options: &RequestOptions,
    ) -> Result<T> {
        match self.http.execute(Method::GET, path, options).await? {
            ApiResponse::Json(value) => serde_json::from_value(value).map_err(|e| {
                KeycloakError::api(None, format!("unexpected response from /{}: {}", path.join("/"), e))
            }),
            ApiResponse::NoContent => Err(KeycloakError::api(
                None,
                format!("unexpected response from /{}: no content", path.join("/")),
            )),
        }
    }
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(KeycloakError::config(format!(
            "{} parameter cannot be empty",
            name
        )));
    }
    Ok(())
}
