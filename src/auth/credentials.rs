// Client credentials used for the token exchange

use std::fmt;

use reqwest::Url;

use crate::error::{KeycloakError, Result};

/// Immutable credential set for the client-credentials grant
#[derive(Clone)]
pub struct Credentials {
    base_url: Url,
    client_id: String,
    client_secret: String,
    realm: String,
}

impl Credentials {
    /// Validate and build a credential set.
    ///
    /// Every field must be non-empty and the base address must be an
    /// absolute `http`/`https` URL. A trailing `/` on the base address is
    /// ignored.
    pub fn new(
        base_url: impl AsRef<str>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        realm: impl Into<String>,
    ) -> Result<Self> {
        let base_url = base_url.as_ref().trim_end_matches('/');
        let client_id = client_id.into();
        let client_secret = client_secret.into();
        let realm = realm.into();

        if base_url.is_empty() {
            return Err(KeycloakError::config("base_url cannot be empty"));
        }
        if client_id.is_empty() {
            return Err(KeycloakError::config("client_id cannot be empty"));
        }
        if client_secret.is_empty() {
            return Err(KeycloakError::config("client_secret cannot be empty"));
        }
        if realm.is_empty() {
            return Err(KeycloakError::config("realm cannot be empty"));
        }

        let parsed = Url::parse(base_url).map_err(|e| {
            KeycloakError::config(format!("base_url is not a valid URL ({}): {}", base_url, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
            return Err(KeycloakError::config(format!(
                "base_url must be an http(s) URL: {}",
                base_url
            )));
        }

        Ok(Self {
            base_url: parsed,
            client_id,
            client_secret,
            realm,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Realm the client authenticates against (not necessarily the realm it reads)
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Build an absolute URL below the base address, percent-encoding each segment
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                KeycloakError::config(format!("base_url cannot carry a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// OpenID Connect token endpoint of the authentication realm
    pub fn token_endpoint(&self) -> Result<Url> {
        self.endpoint(&[
            "realms",
            &self.realm,
            "protocol",
            "openid-connect",
            "token",
        ])
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url.as_str())
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("realm", &self.realm)
            .finish()
    }
}
