use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fmt;
use std::time::Duration;

use crate::auth::Credentials;

/// Keycloak MCP server - read-only Keycloak admin tools
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Base URL of the Keycloak server (e.g. http://localhost:8080)
    #[arg(short = 'u', long = "url", env = "KEYCLOAK_URL")]
    pub keycloak_url: Option<String>,

    /// OAuth2 client ID used for the client credentials grant
    #[arg(short = 'c', long, env = "CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth2 client secret
    #[arg(short = 's', long, env = "CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Realm to authenticate against
    #[arg(short = 'r', long, env = "KEYCLOAK_REALM", default_value = "master")]
    pub realm: String,

    /// HTTP request timeout in seconds (token exchange and admin API)
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "10")]
    pub http_timeout: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Transport the tool server listens on
    #[arg(short = 't', long, env = "MCP_TRANSPORT", value_enum, default_value = "stdio")]
    pub transport: Transport,

    /// Bind address for the HTTP transport
    #[arg(short = 'H', long, env = "SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Bind port for the HTTP transport
    #[arg(short, long, env = "SERVER_PORT", default_value = "8001")]
    pub port: u16,

    /// API key required by the HTTP transport (unset: no check)
    #[arg(short = 'k', long, env = "MCP_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Transport {
    Stdio,
    Http,
}

#[derive(Clone)]
pub struct Config {
    // Keycloak
    pub keycloak_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub auth_realm: String,

    // HTTP client
    pub http_request_timeout: u64,

    // Server
    pub transport: Transport,
    pub server_host: String,
    pub server_port: u16,
    pub api_key: Option<String>,

    // Logging
    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with priority: CLI > ENV > defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_args(CliArgs::parse())
    }

    /// Build configuration from parsed arguments.
    /// Fails listing every missing required variable.
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let keycloak_url = non_empty(args.keycloak_url);
        let client_id = non_empty(args.client_id);
        let client_secret = non_empty(args.client_secret);

        let mut missing = Vec::new();
        if keycloak_url.is_none() {
            missing.push("KEYCLOAK_URL");
        }
        if client_id.is_none() {
            missing.push("CLIENT_ID");
        }
        if client_secret.is_none() {
            missing.push("CLIENT_SECRET");
        }

        match (keycloak_url, client_id, client_secret) {
            (Some(keycloak_url), Some(client_id), Some(client_secret)) => Ok(Config {
                keycloak_url,
                client_id,
                client_secret,
                auth_realm: args.realm.trim().to_string(),
                http_request_timeout: args.http_timeout,
                transport: args.transport,
                server_host: args.host,
                server_port: args.port,
                api_key: non_empty(args.api_key),
                log_level: args.log_level,
            }),
            _ => anyhow::bail!(
                "Missing required environment variables: {}. Please check your .env file.",
                missing.join(", ")
            ),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.http_request_timeout == 0 {
            anyhow::bail!("HTTP_REQUEST_TIMEOUT must be greater than 0");
        }

        self.credentials()?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http_request_timeout)
    }

    /// Credentials for the token manager
    pub fn credentials(&self) -> Result<Credentials> {
        Credentials::new(
            &self.keycloak_url,
            self.client_id.clone(),
            self.client_secret.clone(),
            self.auth_realm.clone(),
        )
        .context("Invalid Keycloak configuration")
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("keycloak_url", &self.keycloak_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("auth_realm", &self.auth_realm)
            .field("http_request_timeout", &self.http_request_timeout)
            .field("transport", &self.transport)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Trim and drop empty values
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
