use anyhow::{Context, Result};
use std::sync::Arc;

use keycloak_mcp::client::KeycloakClient;
use keycloak_mcp::config::{self, Transport};
use keycloak_mcp::mcp::{self, McpServer};
use keycloak_mcp::{middleware, routes};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (for log level)
    let config = config::Config::load()?;
    config.validate()?;

    // stdout carries the stdio protocol stream, so logs go to stderr
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting Keycloak MCP server...");
    tracing::debug!("Configuration: {:?}", config);

    let client = Arc::new(
        KeycloakClient::new(config.credentials()?, config.request_timeout())
            .context("Failed to initialize Keycloak client")?,
    );
    let credentials = client.token_manager().credentials();
    tracing::info!(
        url = %credentials.base_url(),
        realm = %credentials.realm(),
        "Keycloak client initialized"
    );

    // Test authentication by getting a token
    match client.token_manager().ensure_valid_token().await {
        Ok(token) => {
            tracing::info!(
                "Authentication successful (token: {}...)",
                token.chars().take(8).collect::<String>()
            );
        }
        Err(e) => {
            tracing::error!("Authentication failed: {}", e);
            tracing::warn!("Server will start but tool calls will fail without valid credentials");
        }
    }

    let server = McpServer::new(client);

    match config.transport {
        Transport::Stdio => {
            tracing::info!("Serving tools over stdio");
            mcp::serve_stdio(server).await?;
        }
        Transport::Http => serve_http(&config, server).await?,
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Serve the streamable HTTP tool protocol on /mcp
async fn serve_http(config: &config::Config, server: McpServer) -> Result<()> {
    let state = routes::AppState {
        api_key: config.api_key.clone(),
    };

    let app = axum::Router::new()
        .merge(routes::health_routes())
        .merge(routes::mcp_routes(server, state))
        .layer(middleware::cors_layer())
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on http://{}/mcp", addr);
    if config.api_key.is_none() {
        tracing::warn!("MCP_API_KEY is not set; /mcp accepts unauthenticated requests");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Handle graceful shutdown signal
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown...");
        },
    }
}
