// Tool-invocation server
// Tool handlers and the stdio transport

mod server;

use anyhow::{Context, Result};
use rmcp::ServiceExt;

pub use server::{McpServer, SERVER_NAME};

/// Serve the process's stdin/stdout until the client disconnects
pub async fn serve_stdio(server: McpServer) -> Result<()> {
    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .context("Failed to start stdio transport")?;

    let reason = service.waiting().await?;
    tracing::info!(reason = ?reason, "Stdio session closed");
    Ok(())
}
