//! Stdio transport: newline-delimited JSON-RPC on stdin/stdout
//!
//! Logs go to stderr only; stdout carries protocol messages exclusively.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::server::McpServer;

pub async fn serve(server: McpServer) -> Result<()> {
    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(stdin).lines();

    tracing::info!("MCP server running on stdio");

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        if let Some(response) = server.handle_message(&line).await {
            stdout.write_all(response.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}
