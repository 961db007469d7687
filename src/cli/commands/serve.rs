//! Serve command - MCP server on stdio.

use std::sync::Arc;

use anyhow::Result;

use crate::engine::RagEngine;

/// Run the MCP server until the client disconnects.
pub async fn run(engine: RagEngine) -> Result<()> {
    eprintln!("Starting MCP server on stdio transport");
    crate::mcp::serve_stdio(Arc::new(engine)).await
}
