//! MCP (Model Context Protocol) server for the PDF retrieval pipeline.
//!
//! Exposes the engine's operations as tools over stdio:
//! - `is_indexed`: whether a document has stored chunks
//! - `chunks`: extract, chunk, embed and store a document (once)
//! - `rag`: the most relevant chunks of a document for a question
//! - `document_text`: the full extracted text of a document
//!
//! stdout carries the protocol; logs go to stderr.

use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ErrorData as McpError, *},
    schemars, tool, tool_handler, tool_router,
    transport::stdio,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::engine::RagEngine;
use crate::indexing::PipelineError;

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct DocumentRequest {
    /// File name of the PDF in the documents directory (e.g. "report.pdf")
    pub name: String,
}

#[derive(Debug, Deserialize, Serialize, schemars::JsonSchema)]
pub struct RagRequest {
    /// File name of an indexed PDF (e.g. "report.pdf")
    pub name: String,
    /// Natural language question about the document
    pub query: String,
}

#[derive(Clone)]
pub struct RagServer {
    engine: Arc<RagEngine>,
    tool_router: ToolRouter<Self>,
}

fn tool_error(tool: &str, err: PipelineError) -> CallToolResult {
    tracing::warn!(target: "mcp", "{tool} failed: {err}");
    let mut message = format!("Error: {err}");
    if err.is_retryable() {
        message.push_str(" (transient, retry later)");
    }
    CallToolResult::error(vec![Content::text(message)])
}

fn tool_result(tool: &str, result: Result<String, PipelineError>) -> CallToolResult {
    match result {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(err) => tool_error(tool, err),
    }
}

#[tool_router]
impl RagServer {
    pub fn new(engine: Arc<RagEngine>) -> Self {
        Self {
            engine,
            tool_router: Self::tool_router(),
        }
    }

    pub fn engine(&self) -> &RagEngine {
        &self.engine
    }

    #[tool(
        description = "Check if the given PDF has already been indexed in the vector database. Returns 'true' or 'false'."
    )]
    pub async fn is_indexed(
        &self,
        Parameters(DocumentRequest { name }): Parameters<DocumentRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(tool_result("is_indexed", self.engine.is_indexed(&name)))
    }

    #[tool(
        description = "Process and index the content of a PDF file from the documents directory. Must be called before asking questions about a new document. Documents that are already indexed are not indexed twice."
    )]
    pub async fn chunks(
        &self,
        Parameters(DocumentRequest { name }): Parameters<DocumentRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(tool_result("chunks", self.engine.chunks(&name).await))
    }

    #[tool(
        description = "Search an indexed PDF for the passages most relevant to a question. Use after the document has been indexed with the 'chunks' tool."
    )]
    pub async fn rag(
        &self,
        Parameters(RagRequest { name, query }): Parameters<RagRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(tool_result("rag", self.engine.rag(&name, &query).await))
    }

    #[tool(description = "Return the full extracted text of a PDF in the documents directory.")]
    pub async fn document_text(
        &self,
        Parameters(DocumentRequest { name }): Parameters<DocumentRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(tool_result(
            "document_text",
            self.engine.document_text(&name).await,
        ))
    }
}

#[tool_handler]
impl ServerHandler for RagServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_protocol_version(ProtocolVersion::V_2024_11_05)
            .with_server_info(
                Implementation::new("pdfrag", env!("CARGO_PKG_VERSION"))
                    .with_title("PDF Knowledge Base"),
            )
            .with_instructions(
                "This server answers questions about PDF documents. \
                WORKFLOW: call 'is_indexed' with the document's file name. \
                If it returns 'false', call 'chunks' to index it; if 'true', do not re-index. \
                Then call 'rag' with the same name and the user's question, and answer only from the returned chunks. \
                Use 'document_text' when the whole document is needed.",
            )
    }
}

/// Serve the engine over stdio until the client disconnects.
pub async fn serve_stdio(engine: Arc<RagEngine>) -> anyhow::Result<()> {
    tracing::info!(target: "mcp", "starting MCP server on stdio");
    let service = RagServer::new(engine).serve(stdio()).await?;
    service.waiting().await?;
    tracing::info!(target: "mcp", "MCP client disconnected");
    Ok(())
}
