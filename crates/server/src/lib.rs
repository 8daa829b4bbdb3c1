//! Model Context Protocol tool surface.
//!
//! Exposes the [`tracker`] services as MCP tools over stdio. Each tool has a
//! JSON input schema derived from the structs in [`params`] and returns its
//! JSON-encoded result as one text content block.
//!
//! ## Architectural Layer
//!
//! **Inbound adapter.** Input validation and error-code mapping live here;
//! every domain rule stays in [`tracker`].
//!
//! ## Error mapping
//!
//! | Domain error | Protocol error |
//! |--------------|----------------|
//! | `NotFound` | invalid request |
//! | `InvalidInput` | invalid params |
//! | anything else | internal error |
//!
//! An unknown tool name is answered with method-not-found before any tool
//! code runs.

pub mod params;
mod tools;

use rmcp::{transport::stdio, ServiceExt};
use tracing::info;

pub use tools::{to_mcp_error, ProjectsServer};

/// Serves `server` on stdin/stdout until the host disconnects.
pub async fn run_stdio(server: ProjectsServer) -> anyhow::Result<()> {
    info!("serving tools over stdio");
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    info!("host disconnected");
    Ok(())
}
