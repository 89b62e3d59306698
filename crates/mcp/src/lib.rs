//! MCP (Model Context Protocol) server support for bol-mcp.
//!
//! This crate provides:
//! - Tool descriptors and their validation (`tool`)
//! - Once-only, duplicate-free tool registration (`registry`)
//! - The tool router that executes `tools/call` (`router`)
//! - JSON-RPC method dispatch (`server`)
//! - Stdio and HTTP transports (`stdio`, `http`)

pub mod error;
pub mod http;
pub mod registry;
pub mod router;
pub mod server;
pub mod stdio;
pub mod tool;
pub mod types;

pub use {
    error::{Error, Result},
    http::{HttpState, build_router, serve_http},
    registry::{
        CapabilityRegistry, InitOutcome, RegistrationError, RegistrationReport, RegistryState,
        RejectReason, ToolHost,
    },
    router::ToolRouter,
    server::McpServer,
    stdio::serve_stdio,
    tool::{RegisteredTool, ToolDescriptor, ToolHandler, ToolSource},
    types::{EmbeddedResource, ServerInfo, ToolContent, ToolsCallResult},
};
