//! GitHub MCP Server Library
//!
//! A Model Context Protocol (MCP) server exposing GitHub tools over HTTP.
//! Tools are announced on an SSE discovery channel and invoked with JSON
//! requests answered either directly or as a single streamed event.

pub mod config;
pub mod error;
pub mod github;
pub mod mcp;

pub use config::Config;
pub use error::{GithubMcpError, Result};
