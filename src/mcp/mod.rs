//! MCP (Model Context Protocol) module
//!
//! Tool registry, credential guard, dispatcher, discovery channels and the
//! HTTP transports built on them.

pub mod credential;
pub mod discovery;
pub mod dispatcher;
pub mod registry;
pub mod server;
pub mod tools;
pub mod types;
