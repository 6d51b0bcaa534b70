//! GitHub API module
//!
//! Contains types and the REST client the tool handlers call upstream.

pub mod client;
pub mod types;
