//! MCP Tool definitions and handlers
//!
//! Defines the GitHub tools, their input schemas and the handlers that call
//! the GitHub client.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::github::client::GithubClient;
use crate::mcp::credential::Credential;
use crate::mcp::registry::{ToolHandler, ToolRegistry};
use crate::mcp::types::{FieldType, InputSchema, Tool};

pub const LIST_REPOS: &str = "list_repos";
pub const READ_FILE: &str = "read_file";

/// Descriptor for `list_repos`
pub fn list_repos_tool() -> Tool {
    Tool::new(
        LIST_REPOS,
        "List GitHub repositories",
        "Lists public repositories for a user.",
        InputSchema::new().required("owner", FieldType::String),
    )
}

/// Descriptor for `read_file`
pub fn read_file_tool() -> Tool {
    Tool::new(
        READ_FILE,
        "Read GitHub file",
        "Reads a file from a repository.",
        InputSchema::new()
            .required("owner", FieldType::String)
            .required("repo", FieldType::String)
            .required("path", FieldType::String),
    )
}

/// Build the registry served by this process
pub fn github_registry(client: Arc<GithubClient>) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(list_repos_tool(), Arc::new(ListRepos::new(client.clone())))?;
    registry.register(read_file_tool(), Arc::new(ReadFile::new(client)))?;
    Ok(registry)
}

/// Lists a user's public repositories
pub struct ListRepos {
    client: Arc<GithubClient>,
}

impl ListRepos {
    pub fn new(client: Arc<GithubClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for ListRepos {
    async fn call(&self, input: &Map<String, Value>, credential: &Credential) -> Result<Value> {
        #[derive(Deserialize)]
        struct Args {
            owner: String,
        }

        let args: Args = serde_json::from_value(Value::Object(input.clone()))?;
        self.client.list_repos(&args.owner, credential.as_str()).await
    }
}

/// Reads one path from a repository
pub struct ReadFile {
    client: Arc<GithubClient>,
}

impl ReadFile {
    pub fn new(client: Arc<GithubClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for ReadFile {
    async fn call(&self, input: &Map<String, Value>, credential: &Credential) -> Result<Value> {
        #[derive(Deserialize)]
        struct Args {
            owner: String,
            repo: String,
            path: String,
        }

        let args: Args = serde_json::from_value(Value::Object(input.clone()))?;
        self.client
            .read_file(&args.owner, &args.repo, &args.path, credential.as_str())
            .await
    }
}
