//! Tool registry
//!
//! Ordered catalog of invocable tools. Built once at startup and shared
//! read-only afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{RegistryError, Result};
use crate::mcp::credential::Credential;
use crate::mcp::types::{DiscoverySnapshot, Tool};

/// Executes one tool against the upstream service.
///
/// Implementations get input that already passed the tool's schema check and
/// must not retry in a way that hides partial failures.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, input: &Map<String, Value>, credential: &Credential) -> Result<Value>;
}

/// A descriptor paired with its handler
pub struct RegisteredTool {
    pub tool: Tool,
    pub handler: Arc<dyn ToolHandler>,
}

/// Tool registry
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool; ids must be unique
    pub fn register(&mut self, tool: Tool, handler: Arc<dyn ToolHandler>) -> Result<()> {
        if self.index.contains_key(&tool.id) {
            return Err(RegistryError::DuplicateTool { id: tool.id }.into());
        }
        self.index.insert(tool.id.clone(), self.tools.len());
        self.tools.push(RegisteredTool { tool, handler });
        Ok(())
    }

    /// Tool descriptors in registration order
    pub fn list(&self) -> impl Iterator<Item = &Tool> {
        self.tools.iter().map(|entry| &entry.tool)
    }

    pub fn get(&self, id: &str) -> Option<&RegisteredTool> {
        self.index.get(id).map(|&i| &self.tools[i])
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Copy of the catalog for a discovery announcement
    pub fn snapshot(&self) -> DiscoverySnapshot {
        DiscoverySnapshot {
            tools: self.list().cloned().collect(),
        }
    }
}
