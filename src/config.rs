//! Configuration management for the GitHub MCP Server
//!
//! Handles environment variables and configuration loading. Everything here is
//! read once at startup; nothing consults the process environment afterwards.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConfigError, GithubMcpError, Result};

/// How invocation replies are delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BindingKind {
    /// One JSON reply per request
    #[default]
    Json,
    /// One `mcp.result` event on a stream that closes right after
    Sse,
}

impl FromStr for BindingKind {
    type Err = GithubMcpError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(BindingKind::Json),
            "sse" | "stream" => Ok(BindingKind::Sse),
            other => Err(invalid(format!("unknown binding '{}'", other))),
        }
    }
}

/// Configuration for the GitHub MCP Server
#[derive(Clone)]
pub struct Config {
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,

    /// Upstream credential, if one was provided
    pub github_token: Option<String>,

    /// Base URL of the GitHub REST API
    pub api_base_url: String,

    /// User-Agent sent to GitHub
    pub user_agent: String,

    /// Cadence of liveness signals on discovery channels
    pub ping_interval: Duration,

    /// Invocation binding served on POST routes
    pub binding: BindingKind,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("github_token", &self.github_token.as_ref().map(|_| "<redacted>"))
            .field("api_base_url", &self.api_base_url)
            .field("user_agent", &self.user_agent)
            .field("ping_interval", &self.ping_interval)
            .field("binding", &self.binding)
            .finish()
    }
}

impl Config {
    /// Load configuration from the process environment, letting the caller
    /// override fields before validation
    pub fn from_env(overrides: impl FnOnce(&mut Self)) -> Result<Self> {
        Self::from_lookup_with(|key| std::env::var(key).ok(), overrides)
    }

    /// Build a configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup_with(lookup, |_| {})
    }

    /// Build from a lookup, apply overrides, then validate the result once
    pub fn from_lookup_with<F, O>(lookup: F, overrides: O) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
        O: FnOnce(&mut Self),
    {
        let mut config = Self::read(lookup)?;
        overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn read<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let github_token = lookup("GITHUB_TOKEN").filter(|t| !t.trim().is_empty());

        let api_base_url = lookup("GITHUB_API_URL")
            .unwrap_or_else(|| github::API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let bind_addr = match lookup("MCP_BIND_ADDR") {
            Some(addr) => addr
                .parse()
                .map_err(|_| invalid(format!("invalid MCP_BIND_ADDR '{}'", addr)))?,
            None => SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
        };

        let ping_interval = match lookup("MCP_PING_INTERVAL_SECS") {
            Some(secs) => {
                let secs: u64 = secs
                    .parse()
                    .map_err(|_| invalid(format!("invalid MCP_PING_INTERVAL_SECS '{}'", secs)))?;
                Duration::from_secs(secs)
            }
            None => DEFAULT_PING_INTERVAL,
        };

        let binding = match lookup("MCP_BINDING") {
            Some(b) => b.parse()?,
            None => BindingKind::default(),
        };

        let user_agent =
            lookup("MCP_USER_AGENT").unwrap_or_else(|| github::USER_AGENT.to_string());

        Ok(Self {
            bind_addr,
            github_token,
            api_base_url,
            user_agent,
            ping_interval,
            binding,
        })
    }

    /// Check invariants that individual fields can't express
    pub fn validate(&self) -> Result<()> {
        if self.ping_interval.is_zero() {
            return Err(invalid("ping interval must be non-zero"));
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(invalid(format!(
                "GitHub API URL must be http(s): {}",
                self.api_base_url
            )));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> GithubMcpError {
    GithubMcpError::Config(ConfigError::InvalidConfig {
        message: message.into(),
    })
}

/// Default listen port
pub const DEFAULT_PORT: u16 = 3000;

/// Default liveness cadence on discovery channels
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(15);

/// GitHub API constants
pub mod github {
    /// Base URL for GitHub REST API
    pub const API_BASE_URL: &str = "https://api.github.com";

    /// Default User-Agent; GitHub rejects requests without one
    pub const USER_AGENT: &str = "mcp-github-rust";

    /// Media type requested from the API
    pub const ACCEPT: &str = "application/vnd.github+json";
}
