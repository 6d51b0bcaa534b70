//! GitHub MCP Server - Rust Implementation
//!
//! A Model Context Protocol (MCP) server exposing GitHub tools over HTTP.

use std::net::SocketAddr;

use anyhow::Context;
use clap::{Parser, Subcommand};

use github_mcp_server::config::{BindingKind, Config};
use github_mcp_server::mcp::server::McpServer;

/// GitHub MCP Server
#[derive(Parser)]
#[command(name = "github-mcp-server")]
#[command(author, version, about = "GitHub MCP Server - A Model Context Protocol server for GitHub")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Address to listen on (overrides MCP_BIND_ADDR)
    #[arg(long, global = true)]
    bind: Option<SocketAddr>,

    /// Invocation binding (overrides MCP_BINDING)
    #[arg(long, value_enum, global = true)]
    binding: Option<BindingKind>,

    /// Seconds between discovery pings (overrides MCP_PING_INTERVAL_SECS)
    #[arg(long, global = true)]
    ping_interval: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the tool catalog as announced on discovery channels
    Tools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env(|config| {
        if let Some(bind) = cli.bind {
            config.bind_addr = bind;
        }
        if let Some(binding) = cli.binding {
            config.binding = binding;
        }
        if let Some(secs) = cli.ping_interval {
            config.ping_interval = std::time::Duration::from_secs(secs);
        }
    })
    .context("failed to load configuration")?;

    tracing::debug!(?config, "Configuration loaded");

    let server = McpServer::from_config(&config).context("failed to build server")?;

    match cli.command {
        Some(Commands::Tools) => {
            let snapshot = server.discovery().snapshot();
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        None => {
            server
                .run(config.bind_addr)
                .await
                .with_context(|| format!("server on {} failed", config.bind_addr))?;
        }
    }

    Ok(())
}
