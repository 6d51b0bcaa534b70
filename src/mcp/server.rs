//! MCP Server implementation
//!
//! HTTP transport for discovery and invocation. Discovery is always an SSE
//! channel; invocation replies go through the configured binding.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CACHE_CONTROL;
use axum::http::{HeaderValue, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{stream, StreamExt};

use crate::config::{BindingKind, Config};
use crate::error::Result;
use crate::github::client::GithubClient;
use crate::mcp::credential::CredentialGuard;
use crate::mcp::discovery::{DiscoveryHub, DiscoverySignal};
use crate::mcp::dispatcher::Dispatcher;
use crate::mcp::tools::github_registry;
use crate::mcp::types::{events, InvocationResult};

/// MCP Server info
pub const SERVER_NAME: &str = "github";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const SSE_CACHE_CONTROL: &str = "no-cache, no-transform";

/// Delivers one dispatch result to the caller
pub trait InvocationBinding: Send + Sync {
    fn reply(&self, result: InvocationResult) -> Response;
}

/// Synchronous binding: the result is the response body
pub struct JsonBinding;

/// Streamed binding: the result is a single `mcp.result` event, after which
/// the stream ends
pub struct StreamedBinding;

fn status_for(result: &InvocationResult) -> StatusCode {
    result
        .error_kind()
        .map(|kind| kind.status_code())
        .unwrap_or(StatusCode::OK)
}

impl InvocationBinding for JsonBinding {
    fn reply(&self, result: InvocationResult) -> Response {
        (status_for(&result), Json(result)).into_response()
    }
}

impl InvocationBinding for StreamedBinding {
    fn reply(&self, result: InvocationResult) -> Response {
        let status = status_for(&result);
        let event = Event::default()
            .event(events::RESULT)
            .json_data(&result)
            .unwrap_or_else(|e| Event::default().event(events::ERROR).data(e.to_string()));

        let once = stream::once(async move { Ok::<_, Infallible>(event) });
        let mut response = sse_response(Sse::new(once));
        *response.status_mut() = status;
        response
    }
}

pub fn binding_for(kind: BindingKind) -> Arc<dyn InvocationBinding> {
    match kind {
        BindingKind::Json => Arc::new(JsonBinding),
        BindingKind::Sse => Arc::new(StreamedBinding),
    }
}

/// Shared handler state
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub discovery: DiscoveryHub,
    pub binding: Arc<dyn InvocationBinding>,
}

/// MCP Server for GitHub
#[derive(Clone)]
pub struct McpServer {
    state: Arc<AppState>,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(dispatcher: Dispatcher, discovery: DiscoveryHub, binding: BindingKind) -> Self {
        Self {
            state: Arc::new(AppState {
                dispatcher,
                discovery,
                binding: binding_for(binding),
            }),
        }
    }

    /// Wire the GitHub tools, credential and transports from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Arc::new(GithubClient::from_config(config));
        let registry = Arc::new(github_registry(client)?);
        let guard = Arc::new(CredentialGuard::new(config.github_token.clone()));

        if !guard.is_configured() {
            tracing::warn!("GITHUB_TOKEN is not set; every request will be rejected");
        }

        let dispatcher = Dispatcher::new(registry.clone(), guard.clone());
        let discovery = DiscoveryHub::new(registry, guard, config.ping_interval);
        Ok(Self::new(dispatcher, discovery, config.binding))
    }

    pub fn discovery(&self) -> &DiscoveryHub {
        &self.state.discovery
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(discovery_handler).post(invoke_handler))
            .route("/sse", get(discovery_handler))
            .route("/invoke", post(invoke_handler))
            .with_state(self.state.clone())
    }

    /// Serve until ctrl-c, then close discovery channels and drain
    pub async fn run(self, addr: SocketAddr) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(
            %addr,
            name = SERVER_NAME,
            version = SERVER_VERSION,
            "MCP server listening"
        );

        let state = self.state.clone();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "Failed to listen for shutdown signal");
                }
                tracing::info!("Shutting down");
                state.discovery.shutdown();
            })
            .await?;

        Ok(())
    }
}

fn sse_response(sse: impl IntoResponse) -> Response {
    let mut response = sse.into_response();
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static(SSE_CACHE_CONTROL));
    response
}

fn to_event(signal: &DiscoverySignal) -> Event {
    Event::default()
        .event(signal.event_name())
        .data(signal.payload().to_string())
}

async fn discovery_handler(State(state): State<Arc<AppState>>) -> Response {
    let channel = state.discovery.open();
    let stream = channel.map(|signal| Ok::<_, Infallible>(to_event(&signal)));
    sse_response(Sse::new(stream))
}

async fn invoke_handler(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let result = state.dispatcher.dispatch(&body).await;
    state.binding.reply(result)
}
