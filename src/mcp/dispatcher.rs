//! Invocation dispatcher
//!
//! Turns a raw request body into exactly one [`InvocationResult`]. Checks run
//! in a fixed order: body shape, credential, tool lookup, input schema, and
//! only then the handler. Nothing below this boundary escapes as an error.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::InvocationError;
use crate::mcp::credential::CredentialGuard;
use crate::mcp::registry::ToolRegistry;
use crate::mcp::types::{CallId, InvocationRequest, InvocationResult};

/// Invocation dispatcher
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    guard: Arc<CredentialGuard>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, guard: Arc<CredentialGuard>) -> Self {
        Self { registry, guard }
    }

    /// Decode and dispatch a raw request body
    pub async fn dispatch(&self, raw: &[u8]) -> InvocationResult {
        let body: Value = match serde_json::from_slice(raw) {
            Ok(body) => body,
            Err(e) => {
                return reject(None, InvocationError::invalid_body(format!("not valid JSON: {}", e)));
            }
        };

        let call_id = CallId::from_body(&body);
        let Value::Object(body) = body else {
            return reject(None, InvocationError::invalid_body("expected a JSON object"));
        };

        match parse_request(body, call_id.clone()) {
            Ok(request) => self.dispatch_request(request).await,
            Err(e) => reject(call_id, e),
        }
    }

    /// Dispatch an already-decoded request
    pub async fn dispatch_request(&self, request: InvocationRequest) -> InvocationResult {
        let call_id = request.call_id.clone();
        let tool = request.tool.clone();

        match self.invoke(request).await {
            Ok(output) => {
                tracing::info!(%tool, call_id = ?call_id, "Tool call succeeded");
                InvocationResult::success(call_id, output)
            }
            Err(e) => {
                tracing::warn!(%tool, call_id = ?call_id, kind = ?e.kind(), error = %e, "Tool call failed");
                InvocationResult::failure(call_id, &e)
            }
        }
    }

    async fn invoke(&self, request: InvocationRequest) -> Result<Value, InvocationError> {
        let credential = self.guard.require()?;

        let entry = self
            .registry
            .get(&request.tool)
            .ok_or_else(|| InvocationError::UnknownTool {
                tool: request.tool.clone(),
            })?;

        entry
            .tool
            .input_schema
            .validate(&request.input)
            .map_err(|message| {
                InvocationError::invalid_body(format!("input for '{}': {}", request.tool, message))
            })?;

        entry
            .handler
            .call(&request.input, credential)
            .await
            .map_err(|e| InvocationError::UpstreamFailure {
                message: e.to_string(),
            })
    }
}

fn reject(call_id: Option<CallId>, error: InvocationError) -> InvocationResult {
    tracing::debug!(call_id = ?call_id, error = %error, "Rejected malformed request");
    InvocationResult::failure(call_id, &error)
}

fn parse_request(
    mut body: Map<String, Value>,
    call_id: Option<CallId>,
) -> Result<InvocationRequest, InvocationError> {
    let tool = match body.remove("tool") {
        Some(Value::String(tool)) if !tool.is_empty() => tool,
        _ => return Err(InvocationError::invalid_body("'tool' must be a non-empty string")),
    };

    let input = match body.remove("input") {
        Some(Value::Object(input)) => input,
        _ => return Err(InvocationError::invalid_body("'input' must be an object")),
    };

    Ok(InvocationRequest {
        tool,
        input,
        call_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;

    use crate::error::{ErrorKind, GithubApiError, Result};
    use crate::mcp::credential::Credential;
    use crate::mcp::registry::ToolHandler;
    use crate::mcp::types::{FieldType, InputSchema, Outcome, Tool};

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ToolHandler for Counting {
        async fn call(&self, input: &Map<String, Value>, credential: &Credential) -> Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GithubApiError::RequestFailed {
                    status: 500,
                    message: "boom".to_string(),
                }
                .into());
            }
            Ok(json!({"owner": input["owner"], "token": credential.as_str()}))
        }
    }

    fn dispatcher(handler: Arc<Counting>, guard: CredentialGuard) -> Dispatcher {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                Tool::new(
                    "list_repos",
                    "List",
                    "",
                    InputSchema::new().required("owner", FieldType::String),
                ),
                handler,
            )
            .unwrap();
        Dispatcher::new(Arc::new(registry), Arc::new(guard))
    }

    fn calls(handler: &Counting) -> usize {
        handler.calls.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_success_echoes_call_id() {
        let handler = Arc::new(Counting::default());
        let d = dispatcher(handler.clone(), CredentialGuard::with_token("t"));
        let result = d
            .dispatch(br#"{"tool":"list_repos","input":{"owner":"octocat"},"call_id":"1"}"#)
            .await;
        assert_eq!(result.call_id, Some(CallId::String("1".into())));
        assert_eq!(
            result.outcome,
            Outcome::Success {
                output: json!({"owner": "octocat", "token": "t"})
            }
        );
        assert_eq!(calls(&handler), 1);
    }

    #[tokio::test]
    async fn test_anonymous_call() {
        let handler = Arc::new(Counting::default());
        let d = dispatcher(handler, CredentialGuard::with_token("t"));
        let result = d
            .dispatch(br#"{"tool":"list_repos","input":{"owner":"octocat"}}"#)
            .await;
        assert!(result.is_success());
        assert!(result.call_id.is_none());
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let handler = Arc::new(Counting::default());
        let d = dispatcher(handler.clone(), CredentialGuard::with_token("t"));
        for body in [&b"not json"[..], &b"[1,2]"[..], &b"\"str\""[..]] {
            let result = d.dispatch(body).await;
            assert_eq!(result.error_kind(), Some(ErrorKind::InvalidRequestBody));
            assert!(result.call_id.is_none());
        }
        assert_eq!(calls(&handler), 0);
    }

    #[tokio::test]
    async fn test_malformed_rejected_before_credential_check() {
        let handler = Arc::new(Counting::default());
        let d = dispatcher(handler.clone(), CredentialGuard::empty());
        let result = d.dispatch(br#"{"tool":"list_repos","call_id":"9"}"#).await;
        assert_eq!(result.error_kind(), Some(ErrorKind::InvalidRequestBody));
        assert_eq!(result.call_id, Some(CallId::String("9".into())));

        let result = d.dispatch(br#"{"tool":"","input":{}}"#).await;
        assert_eq!(result.error_kind(), Some(ErrorKind::InvalidRequestBody));
        assert_eq!(calls(&handler), 0);
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let handler = Arc::new(Counting::default());
        let d = dispatcher(handler.clone(), CredentialGuard::empty());
        let result = d
            .dispatch(br#"{"tool":"list_repos","input":{"owner":"a"},"call_id":3}"#)
            .await;
        assert_eq!(result.error_kind(), Some(ErrorKind::MissingCredential));
        assert_eq!(result.call_id, Some(CallId::Number(3.into())));
        assert_eq!(calls(&handler), 0);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let handler = Arc::new(Counting::default());
        let d = dispatcher(handler.clone(), CredentialGuard::with_token("t"));
        let result = d
            .dispatch(br#"{"tool":"nonexistent","input":{},"call_id":"2"}"#)
            .await;
        assert_eq!(result.error_kind(), Some(ErrorKind::UnknownTool));
        assert_eq!(result.call_id, Some(CallId::String("2".into())));
        assert_eq!(calls(&handler), 0);
    }

    #[tokio::test]
    async fn test_schema_violation_skips_handler() {
        let handler = Arc::new(Counting::default());
        let d = dispatcher(handler.clone(), CredentialGuard::with_token("t"));
        let result = d
            .dispatch(br#"{"tool":"list_repos","input":{"owner":5}}"#)
            .await;
        assert_eq!(result.error_kind(), Some(ErrorKind::InvalidRequestBody));
        assert_eq!(calls(&handler), 0);
    }

    #[tokio::test]
    async fn test_handler_failure_maps_to_upstream() {
        let handler = Arc::new(Counting {
            fail: true,
            ..Default::default()
        });
        let d = dispatcher(handler.clone(), CredentialGuard::with_token("t"));
        let result = d
            .dispatch(br#"{"tool":"list_repos","input":{"owner":"a"},"call_id":"x"}"#)
            .await;
        assert_eq!(result.error_kind(), Some(ErrorKind::UpstreamFailure));
        assert_eq!(result.call_id, Some(CallId::String("x".into())));
        match result.outcome {
            Outcome::Failure { error, .. } => assert!(error.contains("boom")),
            Outcome::Success { .. } => panic!("expected failure"),
        }
        assert_eq!(calls(&handler), 1);
    }
}
