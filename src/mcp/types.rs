//! MCP protocol type definitions
//!
//! Tool descriptors, invocation envelopes and discovery signals, with the
//! exact wire shapes clients see.

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{ErrorKind, InvocationError};

/// Primitive type tag for a tool input field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
}

impl FieldType {
    /// Check whether a JSON value carries this primitive type
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Boolean => value.is_boolean(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
        }
    }
}

/// One declared input field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldType,
    pub required: bool,
    pub description: Option<String>,
}

/// Structural description of a tool's expected input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSchema {
    fields: Vec<FieldSpec>,
}

impl InputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a required field
    pub fn required(mut self, name: impl Into<String>, kind: FieldType) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            kind,
            required: true,
            description: None,
        });
        self
    }

    /// Declare an optional field
    pub fn optional(mut self, name: impl Into<String>, kind: FieldType) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            kind,
            required: false,
            description: None,
        });
        self
    }

    /// Attach a description to the most recently declared field
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.description = Some(description.into());
        }
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Validate an input object against the declared fields.
    ///
    /// Required fields must be present and non-null; declared fields that are
    /// present must match their type. Undeclared fields pass through.
    pub fn validate(&self, input: &Map<String, Value>) -> Result<(), String> {
        for field in &self.fields {
            match input.get(&field.name) {
                None | Some(Value::Null) if field.required => {
                    return Err(format!("missing required field '{}'", field.name));
                }
                None | Some(Value::Null) => {}
                Some(value) if !field.kind.accepts(value) => {
                    return Err(format!(
                        "field '{}' must be of type {}",
                        field.name,
                        field.kind.as_str()
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Serialized as a JSON-Schema object, which is what clients expect under
/// `inputs` in the discovery payload.
impl Serialize for InputSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut properties = Map::new();
        for field in &self.fields {
            let mut prop = json!({ "type": field.kind.as_str() });
            if let Some(description) = &field.description {
                prop["description"] = Value::String(description.clone());
            }
            properties.insert(field.name.clone(), prop);
        }
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("type", "object")?;
        map.serialize_entry("properties", &properties)?;
        map.serialize_entry("required", &required)?;
        map.end()
    }
}

/// Tool descriptor
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    /// Unique key used by invocation requests
    pub id: String,

    /// Display name
    pub name: String,

    /// Tool description
    pub description: String,

    /// Expected input
    #[serde(rename = "inputs")]
    pub input_schema: InputSchema,
}

impl Tool {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: InputSchema,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Caller-supplied correlation token, echoed back verbatim
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum CallId {
    String(String),
    Number(serde_json::Number),
}

impl CallId {
    /// Pull a correlation token out of an arbitrary body, if it has a usable one
    pub fn from_body(body: &Value) -> Option<Self> {
        body.get("call_id")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallId::String(s) => f.write_str(s),
            CallId::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Invocation request envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationRequest {
    /// Tool id
    pub tool: String,

    /// Tool input
    pub input: Map<String, Value>,

    /// Optional correlation token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<CallId>,
}

/// Either the tool's payload or a classified failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    Failure { error: String, kind: ErrorKind },
    Success { output: Value },
}

/// Invocation result envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<CallId>,

    #[serde(flatten)]
    pub outcome: Outcome,
}

impl InvocationResult {
    pub fn success(call_id: Option<CallId>, output: Value) -> Self {
        Self {
            call_id,
            outcome: Outcome::Success { output },
        }
    }

    pub fn failure(call_id: Option<CallId>, error: &InvocationError) -> Self {
        Self {
            call_id,
            outcome: Outcome::Failure {
                error: error.to_string(),
                kind: error.kind(),
            },
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match &self.outcome {
            Outcome::Failure { kind, .. } => Some(*kind),
            Outcome::Success { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }
}

/// Registry contents as announced on a discovery channel
#[derive(Debug, Clone, Serialize)]
pub struct DiscoverySnapshot {
    pub tools: Vec<Tool>,
}

/// Periodic liveness signal; `t` is milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LivenessSignal {
    pub t: u64,
}

/// Event names used on SSE streams
pub mod events {
    pub const TOOLS: &str = "mcp.tools";
    pub const PING: &str = "ping";
    pub const ERROR: &str = "error";
    pub const RESULT: &str = "mcp.result";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo_schema() -> InputSchema {
        InputSchema::new()
            .required("owner", FieldType::String)
            .optional("per_page", FieldType::Integer)
    }

    #[test]
    fn test_schema_serialization() {
        let value = serde_json::to_value(repo_schema()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "object",
                "properties": {
                    "owner": {"type": "string"},
                    "per_page": {"type": "integer"}
                },
                "required": ["owner"]
            })
        );
    }

    #[test]
    fn test_schema_validation() {
        let schema = repo_schema();
        let ok = json!({"owner": "octocat", "extra": true});
        assert!(schema.validate(ok.as_object().unwrap()).is_ok());

        let missing = json!({});
        let err = schema.validate(missing.as_object().unwrap()).unwrap_err();
        assert!(err.contains("owner"));

        let wrong_type = json!({"owner": 42});
        assert!(schema.validate(wrong_type.as_object().unwrap()).is_err());

        let bad_optional = json!({"owner": "a", "per_page": 1.5});
        assert!(schema.validate(bad_optional.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_tool_wire_shape() {
        let tool = Tool::new("list_repos", "List", "Lists repos", repo_schema());
        let value = serde_json::to_value(&tool).unwrap();
        assert_eq!(value["id"], "list_repos");
        assert!(value["inputs"].is_object());
        assert!(value.get("input_schema").is_none());
    }

    #[test]
    fn test_success_envelope() {
        let result = InvocationResult::success(Some(CallId::String("1".into())), json!([1, 2]));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value, json!({"call_id": "1", "output": [1, 2]}));
    }

    #[test]
    fn test_failure_envelope_without_call_id() {
        let result = InvocationResult::failure(None, &InvocationError::MissingCredential);
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("call_id").is_none());
        assert!(value.get("output").is_none());
        assert_eq!(value["kind"], "missing_credential");
        assert_eq!(value["error"], "Missing GITHUB_TOKEN");
    }

    #[test]
    fn test_envelope_parses_back() {
        let parsed: InvocationResult =
            serde_json::from_value(json!({"call_id": 7, "error": "Unknown tool: x", "kind": "unknown_tool"}))
                .unwrap();
        assert_eq!(parsed.call_id, Some(CallId::Number(7.into())));
        assert_eq!(parsed.error_kind(), Some(ErrorKind::UnknownTool));
    }

    #[test]
    fn test_call_id_from_body() {
        assert_eq!(
            CallId::from_body(&json!({"call_id": "abc"})),
            Some(CallId::String("abc".into()))
        );
        assert_eq!(CallId::from_body(&json!({"call_id": [1]})), None);
        assert_eq!(CallId::from_body(&json!({"call_id": null})), None);
    }

    #[test]
    fn test_numeric_call_id_echoed_as_sent() {
        for raw in [json!(2.5), json!(u64::MAX), json!(-4)] {
            let call_id = CallId::from_body(&json!({ "call_id": raw.clone() }));
            assert!(call_id.is_some(), "dropped {}", raw);
            let result = InvocationResult::success(call_id, json!(null));
            assert_eq!(serde_json::to_value(&result).unwrap()["call_id"], raw);
        }
        assert_eq!(CallId::from_body(&json!({})), None);
    }
}
