//! GitHub API type definitions
//!
//! Repository listings are passed through untouched, so only the contents
//! entry is modelled here.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An entry from the repository contents endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentEntry {
    /// File or directory name
    pub name: String,

    /// Path relative to the repository root
    pub path: String,

    /// Entry kind ("file", "dir", "symlink", "submodule")
    #[serde(rename = "type")]
    pub kind: String,

    /// Size in bytes
    #[serde(default)]
    pub size: u64,

    /// Content encoding, usually "base64" for files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,

    /// Encoded content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ContentEntry {
    /// Decode the file content as UTF-8 text.
    ///
    /// GitHub wraps base64 content at 60 columns, so whitespace is stripped
    /// before decoding. Binary files yield `None`.
    pub fn decoded_text(&self) -> Option<String> {
        if self.kind != "file" || self.encoding.as_deref() != Some("base64") {
            return None;
        }
        let compact: String = self
            .content
            .as_deref()?
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let bytes = STANDARD.decode(compact).ok()?;
        String::from_utf8(bytes).ok()
    }
}

/// Attach a `decoded_content` field to a contents payload when it is a
/// text file. Directory listings and binary files are returned as-is.
pub fn with_decoded_content(mut payload: Value) -> Value {
    let decoded = serde_json::from_value::<ContentEntry>(payload.clone())
        .ok()
        .and_then(|entry| entry.decoded_text());

    if let (Some(text), Some(obj)) = (decoded, payload.as_object_mut()) {
        obj.insert("decoded_content".to_string(), Value::String(text));
    }
    payload
}
