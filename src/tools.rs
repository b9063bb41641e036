//! Tool result contract shared by every tool handler.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;

pub const CHAT_TOOL: &str = "chat";
pub const LIST_MODELS_TOOL: &str = "list_models";

/// Error type for name-based tool dispatch.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

/// Failure half of [`ToolResult`].
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub error: String,
    pub message: Option<String>,
    pub details: Option<Value>,
}

/// Outcome of a tool call. Handlers return exactly one of these and never
/// let an error escape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolResult {
    Success(Map<String, Value>),
    Failure(ToolFailure),
}

impl ToolResult {
    /// Wrap a JSON object payload. Non-object values land under `result`.
    pub fn success(payload: Value) -> Self {
        match payload {
            Value::Object(map) => ToolResult::Success(map),
            other => {
                let mut map = Map::new();
                map.insert("result".into(), other);
                ToolResult::Success(map)
            }
        }
    }

    pub fn failure(error: impl Into<String>, message: impl Into<String>) -> Self {
        ToolResult::Failure(ToolFailure {
            error: error.into(),
            message: Some(message.into()),
            details: None,
        })
    }

    /// The backend answered, but not with the expected document shape.
    pub fn unexpected_format(details: Value) -> Self {
        ToolResult::Failure(ToolFailure {
            error: "Unexpected response format".to_string(),
            message: None,
            details: Some(details),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ToolResult::Success(_))
    }

    pub fn into_value(self) -> Value {
        match self {
            ToolResult::Success(map) => Value::Object(map),
            ToolResult::Failure(failure) => serde_json::to_value(failure).unwrap_or(Value::Null),
        }
    }
}
