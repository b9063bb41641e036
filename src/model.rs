//! Request and response types exchanged with the model server.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;

/// Conversation role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single conversation turn, for building conversations in code.
///
/// Turns received from callers are never parsed into this type; see
/// [`Conversation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

impl From<Message> for Value {
    fn from(message: Message) -> Self {
        let mut turn = Map::new();
        turn.insert("role".into(), Value::String(message.role.as_str().to_string()));
        turn.insert("content".into(), Value::String(message.content));
        Value::Object(turn)
    }
}

/// Chronologically ordered list of turns.
///
/// Each turn is forwarded to the backend exactly as the caller sent it, so
/// fields such as `images` or `tool_calls` and roles such as `tool` survive.
pub type Conversation = Vec<Value>;

/// One entry of the `/api/tags` listing.
///
/// `name` is whatever the entry carried, if anything; everything else is
/// kept verbatim.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl ModelSummary {
    /// The model name, when the entry carried one as a string.
    pub fn name_str(&self) -> Option<&str> {
        self.name.as_ref().and_then(Value::as_str)
    }
}

/// Body of `GET /api/tags`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelSummary>,
}

/// A fully resolved chat request.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    /// Never empty once produced by the normalizer.
    pub model: String,
    pub messages: Conversation,
    pub system: Option<String>,
    pub stream: bool,
    /// Extra body fields, merged over `model`, `messages` and `stream`.
    pub extra: Map<String, Value>,
}

impl BackendRequest {
    pub fn new(model: impl Into<String>, messages: Conversation) -> Self {
        Self {
            model: model.into(),
            messages,
            system: None,
            stream: false,
            extra: Map::new(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// A raw-prompt generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub extra: Map<String, Value>,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: false,
            extra: Map::new(),
        }
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_wire_format() {
        let msg = Message::user("Hello");
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({"role": "user", "content": "Hello"})
        );

        let parsed: Message =
            serde_json::from_value(json!({"role": "assistant", "content": "Hi"})).unwrap();
        assert_eq!(parsed.role, Role::Assistant);

        assert_eq!(Value::from(Message::system("Be brief.")), json!({"role": "system", "content": "Be brief."}));
    }

    #[test]
    fn test_model_summary_keeps_unknown_fields() {
        let summary: ModelSummary = serde_json::from_value(json!({
            "name": "llama3:latest",
            "size": 4661224676u64,
            "digest": "abc"
        }))
        .unwrap();

        assert_eq!(summary.name_str(), Some("llama3:latest"));
        assert_eq!(summary.details.get("digest"), Some(&json!("abc")));
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            json!({"name": "llama3:latest", "size": 4661224676u64, "digest": "abc"})
        );
    }

    #[test]
    fn test_model_summary_name_kept_as_sent() {
        let unnamed: ModelSummary = serde_json::from_value(json!({"size": 1})).unwrap();
        assert_eq!(unnamed.name, None);
        assert_eq!(serde_json::to_value(&unnamed).unwrap(), json!({"size": 1}));

        let numeric: ModelSummary = serde_json::from_value(json!({"name": 7})).unwrap();
        assert_eq!(numeric.name, Some(json!(7)));
        assert_eq!(numeric.name_str(), None);
    }
}
