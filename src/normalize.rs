//! Normalization of loosely-typed tool arguments into a [`BackendRequest`].
//!
//! Callers of the `chat` tool are frequently other agents, so the context may
//! arrive as a JSON object, as a JSON-encoded string, as free text or as an
//! object that already knows how to look resources up. Messages may arrive as
//! an array, as a JSON-encoded array or as a bare string. Everything is
//! resolved here, once, into [`CallContext`] and [`Conversation`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::config::Config;
use crate::model::{BackendRequest, Conversation, Message};

/// Resource names consulted by the normalizer.
pub const MODEL_RESOURCE: &str = "model";
pub const SYSTEM_PROMPT_RESOURCE: &str = "system_prompt";

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("No model specified and no default model configured")]
    MissingModel,
}

/// Anything able to answer resource lookups for a call.
pub trait ResourceLookup: Send + Sync {
    /// Look a resource up by URI (`mcp://resources/model`) or bare name (`model`).
    fn get_resource(&self, uri: &str) -> Option<String>;

    /// Session the call belongs to, when known.
    fn session_id(&self) -> Option<String> {
        None
    }
}

/// Context argument as received from the caller.
#[derive(Clone)]
pub enum RawContext {
    /// A JSON-encoded object or free text.
    Text(String),
    Object(Map<String, Value>),
    Capability(Arc<dyn ResourceLookup>),
    Empty,
}

impl fmt::Debug for RawContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawContext::Text(s) => f.debug_tuple("Text").field(s).finish(),
            RawContext::Object(m) => f.debug_tuple("Object").field(m).finish(),
            RawContext::Capability(_) => f.write_str("Capability(..)"),
            RawContext::Empty => f.write_str("Empty"),
        }
    }
}

impl From<Value> for RawContext {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => RawContext::Text(s),
            Value::Object(map) => RawContext::Object(map),
            _ => RawContext::Empty,
        }
    }
}

impl From<Option<Value>> for RawContext {
    fn from(value: Option<Value>) -> Self {
        value.map(RawContext::from).unwrap_or(RawContext::Empty)
    }
}

impl From<&str> for RawContext {
    fn from(s: &str) -> Self {
        RawContext::Text(s.to_string())
    }
}

impl From<String> for RawContext {
    fn from(s: String) -> Self {
        RawContext::Text(s)
    }
}

impl From<Arc<dyn ResourceLookup>> for RawContext {
    fn from(lookup: Arc<dyn ResourceLookup>) -> Self {
        RawContext::Capability(lookup)
    }
}

/// Messages argument as received from the caller.
#[derive(Debug, Clone)]
pub enum RawMessages {
    /// A JSON-encoded array or a bare user prompt.
    Text(String),
    Value(Value),
}

impl From<Value> for RawMessages {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => RawMessages::Text(s),
            other => RawMessages::Value(other),
        }
    }
}

impl From<&str> for RawMessages {
    fn from(s: &str) -> Self {
        RawMessages::Text(s.to_string())
    }
}

impl From<String> for RawMessages {
    fn from(s: String) -> Self {
        RawMessages::Text(s)
    }
}

impl From<Vec<Message>> for RawMessages {
    fn from(messages: Vec<Message>) -> Self {
        RawMessages::Value(Value::Array(messages.into_iter().map(Value::from).collect()))
    }
}

/// Per-call session and resource overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct CallContext {
    pub session_id: String,
    /// Keyed by the last path segment of the resource URI.
    pub resources: HashMap<String, String>,
    /// Free-text context, when the caller sent something that was not JSON.
    pub description: Option<String>,
}

impl Default for CallContext {
    fn default() -> Self {
        Self::from_map(Map::new())
    }
}

impl CallContext {
    /// Build a context from a decoded context object.
    ///
    /// An absent or null `session_id` is replaced by a fresh UUID; any other
    /// value, including an empty string, is kept. Non-string resource values
    /// are kept in their JSON text form; nulls are dropped.
    pub fn from_map(map: Map<String, Value>) -> Self {
        let session_id = match map.get("session_id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => Uuid::new_v4().to_string(),
            Some(v) => v.to_string(),
        };

        let resources = match map.get("resources") {
            Some(Value::Object(entries)) => entries
                .iter()
                .filter_map(|(k, v)| {
                    let value = match v {
                        Value::Null => return None,
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    Some((resource_key(k).to_string(), value))
                })
                .collect(),
            _ => HashMap::new(),
        };

        let description = map
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            session_id,
            resources,
            description,
        }
    }

    /// Snapshot the resources this crate consults from a lookup capability.
    pub fn from_lookup(lookup: &dyn ResourceLookup) -> Self {
        let resources = [MODEL_RESOURCE, SYSTEM_PROMPT_RESOURCE]
            .into_iter()
            .filter_map(|name| lookup.get_resource(name).map(|v| (name.to_string(), v)))
            .collect();

        Self {
            session_id: lookup
                .session_id()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            resources,
            description: None,
        }
    }

    pub fn with_resource(mut self, name: &str, value: impl Into<String>) -> Self {
        self.resources
            .insert(resource_key(name).to_string(), value.into());
        self
    }

    /// Look a resource up by URI or name; empty values count as absent.
    pub fn resource(&self, uri: &str) -> Option<&str> {
        self.resources
            .get(resource_key(uri))
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

impl ResourceLookup for CallContext {
    fn get_resource(&self, uri: &str) -> Option<String> {
        self.resources.get(resource_key(uri)).cloned()
    }

    fn session_id(&self) -> Option<String> {
        Some(self.session_id.clone())
    }
}

/// `scheme://resources/model` and `model` both resolve to `model`.
pub fn resource_key(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

/// Resolve any accepted context shape into a [`CallContext`].
pub fn resolve_context(raw: RawContext) -> CallContext {
    match raw {
        RawContext::Capability(lookup) => CallContext::from_lookup(lookup.as_ref()),
        RawContext::Text(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => CallContext::from_map(map),
            Ok(_) => CallContext::from_map(Map::new()),
            Err(_) => {
                tracing::debug!("Context is not JSON, treating it as a description");
                let mut map = Map::new();
                map.insert("description".into(), Value::String(text));
                CallContext::from_map(map)
            }
        },
        RawContext::Object(map) => CallContext::from_map(map),
        RawContext::Empty => CallContext::from_map(Map::new()),
    }
}

/// Resolve any accepted messages shape into a [`Conversation`].
///
/// Never fails. A sequence is used as-is, element by element, with no
/// validation; anything else degrades to a single user turn.
pub fn resolve_messages(raw: RawMessages) -> Conversation {
    let value = match raw {
        RawMessages::Text(text) => match serde_json::from_str::<Value>(&text) {
            Ok(decoded) => decoded,
            Err(_) => {
                tracing::debug!("Messages are not JSON, wrapping as a single user turn");
                return vec![Message::user(text).into()];
            }
        },
        RawMessages::Value(value) => value,
    };

    match value {
        Value::Array(items) => items,
        Value::String(s) => vec![Message::user(s).into()],
        other => vec![Message::user(other.to_string()).into()],
    }
}

/// Output of [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCall {
    pub context: CallContext,
    pub request: BackendRequest,
}

/// Turn raw `chat` arguments into a dispatchable request.
///
/// The model comes from the `model` resource, else `config.default_model`.
/// A non-empty `system_prompt` resource becomes the request's `system`.
/// The request is non-streaming with no extra parameters.
pub fn normalize(
    context: RawContext,
    messages: RawMessages,
    config: &Config,
) -> Result<NormalizedCall, NormalizeError> {
    let context = resolve_context(context);
    let messages = resolve_messages(messages);

    let model = context
        .resource(MODEL_RESOURCE)
        .unwrap_or(config.default_model.as_str())
        .trim()
        .to_string();
    if model.is_empty() {
        return Err(NormalizeError::MissingModel);
    }

    let mut request = BackendRequest::new(model, messages);
    if let Some(system) = context.resource(SYSTEM_PROMPT_RESOURCE) {
        request = request.with_system(system);
    }

    tracing::debug!(
        "Normalized call {}: model={} messages={}",
        context.session_id,
        request.model,
        request.messages.len()
    );

    Ok(NormalizedCall { context, request })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedLookup;

    impl ResourceLookup for FixedLookup {
        fn get_resource(&self, uri: &str) -> Option<String> {
            (resource_key(uri) == "model").then(|| "phi3".to_string())
        }

        fn session_id(&self) -> Option<String> {
            Some("fixed".to_string())
        }
    }

    #[test]
    fn test_context_from_json_string() {
        let ctx = resolve_context(RawContext::from(
            r#"{"session_id":"user123","resources":{"model":"llama3.3:latest"}}"#,
        ));
        assert_eq!(ctx.session_id, "user123");
        assert_eq!(ctx.resource("mcp://resources/model"), Some("llama3.3:latest"));
    }

    #[test]
    fn test_context_session_id_kept_unless_absent() {
        let ctx = resolve_context(RawContext::from(json!({"session_id": ""})));
        assert_eq!(ctx.session_id, "");

        let ctx = resolve_context(RawContext::from(json!({"session_id": null})));
        assert!(Uuid::parse_str(&ctx.session_id).is_ok());

        let ctx = resolve_context(RawContext::from(json!({"session_id": 17})));
        assert_eq!(ctx.session_id, "17");
    }

    #[test]
    fn test_context_from_free_text() {
        let ctx = resolve_context(RawContext::from("talking about rust"));
        assert_eq!(ctx.description.as_deref(), Some("talking about rust"));
        assert!(ctx.resources.is_empty());
        assert!(Uuid::parse_str(&ctx.session_id).is_ok());
    }

    #[test]
    fn test_context_non_object_values_are_empty() {
        let ctx = resolve_context(RawContext::from(json!(42)));
        assert!(ctx.resources.is_empty());

        let ctx = resolve_context(RawContext::from("[1,2]"));
        assert!(ctx.resources.is_empty());
    }

    #[test]
    fn test_context_resource_keys_use_last_segment() {
        let ctx = resolve_context(RawContext::from(json!({
            "resources": {"mcp://resources/model": "qwen2", "system_prompt": null}
        })));
        assert_eq!(ctx.resource("model"), Some("qwen2"));
        assert_eq!(ctx.resource("system_prompt"), None);
    }

    #[test]
    fn test_context_from_capability() {
        let lookup: Arc<dyn ResourceLookup> = Arc::new(FixedLookup);
        let ctx = resolve_context(RawContext::from(lookup));
        assert_eq!(ctx.session_id, "fixed");
        assert_eq!(ctx.resource("model"), Some("phi3"));
        assert_eq!(ctx.resource("system_prompt"), None);
    }

    #[test]
    fn test_messages_bare_string() {
        let messages = resolve_messages(RawMessages::from("hello there"));
        assert_eq!(messages, vec![json!({"role": "user", "content": "hello there"})]);
    }

    #[test]
    fn test_messages_fallback_is_idempotent() {
        let first = resolve_messages(RawMessages::from("not { json"));
        let again = resolve_messages(RawMessages::from(Value::Array(first.clone())));
        assert_eq!(first, again);

        let encoded = serde_json::to_string(&first).unwrap();
        assert_eq!(resolve_messages(RawMessages::from(encoded)), first);
    }

    #[test]
    fn test_messages_json_array_string_keeps_order() {
        let messages = resolve_messages(RawMessages::from(
            r#"[{"role":"system","content":"s"},{"role":"user","content":"u"},{"role":"assistant","content":"a"}]"#,
        ));
        let roles: Vec<&str> = messages.iter().filter_map(|m| m["role"].as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant"]);
    }

    #[test]
    fn test_messages_non_sequence_is_coerced() {
        let messages = resolve_messages(RawMessages::from(json!({"content": "x"})));
        assert_eq!(messages, vec![Value::from(Message::user(r#"{"content":"x"}"#))]);

        let messages = resolve_messages(RawMessages::from("42"));
        assert_eq!(messages, vec![Value::from(Message::user("42"))]);
    }

    #[test]
    fn test_messages_elements_pass_through_untouched() {
        let turns = json!([
            {"role": "user", "content": "describe", "images": ["aGVsbG8="]},
            {"role": "tool", "content": "42"},
            {"role": "user"},
            "stray"
        ]);
        let messages = resolve_messages(RawMessages::from(turns.clone()));
        assert_eq!(Value::Array(messages), turns);
    }

    #[test]
    fn test_normalize_model_selection() {
        let config = Config::default().with_default_model("llama3");

        let call = normalize(
            RawContext::from(json!({"resources": {"model": "foo"}})),
            RawMessages::from("hi"),
            &config,
        )
        .unwrap();
        assert_eq!(call.request.model, "foo");
        assert!(!call.request.stream);
        assert!(call.request.extra.is_empty());

        let call = normalize(RawContext::Empty, RawMessages::from("hi"), &config).unwrap();
        assert_eq!(call.request.model, "llama3");
    }

    #[test]
    fn test_normalize_forwards_system_prompt() {
        let call = normalize(
            RawContext::from(json!({"resources": {"system_prompt": "Be terse."}})),
            RawMessages::from("hi"),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(call.request.system.as_deref(), Some("Be terse."));
    }

    #[test]
    fn test_normalize_without_any_model_fails() {
        let config = Config::default().with_default_model("");
        let err = normalize(RawContext::Empty, RawMessages::from("hi"), &config).unwrap_err();
        assert!(matches!(err, NormalizeError::MissingModel));
    }
}
