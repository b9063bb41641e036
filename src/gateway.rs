//! Tool dispatcher.
//!
//! Routes `chat` and `list_models` calls through the normalizer and the
//! backend client, and is the single place where errors from either are
//! turned into a [`ToolResult`]. Nothing raised below this layer reaches the
//! transport.

use std::sync::Arc;

use futures::StreamExt;
use serde_json::{json, Value};
use thiserror::Error;

use crate::client::{Backend, ClientError};
use crate::config::Config;
use crate::normalize::{normalize, resolve_context, NormalizeError, RawContext, RawMessages};
use crate::providers::{Ollama, Provider};
use crate::resources::{resource_catalog, ResourceDef};
use crate::tools::{ToolError, ToolResult, CHAT_TOOL, LIST_MODELS_TOOL};

const CHAT_FAILED: &str = "Failed to generate chat response";

#[derive(Debug, Error)]
enum CallError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// The tool and resource catalog, bound to one backend.
#[derive(Clone)]
pub struct Gateway {
    backend: Arc<dyn Backend>,
    config: Arc<Config>,
}

impl Gateway {
    pub fn new(backend: Arc<dyn Backend>, config: Arc<Config>) -> Self {
        Self { backend, config }
    }

    /// Gateway backed by an Ollama client built from `config`.
    pub fn from_config(config: Config) -> Self {
        let backend = Ollama::create(&config);
        Self::new(Arc::new(backend), Arc::new(config))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Static resources advertised alongside the tools.
    pub fn resources(&self) -> Vec<ResourceDef> {
        resource_catalog(&self.config)
    }

    /// `chat` tool: one non-streaming completion over the supplied conversation.
    pub async fn chat(
        &self,
        context: impl Into<RawContext>,
        messages: impl Into<RawMessages>,
    ) -> ToolResult {
        let context = context.into();
        let messages = messages.into();
        tracing::debug!("Chat request received");

        match self.try_chat(context, messages).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Chat failed: {}", e);
                ToolResult::failure(e.to_string(), CHAT_FAILED)
            }
        }
    }

    async fn try_chat(
        &self,
        context: RawContext,
        messages: RawMessages,
    ) -> Result<ToolResult, CallError> {
        let call = normalize(context, messages, &self.config)?;
        let model = call.request.model.clone();
        tracing::debug!(
            "Using model: {} with {} messages",
            model,
            call.request.messages.len()
        );

        let mut documents = self
            .backend
            .chat_completion(call.request.with_stream(false))
            .await?;
        // Only the first document matters; dropping the stream closes the body.
        let first = documents.next().await.transpose()?;
        drop(documents);

        let content = first
            .as_ref()
            .and_then(|doc| doc.pointer("/message/content"))
            .cloned();

        Ok(match content {
            Some(content) => ToolResult::success(json!({
                "role": "assistant",
                "content": content,
                "model": model,
            })),
            None => {
                tracing::warn!("Unexpected chat response format: {:?}", first);
                ToolResult::unexpected_format(first.unwrap_or(Value::Null))
            }
        })
    }

    /// `list_models` tool.
    ///
    /// An unreachable backend is reported inside a normal payload with
    /// `status: "error"`, not as a [`ToolResult::Failure`].
    pub async fn list_models(&self, context: impl Into<RawContext>) -> ToolResult {
        let context = resolve_context(context.into());
        tracing::debug!("Checking for available models (session {})", context.session_id);

        match self.backend.list_models().await {
            Ok(models) => {
                let names: Vec<Value> = models
                    .into_iter()
                    .map(|m| m.name.unwrap_or(Value::Null))
                    .collect();
                ToolResult::success(json!({
                    "status": "connected",
                    "server_status": "online",
                    "available_models_count": names.len(),
                    "available_models": names,
                    "message": "Successfully retrieved available models",
                }))
            }
            Err(e) => {
                tracing::error!("Model listing failed: {}", e);
                ToolResult::success(json!({
                    "status": "error",
                    "server_status": "offline or unreachable",
                    "error": e.to_string(),
                    "message": "Failed to connect to the model server",
                }))
            }
        }
    }

    /// Dispatch a tool by name with a JSON argument object.
    pub async fn call_tool(&self, name: &str, args: Value) -> Result<ToolResult, ToolError> {
        let mut args = match args {
            Value::Object(map) => map,
            Value::Null => serde_json::Map::new(),
            other => {
                return Err(ToolError::InvalidArguments(format!(
                    "expected an object, got {}",
                    other
                )))
            }
        };
        let context = RawContext::from(args.remove("context"));

        match name {
            CHAT_TOOL => {
                let messages = args
                    .remove("messages")
                    .ok_or_else(|| ToolError::InvalidArguments("missing `messages`".into()))?;
                Ok(self.chat(context, messages).await)
            }
            LIST_MODELS_TOOL => Ok(self.list_models(context).await),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}
