//! Ollama API client implementation.
//!
//! | Operation | Method | Path |
//! |---|---|---|
//! | list models | GET | `/api/tags` |
//! | model info | POST | `/api/show` |
//! | generate | POST | `/api/generate` |
//! | chat | POST | `/api/chat` |

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::header::CONTENT_TYPE;
use serde_json::{json, Map, Value};

use crate::client::{Backend, ClientError, CompletionStream};
use crate::config::Config;
use crate::http::{add_extra_headers, build_http_client, RequestBuilderExt, ResponseExt};
use crate::model::{BackendRequest, GenerateRequest, ModelSummary, TagsResponse};
use crate::ndjson::NdjsonResponseExt;
use crate::options::TransportOptions;
use crate::providers::Provider;

/// Stateless client for an Ollama server.
///
/// Holds nothing but its base URL and transport options; every call builds
/// its own HTTP client.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    transport_options: TransportOptions,
}

impl OllamaClient {
    /// Create a new client.
    pub fn new(base_url: impl Into<String>, transport_options: TransportOptions) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::info!("Initialized Ollama client with base URL: {}", base_url);
        Self {
            base_url,
            transport_options,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport_options(&self) -> &TransportOptions {
        &self.transport_options
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<reqwest::Response, ClientError> {
        let http_client = build_http_client(&self.transport_options)?;
        let req = http_client
            .post(self.url(path))
            .header(CONTENT_TYPE, "application/json");
        let req = add_extra_headers(req, &self.transport_options);

        Ok(req.json_logged(body).send().await?)
    }

    /// Post a completion body and expose the reply as a document stream.
    async fn completion(
        &self,
        path: &str,
        body: Value,
        stream: bool,
        label: &str,
    ) -> Result<CompletionStream, ClientError> {
        let response = self.post_json(path, &body).await?;
        let response = response.error_for_backend().await.inspect_err(|e| {
            tracing::error!("{} error: {}", label, e);
        })?;

        if stream {
            Ok(Box::pin(response.ndjson()))
        } else {
            let single = stream::once(async move {
                let doc: Value = response.json_logged().await?;
                tracing::debug!("Received complete response");
                Ok::<_, ClientError>(doc)
            });
            Ok(single.boxed())
        }
    }
}

/// Body for `/api/generate`: base fields first, extras merged over them.
pub fn generate_body(request: &GenerateRequest) -> Value {
    let mut body = Map::new();
    body.insert("model".into(), json!(request.model));
    body.insert("prompt".into(), json!(request.prompt));
    body.insert("stream".into(), json!(request.stream));
    body.extend(request.extra.clone());
    Value::Object(body)
}

/// Body for `/api/chat`.
///
/// Extras override `model`, `messages` and `stream`; a non-empty `system`
/// is written last.
pub fn chat_body(request: &BackendRequest) -> Value {
    let mut body = Map::new();
    body.insert("model".into(), json!(request.model));
    body.insert("messages".into(), json!(request.messages));
    body.insert("stream".into(), json!(request.stream));
    body.extend(request.extra.clone());
    if let Some(system) = request.system.as_deref().filter(|s| !s.is_empty()) {
        body.insert("system".into(), json!(system));
    }
    Value::Object(body)
}

#[async_trait]
impl Backend for OllamaClient {
    async fn list_models(&self) -> Result<Vec<ModelSummary>, ClientError> {
        tracing::debug!("Listing models from {}", self.base_url);
        let http_client = build_http_client(&self.transport_options)?;
        let req = add_extra_headers(http_client.get(self.url("/api/tags")), &self.transport_options);

        let response = req.send().await?;
        let response = response.error_for_backend().await.inspect_err(|e| {
            tracing::error!("Failed to list models: {}", e);
        })?;

        let tags: TagsResponse = response.json_logged().await?;
        tracing::debug!("Retrieved {} models", tags.models.len());
        Ok(tags.models)
    }

    async fn get_model_info(&self, name: &str) -> Result<Value, ClientError> {
        tracing::debug!("Getting info for model: {}", name);
        let response = self.post_json("/api/show", &json!({ "name": name })).await?;

        match response.error_for_backend().await {
            Ok(response) => response.json_logged().await,
            Err(ClientError::Backend { status, body }) => {
                tracing::warn!(
                    "Model info lookup failed ({}): {}; falling back to model list",
                    status,
                    body
                );
                let models = self.list_models().await?;
                let found = models
                    .into_iter()
                    .find(|m| m.name_str() == Some(name))
                    .ok_or_else(|| ClientError::ModelNotFound(name.to_string()))?;
                Ok(serde_json::to_value(found)?)
            }
            Err(e) => Err(e),
        }
    }

    async fn generate_completion(
        &self,
        request: GenerateRequest,
    ) -> Result<CompletionStream, ClientError> {
        tracing::debug!("Generate completion request for model {}", request.model);
        let body = generate_body(&request);
        self.completion("/api/generate", body, request.stream, "Generate completion")
            .await
    }

    async fn chat_completion(
        &self,
        request: BackendRequest,
    ) -> Result<CompletionStream, ClientError> {
        tracing::debug!("Chat completion request for model {}", request.model);
        let body = chat_body(&request);
        self.completion("/api/chat", body, request.stream, "Chat completion")
            .await
    }
}

pub struct Ollama;

impl Provider for Ollama {
    type Client = OllamaClient;

    fn create(config: &Config) -> Self::Client {
        OllamaClient::new(config.base_url.clone(), config.transport.clone())
    }
}
