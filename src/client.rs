//! Core backend trait and error types.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;
use thiserror::Error;

use crate::model::{BackendRequest, GenerateRequest, ModelSummary};

/// Errors that can occur during backend operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The server answered with a non-success status.
    #[error("Backend error ({status}): {body}")]
    Backend { status: u16, body: String },

    #[error("Model {0} not found")]
    ModelNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Finite, single-pass sequence of response documents.
///
/// Dropping the stream closes the underlying connection.
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<Value, ClientError>> + Send>>;

/// The four operations offered by an Ollama-compatible server.
#[async_trait]
pub trait Backend: Send + Sync {
    /// List locally available models.
    async fn list_models(&self) -> Result<Vec<ModelSummary>, ClientError>;

    /// Describe a single model.
    async fn get_model_info(&self, name: &str) -> Result<Value, ClientError>;

    /// Run a raw prompt completion.
    async fn generate_completion(
        &self,
        request: GenerateRequest,
    ) -> Result<CompletionStream, ClientError>;

    /// Run a chat completion over a full conversation.
    async fn chat_completion(&self, request: BackendRequest)
        -> Result<CompletionStream, ClientError>;
}
