//! # ollama-mcp - MCP tool gateway for Ollama
//!
//! Exposes a small catalog of MCP tools (`chat`, `list_models`) and static
//! configuration resources, and fulfils tool calls against an Ollama server.
//!
//! ## Architecture
//!
//! 1. **Backend client** ([`providers::OllamaClient`]) talks to the fixed
//!    `/api/tags`, `/api/show`, `/api/generate` and `/api/chat` endpoints and
//!    yields response documents, from a single JSON body or an NDJSON stream.
//! 2. **Normalizer** ([`normalize`]) turns loosely-typed tool arguments into a
//!    strict [`BackendRequest`].
//! 3. **Dispatcher** ([`Gateway`]) routes calls through both and converts
//!    every failure into a [`ToolResult`].
//!
//! [`mcp::GatewayServer`] puts the dispatcher behind an `rmcp` server.
//!
//! ## Example
//! ```no_run
//! use futures::StreamExt;
//! use ollama_mcp::client::Backend;
//! use ollama_mcp::config::Config;
//! use ollama_mcp::model::{BackendRequest, Message};
//! use ollama_mcp::providers::{Ollama, Provider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Ollama::create(&Config::from_env());
//!
//!     let request = BackendRequest::new("llama3", vec![Message::user("Hello!").into()]).with_stream(true);
//!     let mut chunks = client.chat_completion(request).await?;
//!     while let Some(chunk) = chunks.next().await {
//!         println!("{}", chunk?);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod gateway;
pub mod http;
pub mod mcp;
pub mod model;
pub mod ndjson;
pub mod normalize;
pub mod options;
pub mod providers;
pub mod resources;
pub mod tools;

pub use client::{Backend, ClientError, CompletionStream};
pub use config::Config;
pub use gateway::Gateway;
pub use mcp::GatewayServer;
pub use model::{BackendRequest, GenerateRequest, Message, ModelSummary, Role};
pub use normalize::{CallContext, RawContext, RawMessages, ResourceLookup};
pub use tools::{ToolError, ToolResult};

// Re-export rmcp for convenience
pub use rmcp;
