//! Model server provider implementations.

use crate::client::Backend;
use crate::config::Config;

/// Trait for providers that can create configured backend clients.
pub trait Provider {
    /// The client type produced by this provider.
    type Client: Backend;

    /// Create a new client from the gateway configuration.
    fn create(config: &Config) -> Self::Client;
}

pub mod ollama;

pub use ollama::{Ollama, OllamaClient};
