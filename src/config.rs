//! Process configuration, read once at start-up.

use std::collections::HashMap;
use std::time::Duration;

use crate::options::{TransportOptions, DEFAULT_TIMEOUT};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Gateway configuration.
///
/// Built once by the binary and shared by reference with the dispatcher and
/// the MCP server. `default_model` is the only fallback model identifier used
/// anywhere in the crate.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Ollama server, without a trailing slash.
    pub base_url: String,
    /// Model used when a call does not name one.
    pub default_model: String,
    /// Default value advertised by the `system_prompt` resource.
    pub system_prompt: String,
    pub transport: TransportOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            transport: TransportOptions::default(),
        }
    }
}

impl Config {
    /// Read `OLLAMA_API_URL`, `DEFAULT_MODEL`, `SYSTEM_PROMPT`,
    /// `OLLAMA_TIMEOUT_SECS`, `OLLAMA_PROXY` and `OLLAMA_HEADERS` from the
    /// process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = non_empty("OLLAMA_API_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout = match non_empty("OLLAMA_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) => Duration::from_secs(secs),
                Err(e) => {
                    tracing::warn!("Ignoring invalid OLLAMA_TIMEOUT_SECS={:?}: {}", raw, e);
                    DEFAULT_TIMEOUT
                }
            },
            None => DEFAULT_TIMEOUT,
        };

        let mut transport = TransportOptions::new().with_timeout(timeout);
        if let Some(proxy) = non_empty("OLLAMA_PROXY") {
            transport = transport.with_proxy(proxy.trim().to_string());
        }
        if let Some(raw) = non_empty("OLLAMA_HEADERS") {
            // A JSON object of header name to value.
            match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(headers) => {
                    for (key, value) in headers {
                        transport = transport.with_header(key, value);
                    }
                }
                Err(e) => tracing::warn!("Ignoring invalid OLLAMA_HEADERS: {}", e),
            }
        }

        Self {
            base_url,
            default_model: non_empty("DEFAULT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            system_prompt: non_empty("SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            transport,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.default_model, "llama3");
        assert_eq!(config.system_prompt, "You are a helpful assistant.");
        assert_eq!(config.transport.timeout(), Some(DEFAULT_TIMEOUT));
    }

    #[test]
    fn test_environment_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("OLLAMA_API_URL", "http://gpu-box:11434/"),
            ("DEFAULT_MODEL", "mistral"),
            ("OLLAMA_TIMEOUT_SECS", "15"),
        ]));
        assert_eq!(config.base_url, "http://gpu-box:11434");
        assert_eq!(config.default_model, "mistral");
        assert_eq!(config.transport.timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_bad_timeout_falls_back() {
        let config = Config::from_lookup(lookup(&[("OLLAMA_TIMEOUT_SECS", "soon")]));
        assert_eq!(config.transport.timeout(), Some(DEFAULT_TIMEOUT));
    }

    #[test]
    fn test_proxy_and_headers() {
        let config = Config::from_lookup(lookup(&[
            ("OLLAMA_PROXY", "http://proxy.internal:3128"),
            ("OLLAMA_HEADERS", r#"{"Authorization": "Bearer abc"}"#),
        ]));

        let TransportOptions::Http { proxy, headers, .. } = config.transport;
        assert_eq!(proxy.as_deref(), Some("http://proxy.internal:3128"));
        assert_eq!(
            headers.unwrap().get("Authorization").map(String::as_str),
            Some("Bearer abc")
        );
    }

    #[test]
    fn test_bad_headers_are_ignored() {
        let config = Config::from_lookup(lookup(&[("OLLAMA_HEADERS", "Authorization: x")]));
        let TransportOptions::Http { headers, .. } = config.transport;
        assert!(headers.is_none());
    }

    #[test]
    fn test_blank_model_uses_default() {
        let config = Config::from_lookup(lookup(&[("DEFAULT_MODEL", "  ")]));
        assert_eq!(config.default_model, "llama3");
    }
}
