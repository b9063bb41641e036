//! MCP server exposing the gateway's tools and resources.

use rmcp::handler::server::{router::tool::ToolRouter, wrapper::Parameters};
use rmcp::model::{
    AnnotateAble, CallToolResult, Implementation, ListResourcesResult, PaginatedRequestParam,
    RawResource, ReadResourceRequestParam, ReadResourceResult, ResourceContents,
    ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, RoleServer, ServerHandler};
use serde::Deserialize;
use serde_json::Value;

use crate::gateway::Gateway;
use crate::resources::find_resource;
use crate::tools::ToolResult;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ChatArgs {
    #[schemars(
        description = "Session and resource overrides, as an object or a JSON string. \
                       Example: {\"session_id\": \"user123\", \"resources\": {\"model\": \"llama3\"}}"
    )]
    #[serde(default)]
    pub context: Option<Value>,
    #[schemars(
        description = "Conversation as [{\"role\": \"user\", \"content\": \"...\"}, ...], \
                       a JSON string of that array, or a plain user prompt"
    )]
    pub messages: Value,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct ListModelsArgs {
    #[schemars(description = "Optional session context")]
    #[serde(default)]
    pub context: Option<Value>,
}

/// A failed call is still a normal tool result, flagged `is_error`.
fn into_call_result(result: ToolResult) -> CallToolResult {
    let failed = !result.is_success();
    let value = result.into_value();
    if failed {
        CallToolResult::structured_error(value)
    } else {
        CallToolResult::structured(value)
    }
}

#[derive(Clone)]
pub struct GatewayServer {
    gateway: Gateway,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl GatewayServer {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            tool_router: Self::tool_router(),
        }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    #[tool(description = "Chat with an Ollama model. Send the full conversation on every call.")]
    async fn chat(
        &self,
        Parameters(ChatArgs { context, messages }): Parameters<ChatArgs>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(self.gateway.chat(context, messages).await))
    }

    #[tool(description = "List the models available on the Ollama server")]
    async fn list_models(
        &self,
        Parameters(ListModelsArgs { context }): Parameters<ListModelsArgs>,
    ) -> Result<CallToolResult, McpError> {
        Ok(into_call_result(self.gateway.list_models(context).await))
    }
}

#[tool_handler]
impl ServerHandler for GatewayServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "ollama-mcp".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            instructions: Some(
                "Use `chat` for completions against the local Ollama server and \
                 `list_models` to see which models are installed. Read the `model` and \
                 `system_prompt` resources and pass overrides in `context.resources`."
                    .to_string(),
            ),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let resources = self
            .gateway
            .resources()
            .into_iter()
            .map(|resource| {
                RawResource {
                    description: Some(resource.description.clone()),
                    mime_type: Some("application/json".to_string()),
                    ..RawResource::new(resource.uri(), resource.name)
                }
                .no_annotation()
            })
            .collect();

        Ok(ListResourcesResult::with_all_items(resources))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let resource = find_resource(self.gateway.config(), &request.uri).ok_or_else(|| {
            McpError::resource_not_found(format!("Unknown resource: {}", request.uri), None)
        })?;

        let text = serde_json::to_string(&resource.to_json())
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, request.uri)],
        })
    }
}
