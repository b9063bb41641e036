use ollama_mcp::config::Config;
use ollama_mcp::gateway::Gateway;
use ollama_mcp::mcp::GatewayServer;
use rmcp::model::{CallToolRequestParam, ReadResourceRequestParam, ResourceContents};
use rmcp::service::{RoleClient, RunningService};
use rmcp::ServiceExt;
use serde_json::{json, Value};

async fn connect(config: Config) -> RunningService<RoleClient, ()> {
    let server = GatewayServer::new(Gateway::from_config(config));
    let (client_transport, server_transport) = tokio::io::duplex(64 * 1024);

    tokio::spawn(async move {
        let service = server
            .serve(server_transport)
            .await
            .expect("Failed to start server");
        let _ = service.waiting().await;
    });

    ().serve(client_transport).await.expect("Failed to connect client")
}

fn args(value: Value) -> Option<serde_json::Map<String, Value>> {
    value.as_object().cloned()
}

#[tokio::test]
async fn test_tools_and_resources_are_advertised() {
    let client = connect(Config::default()).await;

    let tools = client.list_tools(None).await.unwrap();
    let mut names: Vec<String> = tools.tools.iter().map(|t| t.name.to_string()).collect();
    names.sort();
    assert_eq!(names, vec!["chat", "list_models"]);

    let resources = client.list_resources(None).await.unwrap();
    let uris: Vec<String> = resources.resources.iter().map(|r| r.uri.clone()).collect();
    assert_eq!(
        uris,
        vec![
            "mcp://resources/model",
            "mcp://resources/system_prompt",
            "mcp://resources/orchestrator_system_prompt",
            "mcp://resources/routing_system_prompt",
        ]
    );

    client.cancel().await.unwrap();
}

#[tokio::test]
async fn test_read_model_resource() {
    let client = connect(Config::default().with_default_model("mistral")).await;

    let result = client
        .read_resource(ReadResourceRequestParam {
            uri: "mcp://resources/model".to_string(),
        })
        .await
        .unwrap();

    let text = match &result.contents[0] {
        ResourceContents::TextResourceContents { text, .. } => text.clone(),
        other => panic!("Expected text contents, got {:?}", other),
    };
    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["default"], json!("mistral"));
    assert_eq!(body["required"], json!(true));

    let missing = client
        .read_resource(ReadResourceRequestParam {
            uri: "mcp://resources/nope".to_string(),
        })
        .await;
    assert!(missing.is_err());

    client.cancel().await.unwrap();
}

#[tokio::test]
async fn test_chat_tool_round_trip() {
    let mut backend = mockito::Server::new_async().await;
    backend
        .mock("POST", "/api/chat")
        .match_body(mockito::Matcher::PartialJson(json!({
            "model": "foo",
            "messages": [{"role": "user", "content": "Hi"}]
        })))
        .with_status(200)
        .with_body(r#"{"message":{"role":"assistant","content":"Hello from foo"}}"#)
        .create_async()
        .await;

    let client = connect(Config::default().with_base_url(backend.url())).await;

    let result = client
        .call_tool(CallToolRequestParam {
            name: "chat".into(),
            arguments: args(json!({
                "context": "{\"resources\": {\"model\": \"foo\"}}",
                "messages": "[{\"role\": \"user\", \"content\": \"Hi\"}]"
            })),
        })
        .await
        .unwrap();

    assert_ne!(result.is_error, Some(true));
    assert_eq!(
        result.structured_content,
        Some(json!({"role": "assistant", "content": "Hello from foo", "model": "foo"}))
    );

    client.cancel().await.unwrap();
}

#[tokio::test]
async fn test_chat_tool_failure_is_flagged() {
    let mut backend = mockito::Server::new_async().await;
    backend
        .mock("POST", "/api/chat")
        .with_status(500)
        .with_body("out of memory")
        .create_async()
        .await;

    let client = connect(Config::default().with_base_url(backend.url())).await;

    let result = client
        .call_tool(CallToolRequestParam {
            name: "chat".into(),
            arguments: args(json!({"messages": "Hi"})),
        })
        .await
        .unwrap();

    assert_eq!(result.is_error, Some(true));
    let payload = result.structured_content.unwrap();
    assert!(payload["error"].as_str().unwrap().contains("out of memory"));
    assert_eq!(payload["message"], json!("Failed to generate chat response"));

    client.cancel().await.unwrap();
}

#[tokio::test]
async fn test_list_models_tool_offline_backend() {
    let mut backend = mockito::Server::new_async().await;
    backend
        .mock("GET", "/api/tags")
        .with_status(503)
        .create_async()
        .await;

    let client = connect(Config::default().with_base_url(backend.url())).await;

    let result = client
        .call_tool(CallToolRequestParam {
            name: "list_models".into(),
            arguments: args(json!({})),
        })
        .await
        .unwrap();

    assert_ne!(result.is_error, Some(true));
    let payload = result.structured_content.unwrap();
    assert_eq!(payload["status"], json!("error"));
    assert_eq!(payload["server_status"], json!("offline or unreachable"));

    client.cancel().await.unwrap();
}
