//! Static configuration resources advertised to MCP clients.
//!
//! Resources are metadata only: a client reads them before calling a tool
//! and echoes the chosen values back in the call's `context.resources`.

use serde::Serialize;
use serde_json::Value;

use crate::config::Config;

pub const RESOURCE_URI_PREFIX: &str = "mcp://resources/";

const ORCHESTRATOR_PROMPT: &str = "\
You are an Orchestrator LLM coordinating a group of worker LLMs.

Your role:
1. Analyse each incoming task and split it into suitable subtasks.
2. Delegate every subtask to the worker best suited to it.
3. Combine the workers' results into one coherent final answer.

Available workers:
- Worker LLM 1: llama3.1:8b - general knowledge, explanations, creative writing
- Worker LLM 2: deepseek-r1:latest - technical domains, reasoning, analysis

For each request:
1. Identify the nature of the task and the subtasks it needs.
2. Pick the most effective worker for each subtask.
3. Run the subtasks in a sensible order.
4. Merge the individual answers into a complete result.
5. Present a single, unified response to the user.

Play to each worker's strengths. Break complex requests into parts that different \
workers can handle and integrate their output. You are an orchestration layer: \
distribute work efficiently and assemble the results.";

const ROUTING_PROMPT: &str = "\
You are a Router LLM that classifies user input and sends it to a specialised system.

Your role:
1. Analyse each incoming request.
2. Assign it to exactly one category.
3. Route it to the system optimised for that category.

Available workers:
- Worker LLM 1: llama3.1:8b - general knowledge, explanations, creative writing
- Worker LLM 2: deepseek-r1:latest - technical domains, reasoning, analysis

You may propose a new specialised worker when no existing one fits.

Categories:
- General Questions: everyday questions, explanations, common knowledge
- Technical Support: coding help, debugging, development assistance
- Creative Tasks: writing, storytelling, content creation
- Data Analysis: numerical analysis, pattern recognition, interpretation
- Research Queries: in-depth information gathering and synthesis

Answer in this format:
{
    \"category\": \"[CATEGORY NAME]\",
    \"route_to\": \"[WORKER LLM OR NEW SPECIALISED WORKER]\",
    \"reasoning\": \"[ONE OR TWO SENTENCES]\",
    \"original_query\": \"[USER'S ORIGINAL QUERY]\"
}

When the category is unclear, choose by the dominant aspect of the query.";

/// A named, read-only configuration value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceDef {
    #[serde(skip)]
    pub name: &'static str,
    pub description: String,
    pub default: Value,
    pub required: bool,
}

impl ResourceDef {
    pub fn uri(&self) -> String {
        format!("{}{}", RESOURCE_URI_PREFIX, self.name)
    }

    /// JSON body returned when the resource is read.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// All resources, in advertisement order.
pub fn resource_catalog(config: &Config) -> Vec<ResourceDef> {
    vec![
        ResourceDef {
            name: "model",
            description: "Model used to answer chat calls".to_string(),
            default: Value::String(config.default_model.clone()),
            required: true,
        },
        ResourceDef {
            name: "system_prompt",
            description: "System prompt to control the assistant's behavior".to_string(),
            default: Value::String(config.system_prompt.clone()),
            required: false,
        },
        ResourceDef {
            name: "orchestrator_system_prompt",
            description: "System prompt for an orchestrator-workers workflow".to_string(),
            default: Value::String(ORCHESTRATOR_PROMPT.to_string()),
            required: false,
        },
        ResourceDef {
            name: "routing_system_prompt",
            description: "System prompt for implementing a routing workflow".to_string(),
            default: Value::String(ROUTING_PROMPT.to_string()),
            required: false,
        },
    ]
}

/// Find a resource by URI or bare name.
pub fn find_resource(config: &Config, uri: &str) -> Option<ResourceDef> {
    let name = crate::normalize::resource_key(uri);
    resource_catalog(config).into_iter().find(|r| r.name == name)
}
