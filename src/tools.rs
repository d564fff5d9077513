//! Agent-facing tools.
//!
//! The orchestrator's two operations are exposed as tools an LLM agent can
//! discover and call:
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              ToolRegistry                │
//! │  ┌──────────────────┐ ┌────────────────┐ │
//! │  │ catchall_search_ │ │ catchall_      │ │
//! │  │ news  (builtin)  │ │ analyze_news   │ │
//! │  └──────────────────┘ └────────────────┘ │
//! └──────────────┬───────────────────────────┘
//!                ▼
//!      ToolContext ──▶ Orchestrator
//! ```
//!
//! Custom tools can be added by implementing [`Tool`] and calling
//! [`ToolRegistry::register`].

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use catchall_core::prompts::{
    ANALYZE_TOOL_DESCRIPTION, ANALYZE_TOOL_NAME, SEARCH_TOOL_DESCRIPTION, SEARCH_TOOL_NAME,
};

use crate::orchestrator::Orchestrator;

// ═══════════════════════════════════════════════════════════════════════
// Tool Trait
// ═══════════════════════════════════════════════════════════════════════

/// A tool that agents can discover and call.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use anyhow::Result;
/// use serde_json::{json, Value};
/// use catchall_harness::tools::{Tool, ToolContext};
///
/// pub struct CacheStatusTool;
///
/// #[async_trait]
/// impl Tool for CacheStatusTool {
///     fn name(&self) -> &str { "cache_status" }
///     fn description(&self) -> &str { "Report whether results are cached" }
///
///     fn parameters_schema(&self) -> Value {
///         json!({ "type": "object", "properties": {} })
///     }
///
///     async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
///         Ok(json!({ "cached": !ctx.orchestrator().store().is_empty() }))
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool's name; used as the route path (`POST /tools/{name}`).
    fn name(&self) -> &str;

    /// Returns the description agents use to decide whether to call the tool.
    fn description(&self) -> &str;

    /// Whether this tool ships with the harness. Defaults to `false`.
    fn is_builtin(&self) -> bool {
        false
    }

    /// Returns the OpenAI function-calling JSON Schema for parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with validated parameters.
    ///
    /// The returned value is wrapped in `{ "result": ... }` by the server.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

/// Tool metadata as listed by `GET /tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub builtin: bool,
    pub parameters: Value,
}

impl ToolInfo {
    pub fn of(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            builtin: tool.is_builtin(),
            parameters: tool.parameters_schema(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// ToolContext
// ═══════════════════════════════════════════════════════════════════════

/// Bridge from a tool invocation to the shared orchestrator (and its cache).
#[derive(Clone)]
pub struct ToolContext {
    orchestrator: Arc<Orchestrator>,
}

impl ToolContext {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Tool Implementations
// ═══════════════════════════════════════════════════════════════════════

/// Starts a new search. Delegates to [`Orchestrator::search`].
pub struct SearchNewsTool;

#[async_trait]
impl Tool for SearchNewsTool {
    fn name(&self) -> &str {
        SEARCH_TOOL_NAME
    }

    fn description(&self) -> &str {
        SEARCH_TOOL_DESCRIPTION
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "What you want to find. Example: 'Find articles about AI developments in US'"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = params["query"].as_str().unwrap_or("");
        if query.trim().is_empty() {
            anyhow::bail!("query must not be empty");
        }
        let output = ctx.orchestrator().search(query).await?;
        Ok(Value::String(output))
    }
}

/// Analyzes cached results. Delegates to [`Orchestrator::analyze`].
pub struct AnalyzeNewsTool;

#[async_trait]
impl Tool for AnalyzeNewsTool {
    fn name(&self) -> &str {
        ANALYZE_TOOL_NAME
    }

    fn description(&self) -> &str {
        ANALYZE_TOOL_DESCRIPTION
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "Analytical question about the cached data. Example: 'Summarize key findings'"
                }
            },
            "required": ["question"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let question = params["question"].as_str().unwrap_or("");
        if question.trim().is_empty() {
            anyhow::bail!("question must not be empty");
        }
        let output = ctx.orchestrator().analyze(question).await?;
        Ok(Value::String(output))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Registry for tools (built-in and custom).
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Create a registry pre-loaded with the search and analyze tools.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SearchNewsTool));
        registry.register(Box::new(AnalyzeNewsTool));
        registry
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn infos(&self) -> Vec<ToolInfo> {
        self.tools.iter().map(|t| ToolInfo::of(t.as_ref())).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Check `params` against the `required` list and property types of `schema`.
///
/// Returns the params object on success. Non-object params are rejected.
pub fn validate_params(schema: &Value, params: &Value) -> Result<Value> {
    let Some(obj) = params.as_object() else {
        anyhow::bail!("invalid params: expected a JSON object");
    };

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for field in required.iter().filter_map(|f| f.as_str()) {
            match obj.get(field) {
                None | Some(Value::Null) => {
                    anyhow::bail!("invalid params: missing required field '{}'", field)
                }
                _ => {}
            }
        }
    }

    if let Some(props) = schema.get("properties").and_then(|p| p.as_object()) {
        for (key, value) in obj {
            let expected = props
                .get(key)
                .and_then(|p| p.get("type"))
                .and_then(|t| t.as_str());
            let ok = match expected {
                Some("string") => value.is_string(),
                Some("integer") => value.is_i64() || value.is_u64(),
                Some("number") => value.is_number(),
                Some("boolean") => value.is_boolean(),
                Some("object") => value.is_object(),
                Some("array") => value.is_array(),
                _ => true,
            };
            if !ok {
                anyhow::bail!(
                    "invalid params: field '{}' must be of type {}",
                    key,
                    expected.unwrap_or("unknown")
                );
            }
        }
    }

    Ok(params.clone())
}
