//! Agent tool HTTP server.
//!
//! Exposes the search and analyze tools over a JSON HTTP API so an agent
//! runtime can drive them. One [`Orchestrator`] is shared by all requests,
//! which means the cached result set lives as long as the server does.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/tools/list` | List all registered tools with schemas |
//! | `POST` | `/tools/{name}` | Call any registered tool by name |
//! | `GET`  | `/prompt` | The agent system prompt for these tools |
//! | `GET`  | `/health` | Health check (returns version and cache state) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `timeout` (408),
//! `cancelled` (503), `tool_error` (500).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use catchall_core::error::CatchAllError;
use catchall_core::prompts::AGENT_PROMPT;

use crate::config::Config;
use crate::orchestrator::Orchestrator;
use crate::tools::{validate_params, ToolContext, ToolInfo, ToolRegistry};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<Orchestrator>,
    tools: Arc<ToolRegistry>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, tools: ToolRegistry) -> Self {
        Self {
            orchestrator,
            tools: Arc::new(tools),
        }
    }
}

/// Build the router. Exposed separately so tests can serve it on an
/// ephemeral port.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .route("/prompt", get(handle_prompt))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Starts the server on `[server].bind` with the built-in tools.
///
/// Runs until ctrl-c, which also cancels any in-flight search.
pub async fn run_server(config: &Config, orchestrator: Arc<Orchestrator>) -> anyhow::Result<()> {
    run_server_with_tools(config, orchestrator, ToolRegistry::with_builtins()).await
}

/// Like [`run_server`], with a caller-supplied registry (e.g. built-ins
/// plus custom tools).
pub async fn run_server_with_tools(
    config: &Config,
    orchestrator: Arc<Orchestrator>,
    tools: ToolRegistry,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();

    for t in tools.tools() {
        let tag = if t.is_builtin() { "builtin" } else { "custom" };
        tracing::info!(tool = t.name(), kind = tag, "registered tool");
    }

    let shutdown = orchestrator.cancellation_token();
    let app = router(AppState::new(orchestrator, tools));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    println!("CatchAll tool server listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Map a tool failure onto an HTTP status. Domain errors are recognised by
/// type; validation failures by their message.
fn classify_tool_error(tool_name: &str, err: anyhow::Error) -> AppError {
    let message = format!("{}: {}", tool_name, err);

    if let Some(domain) = err.downcast_ref::<CatchAllError>() {
        return match domain {
            CatchAllError::SearchTimedOut { .. } => {
                AppError::new(StatusCode::REQUEST_TIMEOUT, "timeout", message)
            }
            CatchAllError::Cancelled { .. } | CatchAllError::CancelledBeforeSubmit => {
                AppError::new(StatusCode::SERVICE_UNAVAILABLE, "cancelled", message)
            }
            other => AppError::new(StatusCode::INTERNAL_SERVER_ERROR, other.code(), message),
        };
    }

    if message.contains("must not be empty") || message.contains("invalid") {
        AppError::new(StatusCode::BAD_REQUEST, "bad_request", message)
    } else {
        AppError::new(StatusCode::INTERNAL_SERVER_ERROR, "tool_error", message)
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    cached: bool,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cached: !state.orchestrator.store().is_empty(),
    })
}

// ============ GET /prompt ============

#[derive(Serialize)]
struct PromptResponse {
    prompt: &'static str,
}

async fn handle_prompt() -> Json<PromptResponse> {
    Json(PromptResponse {
        prompt: AGENT_PROMPT,
    })
}

// ============ GET /tools/list ============

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    Json(ToolListResponse {
        tools: state.tools.infos(),
    })
}

// ============ POST /tools/{name} ============

/// Unified tool dispatch: look up, validate, execute.
async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tool = state.tools.find(&name).ok_or_else(|| {
        AppError::new(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("no tool registered with name: {}", name),
        )
    })?;

    let validated_params = validate_params(&tool.parameters_schema(), &params)
        .map_err(|e| AppError::new(StatusCode::BAD_REQUEST, "bad_request", e.to_string()))?;

    let ctx = ToolContext::new(state.orchestrator.clone());
    let result = tool
        .execute(validated_params, &ctx)
        .await
        .map_err(|e| classify_tool_error(&name, e))?;

    Ok(Json(serde_json::json!({ "result": result })))
}
