//! HTTP tool server over in-memory backends.

use std::sync::Arc;
use std::time::Duration;

use catchall_core::backend::memory::{CannedCompletion, ScriptedJobBackend};
use catchall_core::backend::JobBackend;
use catchall_core::models::{JobStatus, Record};
use catchall_harness::orchestrator::{Orchestrator, Settings};
use catchall_harness::server::{router, AppState};
use catchall_harness::tools::ToolRegistry;
use serde_json::{json, Value};

const QUERY: &str = "Find all articles about AI layoffs between October 2, 2026 and October 16, 2026";

fn settings() -> Settings {
    Settings {
        poll_interval: Duration::from_millis(10),
        max_wait: Duration::from_millis(50),
        ..Settings::default()
    }
}

/// Serve the tools on an ephemeral port and return its base URL.
async fn spawn_server(jobs: Arc<dyn JobBackend>, llm: Arc<CannedCompletion>) -> String {
    let orchestrator = Arc::new(Orchestrator::new(jobs, llm, settings()));
    let app = router(AppState::new(orchestrator, ToolRegistry::with_builtins()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn call_tool(base: &str, name: &str, params: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{}/tools/{}", base, name))
        .json(&params)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

fn records() -> Vec<Record> {
    vec![
        Record::new("Chipmaker cuts 300 jobs").with("industry", "semiconductors"),
        Record::new("Retailer automates warehouses").with("industry", "retail"),
    ]
}

#[tokio::test]
async fn test_health_and_tool_list() {
    let jobs = Arc::new(ScriptedJobBackend::completing_after(0, records()));
    let base = spawn_server(jobs, Arc::new(CannedCompletion::new("unused"))).await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("{}/health", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["cached"], false);

    let list: Value = client
        .get(format!("{}/tools/list", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = list["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["catchall_search_news", "catchall_analyze_news"]);
    assert_eq!(list["tools"][0]["parameters"]["required"], json!(["query"]));

    let prompt: Value = client
        .get(format!("{}/prompt", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(prompt["prompt"]
        .as_str()
        .unwrap()
        .contains("catchall_analyze_news"));
}

#[tokio::test]
async fn test_search_then_analyze_over_http() {
    let jobs = Arc::new(ScriptedJobBackend::completing_after(1, records()));
    let llm = Arc::new(CannedCompletion::new("Semiconductors: 1, Retail: 1"));
    let base = spawn_server(jobs, llm.clone()).await;

    let (status, body) = call_tool(&base, "catchall_search_news", json!({ "query": QUERY })).await;
    assert_eq!(status, 200);
    let summary = body["result"].as_str().unwrap();
    assert!(summary.starts_with("Found 2 records (Showing top 2)."));

    let (status, body) = call_tool(
        &base,
        "catchall_analyze_news",
        json!({ "question": "group by industry" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["result"], "Semiconductors: 1, Retail: 1");
    assert_eq!(llm.calls(), 1);

    let health: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["cached"], true);
}

#[tokio::test]
async fn test_analyze_before_search_returns_guidance() {
    let jobs = Arc::new(ScriptedJobBackend::completing_after(0, records()));
    let llm = Arc::new(CannedCompletion::new("unused"));
    let base = spawn_server(jobs, llm.clone()).await;

    let (status, body) =
        call_tool(&base, "catchall_analyze_news", json!({ "question": "anything?" })).await;
    assert_eq!(status, 200);
    assert!(body["result"]
        .as_str()
        .unwrap()
        .starts_with("ERROR: No news data available to analyze yet."));
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_error_statuses() {
    let jobs = Arc::new(ScriptedJobBackend::new(vec![JobStatus::Running], vec![]));
    let base = spawn_server(jobs, Arc::new(CannedCompletion::new("unused"))).await;

    let (status, body) = call_tool(&base, "no_such_tool", json!({})).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, body) = call_tool(&base, "catchall_search_news", json!({})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, body) = call_tool(&base, "catchall_search_news", json!({ "query": "  " })).await;
    assert_eq!(status, 400);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("must not be empty"));

    let (status, body) = call_tool(&base, "catchall_search_news", json!({ "query": QUERY })).await;
    assert_eq!(status, 408);
    assert_eq!(body["error"]["code"], "timeout");
}
