use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn catchall_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("catchall");
    path
}

fn write_config(tmp: &TempDir, content: &str) -> PathBuf {
    let config_dir = tmp.path().join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_path = config_dir.join("catchall.toml");
    fs::write(&config_path, content).unwrap();
    config_path
}

fn run_catchall(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = catchall_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run catchall binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_prompt_needs_no_config() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");
    let (stdout, _, success) = run_catchall(&missing, &["prompt"]);
    assert!(success);
    assert!(stdout.contains("catchall_search_news"));
    assert!(stdout.contains("catchall_analyze_news"));
}

#[test]
fn test_tools_lists_schemas() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");
    let (stdout, _, success) = run_catchall(&missing, &["tools"]);
    assert!(success);

    let tools: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let tools = tools.as_array().unwrap();
    assert_eq!(tools.len(), 2);
    assert_eq!(tools[0]["name"], "catchall_search_news");
    assert_eq!(tools[1]["parameters"]["required"], json!(["question"]));
}

#[test]
fn test_completions_for_bash() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");
    let (stdout, _, success) = run_catchall(&missing, &["completions", "bash"]);
    assert!(success);
    assert!(stdout.contains("catchall"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(&tmp, "[results]\nmax_results = 0\n");
    let (_, stderr, success) = run_catchall(&config_path, &["search", "anything"]);
    assert!(!success);
    assert!(stderr.contains("results.max_results must be >= 1"));
}

#[test]
fn test_invalid_progress_mode_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(&tmp, "[llm]\nprovider = \"disabled\"\n");
    let (_, stderr, success) =
        run_catchall(&config_path, &["--progress", "loud", "search", "anything"]);
    assert!(!success);
    assert!(stderr.contains("Invalid --progress value 'loud'"));
}

#[test]
fn test_missing_api_key_is_reported() {
    let tmp = TempDir::new().unwrap();
    let config_path = write_config(&tmp, "[llm]\nprovider = \"disabled\"\n");
    let output = Command::new(catchall_binary())
        .arg("--config")
        .arg(&config_path)
        .args(["search", "anything"])
        .env_remove("CATCHALL_API_KEY")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("CATCHALL_API_KEY"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_search_against_mock_backend() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/catchAll/submit"))
        .and(header("x-api-key", "cli-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "job_id": "job-cli" })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/catchAll/status/job-cli"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "completed" })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/catchAll/pull/job-cli"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid_records": 2,
            "total_pages": 1,
            "all_records": [
                { "record_title": "Chipmaker cuts 300 jobs", "enrichment": { "industry": "semiconductors" } },
                { "record_title": "Retailer automates warehouses", "enrichment": { "industry": "retail" } }
            ]
        })))
        .mount(&mock_server)
        .await;

    let tmp = TempDir::new().unwrap();
    let config_path = write_config(
        &tmp,
        &format!(
            r#"[catchall]
api_key = "cli-key"
base_url = "{}"
poll_interval_secs = 1
max_wait_secs = 10

[llm]
provider = "disabled"
"#,
            mock_server.uri()
        ),
    );

    let output = tokio::process::Command::new(catchall_binary())
        .arg("--config")
        .arg(&config_path)
        .args([
            "--progress",
            "off",
            "search",
            "Find all articles about AI layoffs between October 2, 2026 and October 16, 2026",
        ])
        .output()
        .await
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("Found 2 records (Showing top 2)."));
    assert!(stdout.contains("1. Chipmaker cuts 300 jobs"));
    assert!(stdout.contains("(industry: semiconductors)"));
}
