//! CatchAll client and OpenAI completion against mock HTTP servers.

use catchall_core::backend::{CompletionBackend, JobBackend};
use catchall_core::models::JobStatus;
use catchall_harness::client::CatchAllClient;
use catchall_harness::config::{CatchAllConfig, LlmConfig};
use catchall_harness::llm::OpenAiCompletion;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test_key";

fn client(server: &MockServer) -> CatchAllClient {
    let config = CatchAllConfig {
        page_size: 2,
        max_retries: 1,
        ..CatchAllConfig::default()
    };
    CatchAllClient::new(&server.uri(), API_KEY, &config).unwrap()
}

#[tokio::test]
async fn test_submit_sends_query_and_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/catchAll/submit"))
        .and(header("x-api-key", API_KEY))
        .and(body_json(json!({ "query": "Find all articles about tides between May 1 and May 2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "job_id": "job-42" })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let job_id = client(&mock_server)
        .submit("Find all articles about tides between May 1 and May 2")
        .await
        .unwrap();
    assert_eq!(job_id, "job-42");
}

#[tokio::test]
async fn test_submit_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/catchAll/submit"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).submit("anything").await.unwrap_err();
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_status_maps_wire_values() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catchAll/status/job-1"))
        .and(header("x-api-key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "job_completed" })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/catchAll/status/job-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "enriching" })))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    assert_eq!(client.status("job-1").await.unwrap(), JobStatus::Completed);
    assert_eq!(client.status("job-2").await.unwrap(), JobStatus::Running);
}

#[tokio::test]
async fn test_status_retries_server_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catchAll/status/job-1"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/catchAll/status/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "failed" })))
        .mount(&mock_server)
        .await;

    let status = client(&mock_server).status("job-1").await.unwrap();
    assert_eq!(status, JobStatus::Failed);
}

#[tokio::test]
async fn test_status_client_error_fails_fast() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catchAll/status/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("unknown job"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).status("missing").await.unwrap_err();
    assert!(err.to_string().contains("404"));
}

#[tokio::test]
async fn test_fetch_pulls_every_page_in_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catchAll/pull/job-1"))
        .and(query_param("page", "1"))
        .and(query_param("page_size", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid_records": 3,
            "page": 1,
            "total_pages": 2,
            "all_records": [
                { "record_title": "Chipmaker cuts 300 jobs",
                  "enrichment": { "company": "Chipmaker", "headcount": 300 } },
                { "record_title": "Retailer automates warehouses", "enrichment": {} }
            ]
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/catchAll/pull/job-1"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid_records": 3,
            "page": 2,
            "total_pages": 2,
            "all_records": [
                { "enrichment": { "record_title": "Bank replaces call center with AI" } }
            ]
        })))
        .mount(&mock_server)
        .await;

    let results = client(&mock_server).fetch("job-1").await.unwrap();
    assert_eq!(results.job_id, "job-1");
    assert_eq!(results.total_found, 3);
    let titles: Vec<&str> = results.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Chipmaker cuts 300 jobs",
            "Retailer automates warehouses",
            "Bank replaces call center with AI"
        ]
    );
    assert_eq!(results.records[0].enrichment["headcount"], json!(300));
}

#[tokio::test]
async fn test_fetch_without_records_is_empty() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catchAll/pull/job-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid_records": 0,
            "total_pages": 0,
            "all_records": []
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let results = client(&mock_server).fetch("job-9").await.unwrap();
    assert!(results.is_empty());
    assert_eq!(results.total_found, 0);
}

fn llm_config(server: &MockServer) -> LlmConfig {
    LlmConfig {
        base_url: server.uri(),
        max_retries: 1,
        ..LlmConfig::default()
    }
}

#[tokio::test]
async fn test_openai_completion_returns_first_choice() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", &format!("Bearer {}", API_KEY)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "Tech: 2" } }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let llm = OpenAiCompletion::new(&llm_config(&mock_server), API_KEY).unwrap();
    assert_eq!(llm.model_name(), "gpt-4o-mini");
    assert_eq!(llm.complete("group by industry").await.unwrap(), "Tech: 2");
}

#[tokio::test]
async fn test_openai_bad_request_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad model"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let llm = OpenAiCompletion::new(&llm_config(&mock_server), API_KEY).unwrap();
    let err = llm.complete("hello").await.unwrap_err();
    assert!(err.to_string().contains("bad model"));
}
