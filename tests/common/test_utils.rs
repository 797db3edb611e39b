use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response},
};
use search_gateway::{
    config::{AgentConfig, Config, LlmConfig},
    llm::LlmClient,
    server::{FrontendBundle, Gateway},
};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::fs;

pub const INDEX_HTML: &str = "<!doctype html><html><body><div id=\"root\"></div></body></html>";
pub const MAIN_JS: &str = "console.log('bundle');";

/// Create a test configuration pointing at an unreachable provider
pub fn create_test_config() -> Config {
    Config {
        llm: LlmConfig {
            base_url: "http://127.0.0.1:9/v1".to_string(),
            api_key: "test-api-key".to_string(),
            ..LlmConfig::default()
        },
        agent: AgentConfig {
            max_iterations: 3,
            max_execution_time_secs: 5,
            system_prompt: None,
        },
        ..Config::default()
    }
}

/// Create a temporary frontend bundle with an entry document and one asset
pub async fn create_test_bundle() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    fs::create_dir_all(dir.path().join("static/js")).await.unwrap();
    fs::write(dir.path().join("index.html"), INDEX_HTML).await.unwrap();
    fs::write(dir.path().join("static/js/main.js"), MAIN_JS).await.unwrap();
    fs::write(dir.path().join("favicon.ico"), [0u8, 0, 1, 0]).await.unwrap();
    dir
}

/// Build a router around `llm` serving the bundle at `bundle_dir`
pub fn create_test_app(llm: Arc<dyn LlmClient>, bundle_dir: &TempDir) -> Router {
    Gateway::new(llm, FrontendBundle::new(bundle_dir.path())).router()
}

pub fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).expect("response body is not JSON")
}
