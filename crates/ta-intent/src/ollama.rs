//! Ollama-backed generative pipeline.
//!
//! Talks to a local Ollama HTTP API: `GET /api/tags` once at setup to make
//! sure the server is up, then `POST /api/chat` per resolution with JSON
//! output forced and near-greedy sampling.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::{ChatPrompt, GenerativePipeline, PipelineFactory};

/// Configuration for the local Ollama endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaConfig {
    /// Ollama HTTP API base URL.
    #[serde(default = "default_host")]
    pub host: String,
    /// Model to chat with.
    #[serde(default = "default_model")]
    pub model: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Whether the generative pipeline is used at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Upper bound on generated tokens.
    #[serde(default = "default_num_predict")]
    pub num_predict: u32,
    #[serde(default = "default_repeat_penalty")]
    pub repeat_penalty: f64,
}

fn default_host() -> String {
    "http://localhost:11434".into()
}
fn default_model() -> String {
    "qwen2.5:0.5b".into()
}
fn default_timeout_secs() -> u64 {
    5
}
fn default_enabled() -> bool {
    true
}
fn default_temperature() -> f64 {
    0.01
}
fn default_num_predict() -> u32 {
    256
}
fn default_repeat_penalty() -> f64 {
    1.1
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            enabled: default_enabled(),
            temperature: default_temperature(),
            num_predict: default_num_predict(),
            repeat_penalty: default_repeat_penalty(),
        }
    }
}

impl OllamaConfig {
    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.host.trim_end_matches('/'), endpoint)
    }
}

// ── Wire types ──────────────────────────────────────────────────

/// Ollama chat API request body.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    format: &'a str,
    stream: bool,
    options: SamplingOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct SamplingOptions {
    temperature: f64,
    num_predict: u32,
    repeat_penalty: f64,
}

/// Ollama chat API response (only fields we need).
#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

fn build_client(config: &OllamaConfig) -> PipelineResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| PipelineError::Init(e.to_string()))
}

fn lists_model(tags: &TagsResponse, model: &str) -> bool {
    tags.models
        .iter()
        .any(|m| m.name == model || m.name.strip_suffix(":latest") == Some(model))
}

// ── Connector ───────────────────────────────────────────────────

/// One-time setup of the Ollama pipeline: client construction plus a
/// reachability probe.
pub struct OllamaConnector {
    config: OllamaConfig,
}

impl OllamaConnector {
    pub fn new(config: OllamaConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PipelineFactory for OllamaConnector {
    async fn build(&self) -> PipelineResult<Arc<dyn GenerativePipeline>> {
        if !self.config.enabled {
            return Err(PipelineError::Disabled);
        }

        let client = build_client(&self.config)?;
        let response = client
            .get(self.config.url("/api/tags"))
            .send()
            .await
            .map_err(|e| PipelineError::Init(format!("ollama unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(PipelineError::Init(format!(
                "ollama probe returned {}",
                response.status()
            )));
        }

        match response.json::<TagsResponse>().await {
            Ok(tags) if !lists_model(&tags, &self.config.model) => {
                tracing::warn!(
                    model = %self.config.model,
                    available = tags.models.len(),
                    "configured model not listed by ollama"
                );
            }
            Ok(_) => {}
            Err(e) => tracing::debug!(error = %e, "could not read ollama model list"),
        }

        tracing::info!(
            host = %self.config.host,
            model = %self.config.model,
            "ollama pipeline connected"
        );
        Ok(Arc::new(OllamaPipeline {
            client,
            config: self.config.clone(),
        }))
    }
}

// ── Pipeline ────────────────────────────────────────────────────

/// Client for the Ollama chat endpoint.
pub struct OllamaPipeline {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaPipeline {
    /// Build a pipeline without probing the server.
    pub fn new(config: OllamaConfig) -> PipelineResult<Self> {
        let client = build_client(&config)?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl GenerativePipeline for OllamaPipeline {
    async fn invoke(&self, prompt: &ChatPrompt) -> PipelineResult<String> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            format: "json",
            stream: false,
            options: SamplingOptions {
                temperature: self.config.temperature,
                num_predict: self.config.num_predict,
                repeat_penalty: self.config.repeat_penalty,
            },
        };

        let response = self
            .client
            .post(self.config.url("/api/chat"))
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Status(status.as_u16()));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Decode(e.to_string()))?;

        let content = chat.message.ok_or(PipelineError::EmptyResponse)?.content;
        let content = content.trim();
        if content.is_empty() {
            return Err(PipelineError::EmptyResponse);
        }
        tracing::debug!(chars = content.chars().count(), "ollama replied");
        Ok(content.to_string())
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Helper: build an Ollama chat response body.
    fn ollama_response(content: &str) -> serde_json::Value {
        serde_json::json!({
            "model": "qwen2.5:0.5b",
            "message": {
                "role": "assistant",
                "content": content
            },
            "done": true
        })
    }

    fn config_for(server: &MockServer) -> OllamaConfig {
        OllamaConfig {
            host: server.uri(),
            timeout_secs: 2,
            ..OllamaConfig::default()
        }
    }

    fn prompt() -> ChatPrompt {
        ChatPrompt::new("system instructions", "创建巡检任务")
    }

    async fn mount_tags(server: &MockServer, status: u16) {
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
                "models": [{"name": "qwen2.5:0.5b"}]
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn invoke_returns_trimmed_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(ollama_response("  {\"intent\":\"打招呼\"}\n")),
            )
            .mount(&server)
            .await;

        let pipeline = OllamaPipeline::new(config_for(&server)).unwrap();
        let out = pipeline.invoke(&prompt()).await.unwrap();
        assert_eq!(out, "{\"intent\":\"打招呼\"}");
    }

    #[tokio::test]
    async fn invoke_sends_json_format_and_options() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "model": "qwen2.5:0.5b",
                "format": "json",
                "stream": false,
                "options": {"temperature": 0.01, "num_predict": 256, "repeat_penalty": 1.1},
                "messages": [
                    {"role": "system", "content": "system instructions"},
                    {"role": "user", "content": "创建巡检任务"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(ollama_response("{}")))
            .expect(1)
            .mount(&server)
            .await;

        let pipeline = OllamaPipeline::new(config_for(&server)).unwrap();
        assert_eq!(pipeline.invoke(&prompt()).await.unwrap(), "{}");
    }

    #[tokio::test]
    async fn invoke_non_200_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let pipeline = OllamaPipeline::new(config_for(&server)).unwrap();
        let err = pipeline.invoke(&prompt()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Status(500)));
    }

    #[tokio::test]
    async fn invoke_garbage_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let pipeline = OllamaPipeline::new(config_for(&server)).unwrap();
        let err = pipeline.invoke(&prompt()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Decode(_)));
    }

    #[tokio::test]
    async fn invoke_missing_message_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"done": true})))
            .mount(&server)
            .await;

        let pipeline = OllamaPipeline::new(config_for(&server)).unwrap();
        let err = pipeline.invoke(&prompt()).await.unwrap_err();
        assert!(matches!(err, PipelineError::EmptyResponse));
    }

    #[tokio::test]
    async fn invoke_timeout_is_request_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(ollama_response("{}"))
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        // Client timeout is 2s, mock delays 10s
        let pipeline = OllamaPipeline::new(config_for(&server)).unwrap();
        let err = pipeline.invoke(&prompt()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Request(_)));
    }

    #[tokio::test]
    async fn connector_probes_tags() {
        let server = MockServer::start().await;
        mount_tags(&server, 200).await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ollama_response("ok")))
            .mount(&server)
            .await;

        let pipeline = OllamaConnector::new(config_for(&server)).build().await.unwrap();
        assert_eq!(pipeline.name(), "ollama");
        assert_eq!(pipeline.invoke(&prompt()).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn connector_unlisted_model_still_builds() {
        let server = MockServer::start().await;
        mount_tags(&server, 200).await;
        let config = OllamaConfig {
            model: "llama3:8b".into(),
            ..config_for(&server)
        };
        assert!(OllamaConnector::new(config).build().await.is_ok());
    }

    #[tokio::test]
    async fn connector_probe_failure_is_init_error() {
        let server = MockServer::start().await;
        mount_tags(&server, 503).await;
        let err = OllamaConnector::new(config_for(&server))
            .build()
            .await
            .err()
            .unwrap();
        assert!(matches!(err, PipelineError::Init(_)));
    }

    #[tokio::test]
    async fn connector_disabled() {
        let config = OllamaConfig {
            enabled: false,
            ..OllamaConfig::default()
        };
        let err = OllamaConnector::new(config).build().await.err().unwrap();
        assert!(matches!(err, PipelineError::Disabled));
    }

    #[test]
    fn latest_tag_matches_bare_model_name() {
        let tags = TagsResponse {
            models: vec![ModelTag {
                name: "qwen2.5:latest".into(),
            }],
        };
        assert!(lists_model(&tags, "qwen2.5"));
        assert!(!lists_model(&tags, "qwen2.5:0.5b"));
    }

    #[test]
    fn config_defaults() {
        let config = OllamaConfig::default();
        assert_eq!(config.host, "http://localhost:11434");
        assert_eq!(config.model, "qwen2.5:0.5b");
        assert_eq!(config.timeout_secs, 5);
        assert!(config.enabled);
        assert_eq!(config.temperature, 0.01);
        assert_eq!(config.num_predict, 256);
        assert_eq!(config.repeat_penalty, 1.1);
    }

    #[test]
    fn url_tolerates_trailing_slash() {
        let config = OllamaConfig {
            host: "http://box:11434/".into(),
            ..OllamaConfig::default()
        };
        assert_eq!(config.url("/api/chat"), "http://box:11434/api/chat");
    }
}
