//! Shared test harness for E2E integration tests.
//!
//! Stands up a wiremock Ollama server and wires a real `IntentResolver` to
//! it through `ResolverConfig`, exercising the HTTP pipeline, completion,
//! policy and fallback together.

#![allow(dead_code)]

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ta_intent::ollama::OllamaConfig;
use ta_intent::{IntentResolver, ResolverConfig};

/// Build an Ollama chat response body around `content`.
pub fn chat_response(content: &str) -> serde_json::Value {
    json!({
        "model": "qwen2.5:0.5b",
        "message": {
            "role": "assistant",
            "content": content
        },
        "done": true
    })
}

/// Mock Ollama server plus a resolver pointed at it.
pub struct OllamaHarness {
    pub server: MockServer,
}

impl OllamaHarness {
    /// Start a server that answers the `/api/tags` probe exactly `probes` times.
    pub async fn start(probes: u64) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{"name": "qwen2.5:0.5b"}]
            })))
            .expect(probes)
            .mount(&server)
            .await;
        Self { server }
    }

    /// Start a server whose probe always fails with `status`.
    pub async fn unhealthy(status: u16, probes: u64) -> Self {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(status))
            .expect(probes)
            .mount(&server)
            .await;
        Self { server }
    }

    /// Every chat call returns `content` as the assistant message.
    pub async fn reply_with(&self, content: &str, calls: u64) {
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_response(content)))
            .expect(calls)
            .mount(&self.server)
            .await;
    }

    /// Every chat call fails with `status`.
    pub async fn fail_with(&self, status: u16, calls: u64) {
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(status))
            .expect(calls)
            .mount(&self.server)
            .await;
    }

    /// Config pointing at this server with a short timeout.
    pub fn config(&self) -> ResolverConfig {
        ResolverConfig {
            ollama: OllamaConfig {
                host: self.server.uri(),
                timeout_secs: 2,
                ..OllamaConfig::default()
            },
            ..ResolverConfig::default()
        }
    }

    pub fn resolver(&self) -> IntentResolver {
        IntentResolver::from_config(&self.config())
    }
}
