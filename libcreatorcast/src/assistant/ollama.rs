//! Ollama-backed assistant
//!
//! Talks to an Ollama-compatible `/api/generate` endpoint with streaming
//! disabled: one request, one JSON response.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AssistantConfig;
use crate::error::{CreatorcastError, Result};
use crate::types::{AnalyticsTotals, GenerationKind, Platform};

use super::{generation_prompt, summary_prompt, Generator, Summarizer};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

pub struct OllamaAssistant {
    client: Client,
    host: String,
    model: String,
}

impl OllamaAssistant {
    pub fn new(config: &AssistantConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("creatorcast/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                CreatorcastError::Generation(format!("Failed to create HTTP client: {}", e))
            })?;

        tracing::debug!(
            "Initialized Ollama assistant: host={}, model={}",
            config.host,
            config.model
        );

        Ok(Self {
            client,
            host: config.host.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    async fn complete(&self, prompt: String) -> Result<String> {
        let url = format!("{}/api/generate", self.host);

        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Ollama request failed: {}", e);
                CreatorcastError::Generation(format!("Ollama request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Ollama returned error {}: {}", status, error_text);
            return Err(CreatorcastError::Generation(format!(
                "Ollama returned error {}: {}",
                status, error_text
            )));
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Ollama response: {}", e);
            CreatorcastError::Generation(format!("Failed to parse Ollama response: {}", e))
        })?;

        let text = body.response.trim();
        if text.is_empty() {
            return Err(CreatorcastError::Generation(
                "Ollama returned an empty response".to_string(),
            ));
        }

        Ok(text.to_string())
    }
}

#[async_trait]
impl Generator for OllamaAssistant {
    async fn generate(&self, kind: GenerationKind, idea: &str, platform: Platform) -> Result<String> {
        self.complete(generation_prompt(kind, idea, platform)).await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[async_trait]
impl Summarizer for OllamaAssistant {
    async fn summarize(&self, totals: &AnalyticsTotals) -> Result<String> {
        self.complete(summary_prompt(totals)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> AssistantConfig {
        AssistantConfig {
            host: format!("{}/", server.uri()),
            model: "test-model".to_string(),
            timeout_secs: 5,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_generate_caption() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({
                "model": "test-model",
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "test-model",
                "response": "  Big news is coming! #launch  ",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let assistant = OllamaAssistant::new(&config_for(&server)).unwrap();
        let caption = assistant
            .generate(GenerationKind::Caption, "launch video", Platform::Youtube)
            .await
            .unwrap();

        assert_eq!(caption, "Big news is coming! #launch");
    }

    #[tokio::test]
    async fn test_server_error_is_generation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .mount(&server)
            .await;

        let assistant = OllamaAssistant::new(&config_for(&server)).unwrap();
        let err = assistant
            .generate(GenerationKind::Script, "launch video", Platform::Tiktok)
            .await
            .unwrap_err();

        assert!(matches!(err, CreatorcastError::Generation(_)));
        assert!(err.to_string().contains("model not loaded"));
    }

    #[tokio::test]
    async fn test_blank_response_is_generation_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "   "
            })))
            .mount(&server)
            .await;

        let assistant = OllamaAssistant::new(&config_for(&server)).unwrap();
        let result = assistant.summarize(&AnalyticsTotals::default()).await;

        assert!(matches!(result, Err(CreatorcastError::Generation(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host() {
        let config = AssistantConfig {
            host: "http://127.0.0.1:1".to_string(),
            timeout_secs: 2,
            ..Default::default()
        };
        let assistant = OllamaAssistant::new(&config).unwrap();
        let result = assistant
            .generate(GenerationKind::Caption, "idea", Platform::Twitter)
            .await;

        assert!(matches!(result, Err(CreatorcastError::Generation(_))));
    }
}
