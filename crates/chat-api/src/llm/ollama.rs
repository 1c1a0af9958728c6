use crate::config::Settings;
use crate::llm::LlmClient;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://host.docker.internal:11434";
const DEFAULT_MODEL: &str = "llama3.2:latest";
const DEFAULT_TEMPERATURE: f64 = 0.1;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Non-streaming client for a locally hosted Ollama instance.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f64,
}

impl OllamaClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let base_url = settings
            .ollama_host
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = settings
            .ollama_model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let temperature = std::env::var("OLLAMA_TEMPERATURE")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(DEFAULT_TEMPERATURE);
        let timeout_secs = std::env::var("OLLAMA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build Ollama http client")?;

        Ok(Self {
            http,
            base_url,
            model,
            temperature,
        })
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let req = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        let res = self
            .http
            .post(url)
            .json(&req)
            .send()
            .await
            .context("Ollama request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Ollama response body")?;
        if !status.is_success() {
            anyhow::bail!("Ollama HTTP {status}: {text}");
        }

        let parsed = serde_json::from_str::<GenerateResponse>(&text)
            .with_context(|| format!("failed to parse Ollama response JSON: {text}"))?;
        Ok(parsed.response)
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        self.generate(prompt).await
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generate_response_text() {
        let body = r#"{
            "model": "llama3.2:latest",
            "created_at": "2025-03-01T09:00:00Z",
            "response": "The answer is 4.",
            "done": true,
            "done_reason": "stop"
        }"#;

        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.response, "The answer is 4.");
    }

    #[test]
    fn serializes_non_streaming_request() {
        let req = GenerateRequest {
            model: "llama3.2:latest",
            prompt: "Question: hi\n\nLet's think step by step\nAnswer:",
            stream: false,
            options: GenerateOptions { temperature: 0.1 },
        };

        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["model"], "llama3.2:latest");
        assert_eq!(v["stream"], false);
        assert_eq!(v["options"]["temperature"], 0.1);
    }
}
