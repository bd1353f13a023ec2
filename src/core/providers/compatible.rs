//! Reasoning service over an OpenAI-compatible `/chat/completions` endpoint.

use super::http_client::build_provider_client_with_timeout;
use super::scrub::sanitize_api_error;
use super::traits::ReasoningService;
use crate::config::ReasoningConfig;
use crate::core::session::BoxFuture;
use crate::error::ReasoningError;
use anyhow::Context;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub struct OpenAiCompatibleReasoner {
    pub(crate) name: String,
    pub(crate) api_key: Option<String>,
    model: String,
    temperature: f64,
    /// Pre-computed chat completions URL.
    chat_url: String,
    client: Client,
}

impl OpenAiCompatibleReasoner {
    pub fn new(name: &str, base_url: &str, api_key: Option<&str>, model: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        let chat_url = if base_url.contains("chat/completions") {
            base_url.to_string()
        } else {
            format!("{base_url}/chat/completions")
        };

        Self {
            name: name.to_string(),
            api_key: api_key.map(ToString::to_string),
            model: model.to_string(),
            temperature: 0.2,
            chat_url,
            client: build_provider_client_with_timeout(60),
        }
    }

    pub fn from_config(config: &ReasoningConfig) -> Self {
        let mut reasoner = Self::new(
            "reasoning",
            &config.base_url,
            config.api_key.as_deref(),
            &config.model,
        );
        reasoner.temperature = config.temperature;
        reasoner.client = build_provider_client_with_timeout(config.timeout_secs);
        reasoner
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    fn chat_completions_url(&self) -> &str {
        &self.chat_url
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

fn extract_chat_text(response: &ChatResponse, provider_name: &str) -> anyhow::Result<String> {
    response
        .choices
        .first()
        .and_then(|choice| choice.message.content.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToString::to_string)
        .ok_or(ReasoningError::EmptyResponse)
        .with_context(|| format!("No response from {provider_name}"))
}

impl OpenAiCompatibleReasoner {
    async fn chat_with_system(&self, system_prompt: &str, message: &str) -> anyhow::Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            anyhow::bail!(
                "{} API key not set. Set CHAINPILOT_API_KEY or reasoning.api_key in config.toml.",
                self.name
            );
        };

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: system_prompt,
                },
                Message {
                    role: "user",
                    content: message,
                },
            ],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(self.chat_completions_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("{} chat completions request failed", self.name))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            let sanitized = sanitize_api_error(&error);
            return Err(ReasoningError::Request {
                service: self.name.clone(),
                message: format!("API error ({status}): {sanitized}"),
            }
            .into());
        }

        let chat: ChatResponse = response
            .json()
            .await
            .with_context(|| format!("{} chat completions JSON decode failed", self.name))?;
        extract_chat_text(&chat, &self.name)
    }
}

impl ReasoningService for OpenAiCompatibleReasoner {
    fn name(&self) -> &str {
        &self.name
    }

    fn complete<'a>(
        &'a self,
        system_prompt: &'a str,
        prompt: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<String>> {
        Box::pin(async move {
            tracing::debug!(service = %self.name, model = %self.model, "reasoning request");
            self.chat_with_system(system_prompt, prompt).await
        })
    }
}
