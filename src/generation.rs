//! Text-generation client (OpenRouter chat completions).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::UpstreamError;
use crate::prompt::ComposedPrompt;
use crate::DiaryError;

// ---

const SERVICE: &str = "openrouter";
const REFERER: &str = "https://leafmealone.com";
const TITLE: &str = "LeafMeAlone";

/// Sampling settings, fixed for the lifetime of a client.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub max_tokens: u32,
    pub temperature: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            max_tokens: 100,
            temperature: 1.0,
            presence_penalty: 0.8,
            frequency_penalty: 0.8,
        }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete `prompt`, returning the raw text of the first choice.
    async fn complete(&self, prompt: &ComposedPrompt, seed: u64) -> Result<String, DiaryError>;
}

/// OpenRouter chat-completions client.
pub struct OpenRouterClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
    params: SamplingParams,
}

impl OpenRouterClient {
    // ---
    pub fn new(
        client: Client,
        api_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        // ---
        Self {
            client,
            api_url: api_url.into(),
            api_key,
            model: model.into(),
            params: SamplingParams::default(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, prompt: &ComposedPrompt, seed: u64) -> ChatRequest {
        // ---
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: prompt.system.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.user.clone(),
                },
            ],
            max_tokens: self.params.max_tokens,
            temperature: self.params.temperature,
            presence_penalty: self.params.presence_penalty,
            frequency_penalty: self.params.frequency_penalty,
            seed,
        }
    }
}

#[async_trait]
impl TextGenerator for OpenRouterClient {
    // ---
    async fn complete(&self, prompt: &ComposedPrompt, seed: u64) -> Result<String, DiaryError> {
        // ---
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(DiaryError::ConfigurationMissing("OPENROUTER_API_KEY"))?;

        let request = self.build_request(prompt, seed);
        debug!(model = %self.model, seed, "Sending request to OpenRouter");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
            .header("Cache-Control", "no-cache, no-store, must-revalidate")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to reach OpenRouter");
                DiaryError::upstream(SERVICE, UpstreamError::Unreachable(e.to_string()))
            })?;

        let status = response.status();
        if !status.is_success() {
            // Surface the service's own message when the body carries one
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| "Unknown error".to_string());

            error!(status = %status, body = %body, "OpenRouter API error");
            return Err(DiaryError::upstream(
                SERVICE,
                UpstreamError::Status {
                    status: status.as_u16(),
                    message,
                },
            ));
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse OpenRouter response");
            DiaryError::upstream(SERVICE, UpstreamError::MalformedResponse(e.to_string()))
        })?;

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                error!("OpenRouter response has no completion text");
                DiaryError::upstream(
                    SERVICE,
                    UpstreamError::MalformedResponse("missing choices[0].message.content".to_string()),
                )
            })?;

        debug!(text_length = text.chars().count(), "Received completion from OpenRouter");
        Ok(text)
    }
}

// === Request/Response Types ===

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    presence_penalty: f32,
    frequency_penalty: f32,
    seed: u64,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}
