//! Secondary text provider: an OpenAI-style chat completions endpoint
//! (DeepSeek by default).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::provider::{build_http_client, read_json, required_text, TextProvider};
use super::request::{GenerationRequest, Message};
use super::text::TextError;

/// Default base URL for the DeepSeek API.
pub const DEEPSEEK_API_BASE_URL: &str = "https://api.deepseek.com";

/// Default DeepSeek model.
pub const DEFAULT_DEEPSEEK_MODEL: &str = "deepseek-chat";

/// Sampling temperature used for every fallback call.
const FALLBACK_TEMPERATURE: f32 = 0.3;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completions adapter with bearer authentication.
pub struct DeepSeekProvider {
    base_url: String,
    model: String,
    http_client: reqwest::Client,
}

impl DeepSeekProvider {
    /// Provider pointed at the public DeepSeek endpoint.
    pub fn new() -> Result<Self, TextError> {
        Self::with_base_url(DEEPSEEK_API_BASE_URL.to_string())
    }

    /// Provider pointed at a custom base URL. Useful for testing.
    pub fn with_base_url(base_url: String) -> Result<Self, TextError> {
        Ok(Self {
            base_url,
            model: DEFAULT_DEEPSEEK_MODEL.to_string(),
            http_client: build_http_client()?,
        })
    }

    /// Replace the model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextProvider for DeepSeekProvider {
    fn name(&self) -> &str {
        "deepseek"
    }

    async fn generate(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> Result<String, TextError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );

        let body = ChatRequest {
            model: &self.model,
            messages: &request.messages,
            max_tokens: request.tuning.max_output_tokens,
            temperature: FALLBACK_TEMPERATURE,
        };

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let parsed: ChatResponse = read_json(response).await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content);
        required_text(content, "choices[0].message.content")
    }
}
