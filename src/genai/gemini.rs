//! Primary text provider: Gemini `generateContent`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::provider::{build_http_client, read_json, required_text, TextProvider};
use super::request::GenerationRequest;
use super::text::TextError;

/// Default base URL for the Gemini API.
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default Gemini model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";

/// Harm categories filtered on every request.
const SAFETY_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

const SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    fn into_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

/// Gemini adapter. The API key travels as a query parameter.
pub struct GeminiProvider {
    base_url: String,
    model: String,
    http_client: reqwest::Client,
}

impl GeminiProvider {
    /// Provider pointed at the public Gemini endpoint.
    pub fn new() -> Result<Self, TextError> {
        Self::with_base_url(GEMINI_API_BASE_URL.to_string())
    }

    /// Provider pointed at a custom base URL. Useful for testing.
    pub fn with_base_url(base_url: String) -> Result<Self, TextError> {
        Ok(Self {
            base_url,
            model: DEFAULT_GEMINI_MODEL.to_string(),
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

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl TextProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> Result<String, TextError> {
        // Gemini has no system role on this endpoint; every message becomes a part.
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: request
                    .messages
                    .iter()
                    .map(|m| Part { text: &m.content })
                    .collect(),
            }],
            generation_config: GenerationConfig {
                temperature: request.tuning.temperature,
                top_k: request.tuning.top_k,
                top_p: request.tuning.top_p,
                max_output_tokens: request.tuning.max_output_tokens,
            },
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|&category| SafetySetting {
                    category,
                    threshold: SAFETY_THRESHOLD,
                })
                .collect(),
        };

        let response = self
            .http_client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let parsed: GenerateContentResponse = read_json(response).await?;
        required_text(parsed.into_text(), "candidates[0].content.parts[0].text")
    }
}
