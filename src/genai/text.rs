//! TextGenerationClient - translation and prompt authoring over a rotating
//! credential pool with provider fallback.

use std::sync::Arc;
use std::time::Duration;

use super::credentials::CredentialPool;
use super::deepseek::DeepSeekProvider;
use super::gemini::GeminiProvider;
use super::provider::TextProvider;
use super::request::{GenerationRequest, PromptFields};
use super::retry::{overload_delay, DEFAULT_RETRY_DELAY, MAX_ATTEMPTS_PER_CREDENTIAL};
use super::template::local_prompt;
use super::timer::{Timer, TokioTimer};
use crate::config::TextConfig;

/// The environment variable holding comma-separated primary API keys.
pub const GEMINI_API_KEYS_ENV: &str = "GEMINI_API_KEYS";

/// The environment variable holding the secondary provider key.
pub const DEEPSEEK_API_KEY_ENV: &str = "DEEPSEEK_API_KEY";

/// Message shown to the user when translation cannot be served.
pub const TRANSLATION_UNAVAILABLE_MESSAGE: &str =
    "Translation service temporarily unavailable. Please try again in a few minutes.";

/// Attempts allowed per credential for translation (one in-place 503 retry).
const TRANSLATION_ATTEMPTS: u32 = MAX_ATTEMPTS_PER_CREDENTIAL;

/// Attempts allowed per credential for prompt authoring.
const PROMPT_AUTHORING_ATTEMPTS: u32 = 1;

/// Secondary provider plus the key it authenticates with.
struct Fallback {
    provider: Box<dyn TextProvider>,
    api_key: String,
}

/// Client for synchronous text generation.
///
/// Each call walks the credential pool once starting from the rotation
/// cursor, then tries the secondary provider. The cursor lives on the
/// instance, so `&mut self` on every operation keeps one call in flight.
pub struct TextGenerationClient {
    pool: CredentialPool,
    primary: Box<dyn TextProvider>,
    fallback: Option<Fallback>,
    timer: Arc<dyn Timer>,
    retry_delay: Duration,
}

impl TextGenerationClient {
    /// Create a client for the public Gemini endpoint with no secondary provider.
    ///
    /// # Errors
    ///
    /// Returns `TextError::MissingApiKey` if `api_keys` has no usable key.
    pub fn new<I, S>(api_keys: I) -> Result<Self, TextError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_primary(api_keys, Box::new(GeminiProvider::new()?))
    }

    /// Create a client with an explicit primary provider.
    pub fn with_primary<I, S>(api_keys: I, primary: Box<dyn TextProvider>) -> Result<Self, TextError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            pool: CredentialPool::new(api_keys)?,
            primary,
            fallback: None,
            timer: Arc::new(TokioTimer::new()),
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    /// Build a client from the `[text]` config section.
    pub fn from_config(config: &TextConfig) -> Result<Self, TextError> {
        let primary = GeminiProvider::with_base_url(config.base_url.clone())?
            .model(config.model.clone());
        let mut client = Self::with_primary(config.api_keys.iter().cloned(), Box::new(primary))?
            .with_retry_delay(Duration::from_millis(config.retry_delay_ms));

        if let Some(api_key) = config.fallback.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            let secondary = DeepSeekProvider::with_base_url(config.fallback.base_url.clone())?
                .model(config.fallback.model.clone());
            client = client.with_secondary(Box::new(secondary), api_key.clone());
        }

        Ok(client)
    }

    /// Provider tried once after the whole pool fails.
    pub fn with_secondary(mut self, provider: Box<dyn TextProvider>, api_key: String) -> Self {
        self.fallback = Some(Fallback { provider, api_key });
        self
    }

    /// Replace the clock/sleep primitive.
    pub fn with_timer(mut self, timer: Arc<dyn Timer>) -> Self {
        self.timer = timer;
        self
    }

    /// Base delay before retrying an overloaded credential.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Index of the credential the next call will try first.
    pub fn rotation_cursor(&self) -> usize {
        self.pool.cursor()
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    pub fn has_secondary(&self) -> bool {
        self.fallback.is_some()
    }

    /// Translate Myanmar text into natural English dialogue.
    ///
    /// The caller is expected to reject blank input before calling.
    ///
    /// # Errors
    ///
    /// Returns `TextError::ServiceUnavailable` once the pool and the
    /// secondary provider have all failed.
    pub async fn translate(&mut self, source_text: &str) -> Result<String, TextError> {
        let request = GenerationRequest::translation(source_text);

        match self.complete(&request, TRANSLATION_ATTEMPTS).await {
            Ok(text) => Ok(text),
            Err(e) => {
                log::error!("Translation failed on every provider: {}", e);
                Err(TextError::ServiceUnavailable(
                    TRANSLATION_UNAVAILABLE_MESSAGE.to_string(),
                ))
            }
        }
    }

    /// Author a Veo video prompt from scene fields.
    ///
    /// Never fails: under total outage the prompt is assembled locally.
    pub async fn generate_structured_prompt(&mut self, fields: &PromptFields) -> String {
        let request = GenerationRequest::prompt_authoring(fields);

        match self.complete(&request, PROMPT_AUTHORING_ATTEMPTS).await {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Prompt authoring failed on every provider ({}), using local template", e);
                local_prompt(fields)
            }
        }
    }

    /// Run `request` through the fallback chain.
    async fn complete(
        &mut self,
        request: &GenerationRequest,
        attempts_per_credential: u32,
    ) -> Result<String, TextError> {
        let mut attempts = 0u32;
        let mut last_error = match self
            .walk_pool(request, attempts_per_credential, &mut attempts)
            .await
        {
            Ok(text) => return Ok(text),
            Err(e) => e,
        };

        if let Some(fallback) = &self.fallback {
            log::warn!(
                "All {} primary API keys failed, trying {} fallback...",
                self.pool.len(),
                fallback.provider.name()
            );
            attempts += 1;
            match fallback.provider.generate(&fallback.api_key, request).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    log::error!("{} fallback also failed: {}", fallback.provider.name(), e);
                    last_error = e;
                }
            }
        }

        Err(TextError::AllProvidersExhausted {
            attempts,
            last_error: last_error.to_string(),
        })
    }

    /// Try every credential once, in rotation order.
    async fn walk_pool(
        &mut self,
        request: &GenerationRequest,
        attempts_per_credential: u32,
        attempts: &mut u32,
    ) -> Result<String, TextError> {
        let provider = self.primary.name().to_string();
        let mut last_error = TextError::MissingApiKey;

        for _ in 0..self.pool.len() {
            let credential = self.pool.next_credential();

            for attempt in 1..=attempts_per_credential {
                *attempts += 1;

                match self.primary.generate(credential.secret(), request).await {
                    Ok(text) => return Ok(text),
                    Err(e @ TextError::QuotaExceeded { .. }) => {
                        log::error!(
                            "{} API key {} quota exceeded, trying next key",
                            provider,
                            credential.ordinal
                        );
                        last_error = e;
                        break;
                    }
                    Err(e @ TextError::TransientOverload { .. })
                        if attempt < attempts_per_credential =>
                    {
                        let delay = overload_delay(attempt, self.retry_delay);
                        log::warn!(
                            "{} API key {} overloaded, retrying in {:?}...",
                            provider,
                            credential.ordinal,
                            delay
                        );
                        last_error = e;
                        self.timer.sleep(delay).await;
                    }
                    Err(e) => {
                        log::error!(
                            "{} API key {} failed (attempt {}): {}",
                            provider,
                            credential.ordinal,
                            attempt,
                            e
                        );
                        last_error = e;
                        break;
                    }
                }
            }
        }

        Err(last_error)
    }
}

/// Errors that can occur during text generation.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("Quota exceeded: {message}")]
    QuotaExceeded {
        /// Message reported by the provider
        message: String,
    },

    #[error("Service overloaded: {message}")]
    TransientOverload {
        /// Message reported by the provider
        message: String,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("All providers failed after {attempts} attempts: {last_error}")]
    AllProvidersExhausted {
        /// Remote calls made across the pool and the secondary provider
        attempts: u32,
        /// Display text of the final failure
        last_error: String,
    },

    #[error("{0}")]
    ServiceUnavailable(String),
}
