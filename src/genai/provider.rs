//! Text provider adapter capability.
//!
//! The fallback chain only knows how to hand a [`GenerationRequest`] and a key
//! to something that returns text. Each provider owns its own wire format.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::request::GenerationRequest;
use super::retry::{classify_status, error_message};
use super::text::TextError;

/// Default timeout for a single text generation request (60 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A remote text generation endpoint.
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Name used in log lines.
    fn name(&self) -> &str;

    /// Run one request with `api_key` and return the trimmed text.
    ///
    /// # Errors
    ///
    /// `QuotaExceeded` on 429, `TransientOverload` on 503, `ApiError` on any
    /// other non-success status, `MalformedResponse` when the body lacks the
    /// expected text field, `HttpError` on transport failure.
    async fn generate(&self, api_key: &str, request: &GenerationRequest)
        -> Result<String, TextError>;
}

/// HTTP client shared by the text providers.
pub(crate) fn build_http_client() -> Result<reqwest::Client, TextError> {
    let client = reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .build()?;
    Ok(client)
}

/// Turn a response into `T`, classifying failures on the way.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, TextError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(classify_status(
            status.as_u16(),
            error_message(status.as_u16(), &body),
        ));
    }

    serde_json::from_str(&body).map_err(|e| TextError::MalformedResponse(e.to_string()))
}

/// Trim `text`, treating an absent field as a malformed response.
pub(crate) fn required_text(text: Option<String>, field: &str) -> Result<String, TextError> {
    text.map(|t| t.trim().to_string())
        .ok_or_else(|| TextError::MalformedResponse(format!("missing {} in response", field)))
}
