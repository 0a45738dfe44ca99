//! VideoJobClient - submits Veo generation jobs and polls them to completion.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;

use super::timer::{Timer, TokioTimer};
use crate::config::VideoConfig;

/// The environment variable name for the video API key.
pub const KIE_API_KEY_ENV: &str = "KIE_API_KEY";

/// Default base URL for the video API.
pub const KIE_API_BASE_URL: &str = "https://api.kie.ai";

/// Default model for video generation.
pub const DEFAULT_VIDEO_MODEL: &str = "veo3";

/// Default aspect ratio for generated videos.
pub const DEFAULT_ASPECT_RATIO: &str = "16:9";

/// Default polling interval for status checks (10 seconds).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default ceiling on the total wait for a job (10 minutes).
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_millis(600_000);

/// Default timeout for HTTP requests (30 seconds).
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// `code` value the API uses for success, in both envelopes.
const API_CODE_OK: i64 = 200;

/// Provider `successFlag` values.
const FLAG_SUCCEEDED: i64 = 1;
const FLAG_FAILED: i64 = 2;
const FLAG_CREATE_FAILED: i64 = 3;

/// Optional submission parameters.
///
/// Keys in `extra` are merged into the request body last and win over the
/// named fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoOptions {
    pub model: Option<String>,
    pub aspect_ratio: Option<String>,
    pub extra: Map<String, Value>,
}

impl VideoOptions {
    pub fn with_aspect_ratio(mut self, aspect_ratio: impl Into<String>) -> Self {
        self.aspect_ratio = Some(aspect_ratio.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Add an arbitrary body field.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Common `{code, msg, data}` envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct SubmitData {
    #[serde(rename = "taskId")]
    task_id: String,
}

/// Raw status payload from the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoStatus {
    /// 0 running, 1 succeeded, 2 or 3 failed.
    #[serde(rename = "successFlag", default)]
    pub success_flag: i64,
    /// JSON-encoded array of result URLs, present on success.
    #[serde(rename = "resultUrls", default, skip_serializing_if = "Option::is_none")]
    pub result_urls: Option<String>,
    /// Every other field the provider sent.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VideoStatus {
    /// Interpret the payload.
    ///
    /// # Errors
    ///
    /// Returns `VideoError::StatusCheckFailed` if a success payload carries a
    /// `resultUrls` value that is not a JSON array of strings.
    pub fn outcome(&self) -> Result<PollOutcome, VideoError> {
        match self.success_flag {
            FLAG_SUCCEEDED => {
                let urls: Vec<String> = match self.result_urls.as_deref() {
                    Some(raw) if !raw.trim().is_empty() => serde_json::from_str(raw)
                        .map_err(|e| {
                            VideoError::StatusCheckFailed(format!(
                                "resultUrls is not a JSON array: {}",
                                e
                            ))
                        })?,
                    _ => Vec::new(),
                };
                Ok(PollOutcome::Succeeded(urls))
            }
            FLAG_FAILED | FLAG_CREATE_FAILED => Ok(PollOutcome::Failed(self.failure_reason())),
            _ => Ok(PollOutcome::StillRunning),
        }
    }

    fn failure_reason(&self) -> String {
        self.extra
            .get("errorMessage")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Video generation failed (successFlag {})", self.success_flag))
    }
}

/// What a single poll says about the job.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    StillRunning,
    Succeeded(Vec<String>),
    Failed(String),
}

/// Lifecycle of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    /// Accepted by the provider, not yet polled.
    Created,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

/// Handle for a submitted job. Only poll responses change it.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoJob {
    pub task_id: String,
    pub status: JobStatus,
    pub result_urls: Vec<String>,
}

impl VideoJob {
    fn created(task_id: String) -> Self {
        Self {
            task_id,
            status: JobStatus::Created,
            result_urls: Vec::new(),
        }
    }
}

/// Client for the asynchronous video generation API.
pub struct VideoJobClient {
    api_key: String,
    base_url: String,
    model: String,
    aspect_ratio: String,
    poll_interval: Duration,
    http_client: reqwest::Client,
    timer: Arc<dyn Timer>,
}

impl VideoJobClient {
    /// Create a client by reading the API key from `KIE_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns `VideoError::MissingApiKey` if the variable is not set.
    pub fn new() -> Result<Self, VideoError> {
        let api_key = std::env::var(KIE_API_KEY_ENV).map_err(|_| VideoError::MissingApiKey)?;
        Self::with_api_key(api_key)
    }

    /// Create a client with an explicit API key.
    pub fn with_api_key(api_key: String) -> Result<Self, VideoError> {
        Self::with_base_url(api_key, KIE_API_BASE_URL.to_string())
    }

    /// Create a client with a custom base URL.
    ///
    /// Useful for testing against a mock server.
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, VideoError> {
        if api_key.trim().is_empty() {
            return Err(VideoError::MissingApiKey);
        }

        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| VideoError::SubmissionFailed(format!("HTTP client setup failed: {}", e)))?;

        Ok(Self {
            api_key,
            base_url,
            model: DEFAULT_VIDEO_MODEL.to_string(),
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            http_client,
            timer: Arc::new(TokioTimer::new()),
        })
    }

    /// Build a client from the `[video]` config section.
    pub fn from_config(config: &VideoConfig) -> Result<Self, VideoError> {
        let api_key = config.api_key.clone().ok_or(VideoError::MissingApiKey)?;
        Ok(Self::with_base_url(api_key, config.base_url.clone())?
            .with_model(config.model.clone())
            .with_aspect_ratio(config.aspect_ratio.clone())
            .with_poll_interval(Duration::from_secs(config.poll_interval_secs)))
    }

    /// Default model for submissions that don't name one.
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Default aspect ratio for submissions that don't name one.
    pub fn with_aspect_ratio(mut self, aspect_ratio: String) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Replace the clock/sleep primitive.
    pub fn with_timer(mut self, timer: Arc<dyn Timer>) -> Self {
        self.timer = timer;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn submission_body(&self, prompt: &str, options: &VideoOptions) -> Value {
        let mut body = Map::new();
        body.insert("prompt".to_string(), Value::from(prompt));
        body.insert(
            "model".to_string(),
            Value::from(options.model.clone().unwrap_or_else(|| self.model.clone())),
        );
        body.insert(
            "aspectRatio".to_string(),
            Value::from(
                options
                    .aspect_ratio
                    .clone()
                    .unwrap_or_else(|| self.aspect_ratio.clone()),
            ),
        );
        for (key, value) in &options.extra {
            body.insert(key.clone(), value.clone());
        }
        Value::Object(body)
    }

    /// Submit a video generation job.
    ///
    /// # Errors
    ///
    /// Returns `VideoError::EmptyPrompt` for a blank prompt and
    /// `VideoError::SubmissionFailed` for any transport failure, non-success
    /// status, non-200 `code`, or body without a task id.
    pub async fn submit(&self, prompt: &str, options: &VideoOptions) -> Result<VideoJob, VideoError> {
        if prompt.trim().is_empty() {
            return Err(VideoError::EmptyPrompt);
        }

        let response = self
            .http_client
            .post(self.endpoint("/api/v1/veo/generate"))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&self.submission_body(prompt, options))
            .send()
            .await
            .map_err(|e| VideoError::SubmissionFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| VideoError::SubmissionFailed(e.to_string()))?;

        let envelope: Envelope<SubmitData> = serde_json::from_str(&body).map_err(|_| {
            VideoError::SubmissionFailed(format!("status {}: unexpected response body", status))
        })?;

        match envelope.data {
            Some(data) if status.is_success() && envelope.code == API_CODE_OK => {
                log::info!("Video generation submitted, task_id: {}", data.task_id);
                Ok(VideoJob::created(data.task_id))
            }
            _ => Err(VideoError::SubmissionFailed(
                envelope.msg.unwrap_or_else(|| "Unknown error".to_string()),
            )),
        }
    }

    /// Fetch the current status of a task.
    ///
    /// # Errors
    ///
    /// Returns `VideoError::StatusCheckFailed` for any transport failure,
    /// non-success status, non-200 `code`, or body without data.
    pub async fn check_status(&self, task_id: &str) -> Result<VideoStatus, VideoError> {
        let response = self
            .http_client
            .get(self.endpoint("/api/v1/veo/record-info"))
            .query(&[("taskId", task_id)])
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| VideoError::StatusCheckFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| VideoError::StatusCheckFailed(e.to_string()))?;

        let envelope: Envelope<VideoStatus> = serde_json::from_str(&body).map_err(|_| {
            VideoError::StatusCheckFailed(format!("status {}: unexpected response body", status))
        })?;

        match envelope.data {
            Some(data) if status.is_success() && envelope.code == API_CODE_OK => Ok(data),
            _ => Err(VideoError::StatusCheckFailed(
                envelope.msg.unwrap_or_else(|| "Unknown error".to_string()),
            )),
        }
    }

    /// Poll `job` until it reaches a terminal state or `max_wait` elapses.
    ///
    /// `on_progress` sees every status payload, terminal ones included.
    /// Status-check failures end the wait immediately and are not retried.
    /// Dropping the returned future stops further polls.
    ///
    /// # Errors
    ///
    /// `GenerationFailed` for provider-declared failure, `Timeout` when the
    /// ceiling is exceeded, `StatusCheckFailed` when a poll fails.
    pub async fn wait_for_completion<F>(
        &self,
        job: &mut VideoJob,
        max_wait: Duration,
        mut on_progress: F,
    ) -> Result<Vec<String>, VideoError>
    where
        F: FnMut(&VideoStatus, &PollOutcome),
    {
        if job.status.is_terminal() {
            return match job.status {
                JobStatus::Succeeded => Ok(job.result_urls.clone()),
                _ => Err(VideoError::GenerationFailed {
                    task_id: job.task_id.clone(),
                    reason: "job already failed".to_string(),
                }),
            };
        }

        log::info!(
            "Polling task {} for completion (timeout: {:?})...",
            job.task_id,
            max_wait
        );
        let start = self.timer.now();

        loop {
            let elapsed = self.timer.now().saturating_sub(start);
            if elapsed >= max_wait {
                log::error!("Task {} timed out after {:?}", job.task_id, elapsed);
                return Err(VideoError::Timeout(max_wait));
            }

            let status = self.check_status(&job.task_id).await?;
            let outcome = status.outcome()?;
            on_progress(&status, &outcome);

            match outcome {
                PollOutcome::StillRunning => {
                    log::debug!("Task {}: successFlag {}, waiting...", job.task_id, status.success_flag);
                    job.status = JobStatus::Running;
                }
                PollOutcome::Succeeded(urls) => {
                    log::info!("Task {} complete with {} result(s)", job.task_id, urls.len());
                    job.status = JobStatus::Succeeded;
                    job.result_urls = urls.clone();
                    return Ok(urls);
                }
                PollOutcome::Failed(reason) => {
                    log::error!("Task {} failed: {}", job.task_id, reason);
                    job.status = JobStatus::Failed;
                    return Err(VideoError::GenerationFailed {
                        task_id: job.task_id.clone(),
                        reason,
                    });
                }
            }

            self.timer.sleep(self.poll_interval).await;
        }
    }

    /// Submit a job and wait for it.
    ///
    /// Returns the finished job so the caller keeps the task id for downloads.
    pub async fn generate<F>(
        &self,
        prompt: &str,
        options: &VideoOptions,
        max_wait: Duration,
        on_progress: F,
    ) -> Result<VideoJob, VideoError>
    where
        F: FnMut(&VideoStatus, &PollOutcome),
    {
        let mut job = self.submit(prompt, options).await?;
        self.wait_for_completion(&mut job, max_wait, on_progress)
            .await?;
        Ok(job)
    }

    /// Download every result of a finished job into `dir`.
    ///
    /// Files are named `veo3-video-{task_id}-{n}.mp4`, `n` starting at 1.
    pub async fn download_results(&self, job: &VideoJob, dir: &Path) -> Result<Vec<PathBuf>, VideoError> {
        let mut paths = Vec::with_capacity(job.result_urls.len());
        for (index, url) in job.result_urls.iter().enumerate() {
            let dest = dir.join(format!("veo3-video-{}-{}.mp4", job.task_id, index + 1));
            paths.push(self.download_video(url, &dest).await?);
        }
        Ok(paths)
    }

    /// Stream one video to `dest` without buffering it in memory.
    pub async fn download_video(&self, url: &str, dest: &Path) -> Result<PathBuf, VideoError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| VideoError::DownloadFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(VideoError::DownloadFailed(format!(
                "status {}: {}",
                status, error_text
            )));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();

        use futures_util::StreamExt;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| VideoError::DownloadFailed(e.to_string()))?;
            file.write_all(&chunk).await?;
        }

        file.flush().await?;

        Ok(dest.to_path_buf())
    }
}

/// Errors that can occur during video generation.
#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("Empty prompt")]
    EmptyPrompt,

    #[error("Video generation failed: {0}")]
    SubmissionFailed(String),

    #[error("Status check failed: {0}")]
    StatusCheckFailed(String),

    #[error("Video generation failed for task {task_id}: {reason}")]
    GenerationFailed { task_id: String, reason: String },

    #[error("Task timeout - video generation took longer than {0:?}")]
    Timeout(Duration),

    #[error("Video download failed: {0}")]
    DownloadFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(flag: i64, urls: Option<&str>) -> VideoStatus {
        VideoStatus {
            success_flag: flag,
            result_urls: urls.map(str::to_string),
            extra: Map::new(),
        }
    }

    #[test]
    fn test_with_api_key_empty_returns_error() {
        let result = VideoJobClient::with_api_key("".to_string());
        assert!(matches!(result, Err(VideoError::MissingApiKey)));
    }

    #[test]
    fn test_with_api_key_uses_defaults() {
        let client = VideoJobClient::with_api_key("key".to_string()).unwrap();
        assert_eq!(client.base_url(), KIE_API_BASE_URL);
        assert_eq!(client.model(), DEFAULT_VIDEO_MODEL);
        assert_eq!(client.poll_interval(), DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn test_submission_body_defaults() {
        let client = VideoJobClient::with_api_key("key".to_string()).unwrap();
        let body = client.submission_body("a cat", &VideoOptions::default());
        assert_eq!(
            body,
            serde_json::json!({"prompt": "a cat", "model": "veo3", "aspectRatio": "16:9"})
        );
    }

    #[test]
    fn test_submission_body_extra_overrides_named_fields() {
        let client = VideoJobClient::with_api_key("key".to_string()).unwrap();
        let options = VideoOptions::default()
            .with_aspect_ratio("9:16")
            .with_extra("model", Value::from("veo3_fast"))
            .with_extra("seeds", Value::from(42));
        let body = client.submission_body("a dog", &options);

        assert_eq!(body["aspectRatio"], "9:16");
        assert_eq!(body["model"], "veo3_fast");
        assert_eq!(body["seeds"], 42);
    }

    #[test]
    fn test_outcome_running_flag() {
        assert_eq!(status(0, None).outcome().unwrap(), PollOutcome::StillRunning);
    }

    #[test]
    fn test_outcome_success_parses_urls() {
        let outcome = status(1, Some(r#"["https://a/1.mp4","https://a/2.mp4"]"#))
            .outcome()
            .unwrap();
        assert_eq!(
            outcome,
            PollOutcome::Succeeded(vec![
                "https://a/1.mp4".to_string(),
                "https://a/2.mp4".to_string()
            ])
        );
    }

    #[test]
    fn test_outcome_success_without_urls_is_empty() {
        assert_eq!(status(1, None).outcome().unwrap(), PollOutcome::Succeeded(vec![]));
    }

    #[test]
    fn test_outcome_success_with_garbage_urls_fails() {
        let result = status(1, Some("not json")).outcome();
        assert!(matches!(result, Err(VideoError::StatusCheckFailed(_))));
    }

    #[test]
    fn test_outcome_failure_flags() {
        for flag in [2, 3] {
            match status(flag, None).outcome().unwrap() {
                PollOutcome::Failed(reason) => assert!(reason.contains(&flag.to_string())),
                other => panic!("Expected Failed, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_failure_reason_prefers_error_message() {
        let mut s = status(2, None);
        s.extra
            .insert("errorMessage".to_string(), Value::from("content policy"));
        assert_eq!(s.outcome().unwrap(), PollOutcome::Failed("content policy".to_string()));
    }

    #[test]
    fn test_status_deserializes_extra_fields() {
        let s: VideoStatus = serde_json::from_value(serde_json::json!({
            "taskId": "t1",
            "successFlag": 0,
            "paramJson": "{}"
        }))
        .unwrap();
        assert_eq!(s.success_flag, 0);
        assert_eq!(s.extra.get("taskId"), Some(&Value::from("t1")));
    }

    #[test]
    fn test_job_status_terminal() {
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Created.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }

    #[test]
    fn test_timeout_error_display() {
        let err = VideoError::Timeout(Duration::from_secs(5));
        assert!(err.to_string().contains("took longer than 5s"));
    }
}
