//! Resilient clients for generative AI APIs.
//!
//! [`TextGenerationClient`] serves translation and prompt authoring from a
//! rotating pool of primary keys with a secondary provider behind it.
//! [`VideoJobClient`] submits long-running video jobs and polls them until
//! they finish, fail, or run out of time.

mod credentials;
mod deepseek;
mod gemini;
mod provider;
mod request;
mod retry;
mod template;
mod text;
mod timer;
mod video;

pub use credentials::{Credential, CredentialPool};
pub use deepseek::{DeepSeekProvider, DEEPSEEK_API_BASE_URL, DEFAULT_DEEPSEEK_MODEL};
pub use gemini::{GeminiProvider, DEFAULT_GEMINI_MODEL, GEMINI_API_BASE_URL};
pub use provider::TextProvider;
pub use request::{
    GenerationRequest, Message, PromptFields, Role, Tuning, DEFAULT_PROMPT_TYPE,
    PROMPT_AUTHORING_SYSTEM_PROMPT, TRANSLATION_SYSTEM_PROMPT,
};
pub use retry::{
    classify_status, overload_delay, DEFAULT_RETRY_DELAY, MAX_ATTEMPTS_PER_CREDENTIAL,
};
pub use template::{local_prompt, AUDIO_NOTE};
pub use text::{
    TextError, TextGenerationClient, DEEPSEEK_API_KEY_ENV, GEMINI_API_KEYS_ENV,
    TRANSLATION_UNAVAILABLE_MESSAGE,
};
pub use timer::{Timer, TokioTimer, VirtualTimer};
pub use video::{
    JobStatus, PollOutcome, VideoError, VideoJob, VideoJobClient, VideoOptions, VideoStatus,
    DEFAULT_ASPECT_RATIO, DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL, DEFAULT_VIDEO_MODEL,
    KIE_API_BASE_URL, KIE_API_KEY_ENV,
};
