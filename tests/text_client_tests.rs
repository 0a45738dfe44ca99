//! Mock HTTP tests for TextGenerationClient and its providers.
//!
//! These tests cover:
//! - Request formatting for both providers
//! - Key rotation and per-key retry rules
//! - Secondary provider fallback
//! - Total-outage behavior of translation and prompt authoring

use std::sync::Arc;
use std::time::Duration;

use veo_studio::config::TextConfig;
use veo_studio::genai::{
    DeepSeekProvider, GeminiProvider, GenerationRequest, PromptFields, TextError,
    TextGenerationClient, TextProvider, VirtualTimer, DEFAULT_GEMINI_MODEL,
    TRANSLATION_UNAVAILABLE_MESSAGE,
};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GEMINI_PATH: &str = "/v1beta/models/gemini-1.5-flash-latest:generateContent";
const CHAT_PATH: &str = "/v1/chat/completions";

fn gemini_text(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]
    })
}

fn chat_text(text: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{"index": 0, "message": {"role": "assistant", "content": text}}]
    })
}

async fn mount_gemini(server: &MockServer, key: &str, response: ResponseTemplate, times: u64) {
    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(query_param("key", key))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

fn client_for(
    server: &MockServer,
    keys: &[&str],
    timer: &VirtualTimer,
) -> TextGenerationClient {
    let primary = GeminiProvider::with_base_url(server.uri()).unwrap();
    TextGenerationClient::with_primary(keys.iter().copied(), Box::new(primary))
        .unwrap()
        .with_timer(Arc::new(timer.clone()))
}

fn with_deepseek(client: TextGenerationClient, server: &MockServer) -> TextGenerationClient {
    let secondary = DeepSeekProvider::with_base_url(server.uri()).unwrap();
    client.with_secondary(Box::new(secondary), "ds-key".to_string())
}

fn sample_fields() -> PromptFields {
    PromptFields::new(
        "a crowded Yangon tea shop",
        "Ko Zaw, a cheerful street reporter",
        "What is your favourite tea?",
    )
    .with_second(
        "Daw Khin, a retired nurse",
        Some("Sweet milk tea, always.".to_string()),
    )
}

// === Provider Request Tests ===

#[tokio::test]
async fn test_gemini_sends_key_query_and_generation_config() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(query_param("key", "k1"))
        .and(header("Content-Type", "application/json"))
        .and(body_partial_json(serde_json::json!({
            "generationConfig": {"temperature": 0.3, "topK": 20, "topP": 0.8, "maxOutputTokens": 512}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text("  Hello there!  \n")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeminiProvider::with_base_url(server.uri()).unwrap();
    assert_eq!(provider.model_name(), DEFAULT_GEMINI_MODEL);
    let result = provider
        .generate("k1", &GenerationRequest::translation("မင်္ဂလာပါ"))
        .await
        .unwrap();

    assert_eq!(result, "Hello there!");
}

#[tokio::test]
async fn test_gemini_sends_safety_settings_and_two_parts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(body_partial_json(serde_json::json!({
            "safetySettings": [
                {"category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_MEDIUM_AND_ABOVE"},
                {"category": "HARM_CATEGORY_HATE_SPEECH", "threshold": "BLOCK_MEDIUM_AND_ABOVE"},
                {"category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": "BLOCK_MEDIUM_AND_ABOVE"},
                {"category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": "BLOCK_MEDIUM_AND_ABOVE"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeminiProvider::with_base_url(server.uri()).unwrap();
    let request = GenerationRequest::prompt_authoring(&sample_fields());
    provider.generate("k1", &request).await.unwrap();

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    let parts = body["contents"][0]["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 2);
    assert!(parts[1]["text"].as_str().unwrap().contains("Location: a crowded Yangon tea shop"));
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
}

#[tokio::test]
async fn test_gemini_classifies_statuses() {
    let server = MockServer::start().await;
    mount_gemini(
        &server,
        "quota",
        ResponseTemplate::new(429).set_body_json(serde_json::json!({
            "error": {"code": 429, "message": "Resource has been exhausted"}
        })),
        1,
    )
    .await;
    mount_gemini(&server, "busy", ResponseTemplate::new(503), 1).await;
    mount_gemini(&server, "bad", ResponseTemplate::new(400), 1).await;

    let provider = GeminiProvider::with_base_url(server.uri()).unwrap();
    let request = GenerationRequest::translation("x");

    match provider.generate("quota", &request).await {
        Err(TextError::QuotaExceeded { message }) => {
            assert_eq!(message, "Resource has been exhausted");
        }
        other => panic!("Expected QuotaExceeded, got {:?}", other),
    }
    assert!(matches!(
        provider.generate("busy", &request).await,
        Err(TextError::TransientOverload { .. })
    ));
    assert!(matches!(
        provider.generate("bad", &request).await,
        Err(TextError::ApiError { status: 400, .. })
    ));
}

#[tokio::test]
async fn test_gemini_missing_text_is_malformed() {
    let server = MockServer::start().await;
    mount_gemini(
        &server,
        "k1",
        ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})),
        1,
    )
    .await;

    let provider = GeminiProvider::with_base_url(server.uri()).unwrap();
    let result = provider
        .generate("k1", &GenerationRequest::translation("x"))
        .await;

    assert!(matches!(result, Err(TextError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_gemini_invalid_json_is_malformed() {
    let server = MockServer::start().await;
    mount_gemini(
        &server,
        "k1",
        ResponseTemplate::new(200).set_body_string("not valid json"),
        1,
    )
    .await;

    let provider = GeminiProvider::with_base_url(server.uri()).unwrap();
    let result = provider
        .generate("k1", &GenerationRequest::translation("x"))
        .await;

    assert!(matches!(result, Err(TextError::MalformedResponse(_))));
}

#[tokio::test]
async fn test_deepseek_sends_bearer_and_chat_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("Authorization", "Bearer ds-key"))
        .and(body_partial_json(serde_json::json!({
            "model": "deepseek-chat",
            "max_tokens": 512,
            "temperature": 0.3
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_text(" Good morning ")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = DeepSeekProvider::with_base_url(server.uri()).unwrap();
    let result = provider
        .generate("ds-key", &GenerationRequest::translation("x"))
        .await
        .unwrap();

    assert_eq!(result, "Good morning");

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
}

// === Fallback Chain Tests ===

#[tokio::test]
async fn test_translate_returns_first_success() {
    let server = MockServer::start().await;
    mount_gemini(
        &server,
        "k1",
        ResponseTemplate::new(200).set_body_json(gemini_text("How are you?")),
        1,
    )
    .await;

    let timer = VirtualTimer::new();
    let mut client = client_for(&server, &["k1", "k2"], &timer);

    assert_eq!(client.translate("နေကောင်းလား").await.unwrap(), "How are you?");
    assert_eq!(client.rotation_cursor(), 1);
}

#[tokio::test]
async fn test_quota_on_every_key_falls_back_to_secondary_once() {
    let server = MockServer::start().await;
    for key in ["k1", "k2", "k3"] {
        mount_gemini(&server, key, ResponseTemplate::new(429), 1).await;
    }
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_text("From fallback")))
        .expect(1)
        .mount(&server)
        .await;

    let timer = VirtualTimer::new();
    let mut client = with_deepseek(client_for(&server, &["k1", "k2", "k3"], &timer), &server);

    assert_eq!(client.translate("x").await.unwrap(), "From fallback");
    assert!(timer.sleeps().is_empty());
    assert_eq!(client.rotation_cursor(), 0);
}

#[tokio::test]
async fn test_overload_retries_same_key_after_two_seconds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(query_param("key", "k1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_gemini(
        &server,
        "k1",
        ResponseTemplate::new(200).set_body_json(gemini_text("Recovered")),
        1,
    )
    .await;
    mount_gemini(&server, "k2", ResponseTemplate::new(200), 0).await;

    let timer = VirtualTimer::new();
    let mut client = client_for(&server, &["k1", "k2"], &timer);

    assert_eq!(client.translate("x").await.unwrap(), "Recovered");
    assert_eq!(timer.sleeps(), vec![Duration::from_millis(2000)]);
}

#[tokio::test]
async fn test_second_overload_moves_to_next_key() {
    let server = MockServer::start().await;
    mount_gemini(&server, "k1", ResponseTemplate::new(503), 2).await;
    mount_gemini(
        &server,
        "k2",
        ResponseTemplate::new(200).set_body_json(gemini_text("Second key")),
        1,
    )
    .await;

    let timer = VirtualTimer::new();
    let mut client = client_for(&server, &["k1", "k2"], &timer);

    assert_eq!(client.translate("x").await.unwrap(), "Second key");
    assert_eq!(timer.sleeps(), vec![Duration::from_millis(2000)]);
}

#[tokio::test]
async fn test_malformed_body_moves_to_next_key_without_retry() {
    let server = MockServer::start().await;
    mount_gemini(
        &server,
        "k1",
        ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": [{}]})),
        1,
    )
    .await;
    mount_gemini(
        &server,
        "k2",
        ResponseTemplate::new(200).set_body_json(gemini_text("Good")),
        1,
    )
    .await;

    let timer = VirtualTimer::new();
    let mut client = client_for(&server, &["k1", "k2"], &timer);

    assert_eq!(client.translate("x").await.unwrap(), "Good");
    assert!(timer.sleeps().is_empty());
}

#[tokio::test]
async fn test_rotation_carries_across_operations() {
    let server = MockServer::start().await;
    mount_gemini(
        &server,
        "k1",
        ResponseTemplate::new(200).set_body_json(gemini_text("one")),
        1,
    )
    .await;
    mount_gemini(
        &server,
        "k2",
        ResponseTemplate::new(200).set_body_json(gemini_text("two")),
        1,
    )
    .await;

    let timer = VirtualTimer::new();
    let mut client = client_for(&server, &["k1", "k2"], &timer);

    assert_eq!(client.translate("x").await.unwrap(), "one");
    assert_eq!(client.generate_structured_prompt(&sample_fields()).await, "two");
    assert_eq!(client.rotation_cursor(), 0);
}

#[tokio::test]
async fn test_separate_clients_rotate_independently() {
    let server = MockServer::start().await;
    mount_gemini(
        &server,
        "k1",
        ResponseTemplate::new(200).set_body_json(gemini_text("first")),
        2,
    )
    .await;
    mount_gemini(&server, "k2", ResponseTemplate::new(200), 0).await;

    let timer = VirtualTimer::new();
    let mut a = client_for(&server, &["k1", "k2"], &timer);
    let mut b = client_for(&server, &["k1", "k2"], &timer);

    a.translate("x").await.unwrap();
    b.translate("y").await.unwrap();
    assert_eq!(a.rotation_cursor(), 1);
    assert_eq!(b.rotation_cursor(), 1);
}

#[tokio::test]
async fn test_prompt_authoring_makes_one_attempt_per_key() {
    let server = MockServer::start().await;
    mount_gemini(&server, "k1", ResponseTemplate::new(503), 1).await;
    mount_gemini(
        &server,
        "k2",
        ResponseTemplate::new(200).set_body_json(gemini_text("✅ At a tea shop")),
        1,
    )
    .await;

    let timer = VirtualTimer::new();
    let mut client = client_for(&server, &["k1", "k2"], &timer);

    let prompt = client.generate_structured_prompt(&sample_fields()).await;
    assert_eq!(prompt, "✅ At a tea shop");
    assert!(timer.sleeps().is_empty());
}

#[tokio::test]
async fn test_translate_total_outage_is_service_unavailable() {
    let server = MockServer::start().await;
    mount_gemini(&server, "k1", ResponseTemplate::new(429), 1).await;
    mount_gemini(&server, "k2", ResponseTemplate::new(500), 1).await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let timer = VirtualTimer::new();
    let mut client = with_deepseek(client_for(&server, &["k1", "k2"], &timer), &server);

    match client.translate("x").await {
        Err(TextError::ServiceUnavailable(message)) => {
            assert_eq!(message, TRANSLATION_UNAVAILABLE_MESSAGE);
        }
        other => panic!("Expected ServiceUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_prompt_total_outage_returns_local_template() {
    let server = MockServer::start().await;
    mount_gemini(&server, "k1", ResponseTemplate::new(500), 1).await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let timer = VirtualTimer::new();
    let mut client = with_deepseek(client_for(&server, &["k1"], &timer), &server);

    let prompt = client.generate_structured_prompt(&sample_fields()).await;
    assert!(prompt.starts_with("✅ At a crowded Yangon tea shop"));
    assert!(prompt.contains("Ko Zaw, a cheerful street reporter interviews Daw Khin, a retired nurse."));
    assert!(prompt.contains("Ko asks *in a clear Burmese language* \"What is your favourite tea?\""));
    assert!(prompt.contains("Daw replies *in clear Burmese language* \"Sweet milk tea, always.\""));
    assert!(prompt.ends_with("Note that output audio must be in burmese language."));
}

#[tokio::test]
async fn test_unreachable_primary_without_secondary_uses_template() {
    // Nothing listens on the discard port, so every call fails at transport level.
    let primary = GeminiProvider::with_base_url("http://127.0.0.1:9".to_string()).unwrap();
    let mut client = TextGenerationClient::with_primary(["k1"], Box::new(primary))
        .unwrap()
        .with_timer(Arc::new(VirtualTimer::new()));

    let fields = PromptFields::new("a quiet library", "Librarian May", "Please be silent.");
    let prompt = client.generate_structured_prompt(&fields).await;

    assert!(prompt.contains("a quiet library"));
    assert!(prompt.contains("Librarian asks"));
    assert!(!client.has_secondary());
}

// === Config Tests ===

#[tokio::test]
async fn test_from_config_wires_both_providers() {
    let server = MockServer::start().await;
    mount_gemini(&server, "cfg-key", ResponseTemplate::new(429), 1).await;
    Mock::given(method("POST"))
        .and(path(CHAT_PATH))
        .and(header("Authorization", "Bearer cfg-ds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_text("configured")))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = TextConfig::default();
    config.api_keys = vec!["cfg-key".to_string()];
    config.base_url = server.uri();
    config.fallback.api_key = Some("cfg-ds".to_string());
    config.fallback.base_url = server.uri();

    let mut client = TextGenerationClient::from_config(&config).unwrap();
    assert_eq!(client.pool_size(), 1);
    assert!(client.has_secondary());
    assert_eq!(client.translate("x").await.unwrap(), "configured");
}

#[test]
fn test_from_config_without_keys_fails() {
    let result = TextGenerationClient::from_config(&TextConfig::default());
    assert!(matches!(result, Err(TextError::MissingApiKey)));
}
