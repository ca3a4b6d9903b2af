//! End-to-end checks of the `olevel-tutor` flow against a mock Gemini server.

use olevel_tutor::app::{run, Credentials, Settings};
use olevel_tutor::tutor::ENGLISH_TUTOR_PROMPT;
use olevel_tutor::{Error, ModelName};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.0-flash-exp:generateContent";

fn settings_for(server: &MockServer) -> Settings {
    let mut settings = Settings::with_api_key("test-api-key");
    settings.base_url = Some(server.uri());
    settings
}

fn expected_body() -> serde_json::Value {
    json!({
        "contents": [
            {"role": "user", "parts": [{"text": ENGLISH_TUTOR_PROMPT}]}
        ],
        "generationConfig": {
            "temperature": 1.0,
            "topP": 0.95,
            "topK": 40,
            "maxOutputTokens": 8192,
            "responseMimeType": "text/plain"
        }
    })
}

fn reply_body(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP",
            "safetyRatings": []
        }],
        "usageMetadata": {"promptTokenCount": 210, "candidatesTokenCount": 12, "totalTokenCount": 222},
        "modelVersion": "gemini-2.0-flash-exp"
    })
}

#[tokio::test]
async fn test_sends_one_request_with_fixed_configuration() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-api-key"))
        .and(body_json(expected_body()))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("Hello! How can I help?")))
        .expect(1)
        .mount(&server)
        .await;

    let mut out = Vec::new();
    run(&settings_for(&server), &mut out).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    // The history is empty at send time: the prompt is the only turn.
    let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent["contents"].as_array().unwrap().len(), 1);
    assert!(sent.get("systemInstruction").is_none());
}

#[tokio::test]
async fn test_prints_exactly_the_reply_text() {
    let server = MockServer::start().await;
    let reply = "Hi there!\n\nI can help with *summary writing* and comprehension.";

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body(reply)))
        .mount(&server)
        .await;

    let mut out = Vec::new();
    run(&settings_for(&server), &mut out).await.unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), format!("{reply}\n"));
}

#[tokio::test]
async fn test_joins_multiple_text_parts() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Part one. "}, {"text": "Part two."}]},
                "finishReason": "STOP"
            }]
        })))
        .mount(&server)
        .await;

    let mut out = Vec::new();
    run(&settings_for(&server), &mut out).await.unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "Part one. Part two.\n");
}

#[tokio::test]
async fn test_no_request_when_client_construction_fails() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let mut settings = Settings::with_api_key("");
    settings.base_url = Some(server.uri());

    let mut out = Vec::new();
    let result = run(&settings, &mut out).await;

    assert!(matches!(result, Err(Error::Auth(_))));
    assert!(out.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_request_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": {"code": 503, "message": "The model is overloaded. Please try again later.", "status": "UNAVAILABLE"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut out = Vec::new();
    let result = run(&settings_for(&server), &mut out).await;

    match result {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "The model is overloaded. Please try again later.");
        }
        other => panic!("Expected API error, got {other:?}"),
    }
    assert!(out.is_empty());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_key_surfaces_api_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = run(&settings_for(&server), &mut Vec::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("API key not valid"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_blocked_prompt_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": {"blockReason": "OTHER"}
        })))
        .mount(&server)
        .await;

    let result = run(&settings_for(&server), &mut Vec::new()).await;
    assert!(matches!(result, Err(Error::Blocked(_))));
}

#[tokio::test]
async fn test_selected_model_changes_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-pro:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("from pro")))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = settings_for(&server);
    settings.model = ModelName::Gemini15Pro;

    let mut out = Vec::new();
    run(&settings, &mut out).await.unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "from pro\n");
}

#[tokio::test]
async fn test_streaming_prints_deltas() {
    let server = MockServer::start().await;

    let sse = concat!(
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\"Hello\"}]}}]}\r\n\r\n",
        "data: {\"candidates\":[{\"content\":{\"role\":\"model\",\"parts\":[{\"text\":\", student!\"}]},\"finishReason\":\"STOP\"}],",
        "\"usageMetadata\":{\"promptTokenCount\":210,\"candidatesTokenCount\":4,\"totalTokenCount\":214}}\r\n\r\n",
    );

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash-exp:streamGenerateContent"))
        .and(query_param("alt", "sse"))
        .and(body_json(expected_body()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse, "text/event-stream")
                .insert_header("cache-control", "no-cache"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = settings_for(&server);
    settings.stream = true;

    let mut out = Vec::new();
    run(&settings, &mut out).await.unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "Hello, student!\n");
}

#[tokio::test]
async fn test_vertex_access_token_uses_bearer_auth() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(
            "/v1/projects/tutor-project/locations/asia-southeast1/publishers/google/models/gemini-2.0-flash-exp:generateContent",
        ))
        .and(header("authorization", "Bearer vertex-token"))
        .and(body_json(expected_body()))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("from vertex")))
        .expect(1)
        .mount(&server)
        .await;

    let settings = Settings {
        credentials: Credentials::Vertex {
            project_id: "tutor-project".to_string(),
            location: "asia-southeast1".to_string(),
            access_token: Some("vertex-token".to_string()),
        },
        model: ModelName::default(),
        base_url: Some(server.uri()),
        stream: false,
    };

    let mut out = Vec::new();
    run(&settings, &mut out).await.unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "from vertex\n");
}

#[tokio::test]
async fn test_streaming_withheld_reply_is_an_error() {
    let server = MockServer::start().await;

    let sse = "data: {\"candidates\":[{\"finishReason\":\"SAFETY\"}]}\r\n\r\n";

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash-exp:streamGenerateContent"))
        .and(query_param("alt", "sse"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let mut settings = settings_for(&server);
    settings.stream = true;

    let mut out = Vec::new();
    let result = run(&settings, &mut out).await;

    assert!(matches!(result, Err(Error::Blocked(_))));
    assert!(out.is_empty());
}
