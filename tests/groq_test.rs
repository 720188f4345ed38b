use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use glance::auth::{AuthStorage, Credential};
use glance::consts::{API_KEY_ENV, PROVIDER};
use glance::explain::groq::GroqExplainer;
use glance::explain::{DetailLevel, ExplainError, Explainer, ExplanationRequest, Language, TextModel};
use glance::flow;
use glance::view::Notice;

/// An explainer pointed at `base_url` with a stored key.
fn explainer(base_url: &str) -> (GroqExplainer, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("glance.db");
    let storage = AuthStorage::open(db.to_str().unwrap()).unwrap();
    storage.set(PROVIDER, Credential::api_key("gsk_test")).unwrap();
    (GroqExplainer::new(Some(base_url.to_string()), storage), dir)
}

fn completion(text: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": "llama-3.3-70b-versatile",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": text },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 120, "completion_tokens": 48, "total_tokens": 168 }
    })
}

// ── Success ───────────────────────────────────────────────────────

#[tokio::test]
async fn returns_first_choice_and_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer gsk_test"))
        .and(body_partial_json(json!({
            "model": "llama-3.1-8b-instant",
            "max_tokens": 4096,
            "messages": [{ "role": "user", "content": "explain x" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("It adds numbers.")))
        .expect(1)
        .mount(&server)
        .await;

    let (explainer, _dir) = explainer(&server.uri());
    let explanation = explainer
        .explain(TextModel::Llama8b, "explain x")
        .await
        .unwrap();

    assert_eq!(explanation.text, "It adds numbers.");
    let usage = explanation.usage.unwrap();
    assert_eq!(usage.input_tokens, 120);
    assert_eq!(usage.output_tokens, 48);
}

#[tokio::test]
async fn sends_low_temperature() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
        .mount(&server)
        .await;

    let (explainer, _dir) = explainer(&format!("{}/", server.uri()));
    explainer.explain(TextModel::Gemma9b, "p").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/chat/completions");
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let temperature = body["temperature"].as_f64().unwrap();
    assert!((temperature - 0.1).abs() < 1e-6, "temperature was {temperature}");
    assert_eq!(body["model"], "gemma2-9b-it");
}

#[tokio::test]
async fn flow_renders_explanation_with_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Defines `main`.")))
        .mount(&server)
        .await;

    let (explainer, _dir) = explainer(&server.uri());
    let request = ExplanationRequest {
        code: "fn main() {}".to_string(),
        language: Language::Other,
        model: TextModel::Llama70b,
        detail: DetailLevel::Basic,
    };
    let view = flow::explain::run(&explainer, &request).await;
    assert_eq!(view.errors(), 0);
    assert_eq!(view.explanation.as_deref(), Some("Defines `main`."));

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    let prompt = body["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.contains("```\nfn main() {}\n```"));
}

// ── Failures ──────────────────────────────────────────────────────

#[tokio::test]
async fn unauthorized_uses_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Invalid API Key", "type": "invalid_request_error" }
        })))
        .mount(&server)
        .await;

    let (explainer, _dir) = explainer(&server.uri());
    let err = explainer.explain(TextModel::Llama70b, "p").await.unwrap_err();
    match &err {
        ExplainError::Unauthorized(msg) => assert_eq!(msg, "Invalid API Key"),
        other => panic!("expected Unauthorized, got {other:?}"),
    }
    assert!(err.is_credential());
}

#[tokio::test]
async fn unauthorized_flow_asks_for_a_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("nope"))
        .mount(&server)
        .await;

    let (explainer, _dir) = explainer(&server.uri());
    let request = ExplanationRequest {
        code: "x = 1".to_string(),
        language: Language::Python,
        model: TextModel::Llama70b,
        detail: DetailLevel::Medium,
    };
    let view = flow::explain::run(&explainer, &request).await;
    assert_eq!(view.errors(), 1);
    assert!(view.explanation.is_none());
    assert!(view.notices.iter().any(|n| matches!(n, Notice::Warning(_))));
}

#[tokio::test]
async fn server_error_keeps_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let (explainer, _dir) = explainer(&server.uri());
    let err = explainer.explain(TextModel::Llama70b, "p").await.unwrap_err();
    match err {
        ExplainError::Api { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("expected Api, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let (explainer, _dir) = explainer(&server.uri());
    let err = explainer.explain(TextModel::Llama70b, "p").await.unwrap_err();
    assert!(matches!(err, ExplainError::MalformedResponse(_)));
}

#[tokio::test]
async fn empty_choices_are_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let (explainer, _dir) = explainer(&server.uri());
    let err = explainer.explain(TextModel::Llama70b, "p").await.unwrap_err();
    assert!(matches!(err, ExplainError::MalformedResponse(_)));
}

#[tokio::test]
async fn connection_refused_is_a_network_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let (explainer, _dir) = explainer(&uri);
    let err = explainer.explain(TextModel::Llama70b, "p").await.unwrap_err();
    assert!(matches!(err, ExplainError::Network(_)), "got {err:?}");
    assert!(!err.is_credential());
}

#[tokio::test]
async fn missing_key_never_calls_the_api() {
    if std::env::var(API_KEY_ENV).is_ok() {
        // A key in the environment would be picked up.
        return;
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let storage = AuthStorage::open(dir.path().join("glance.db").to_str().unwrap()).unwrap();
    let explainer = GroqExplainer::new(Some(server.uri()), storage);
    let err = explainer.explain(TextModel::Llama70b, "p").await.unwrap_err();
    assert!(matches!(err, ExplainError::MissingCredential));
}
