//! Gemini client against a mocked generateContent endpoint.

use commudic::analysis::{AnalysisError, Analyzer, GeminiClient};
use commudic::config::GeminiConfig;
use commudic::types::{AnalysisInput, FileAttachment};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn client(base_url: &str) -> GeminiClient {
    GeminiClient::new(&GeminiConfig {
        api_key: Some("test-key".to_string()),
        base_url: base_url.to_string(),
        model: "gemini-2.5-flash".to_string(),
        timeout_seconds: Some(10),
    })
    .expect("Failed to create client")
}

fn result_json() -> Value {
    json!({
        "catchphrase": "静かな情熱で道を拓く探究者",
        "summary": "粘り強く仮説を検証するタイプです。",
        "scores": {
            "sociability": 3,
            "logic": 4.6,
            "curiosity": 9,
            "cooperation": 3,
            "action": 4
        },
        "businessAptitude": {
            "workStyle": "仮説検証型",
            "strengths": ["問題分解"],
            "suitableRoles": ["リサーチャー"]
        },
        "personCommunity": {
            "socialStyle": "少人数で深く",
            "values": ["誠実さ"],
            "interactionTips": "結論から伝える",
            "optimalPlace": "裁量のあるチーム"
        },
        "type": "Creative Analyst"
    })
}

fn envelope(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] }
        }]
    })
}

fn input() -> AnalysisInput {
    AnalysisInput {
        text: Some("X".to_string()),
        url: None,
        files: vec![FileAttachment {
            base64: "JVBERi0=".to_string(),
            mime_type: "application/pdf".to_string(),
            file_name: "cv.pdf".to_string(),
        }],
    }
}

#[tokio::test]
async fn test_successful_analysis_is_parsed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(&result_json().to_string())),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = client(&mock_server.uri()).analyze(&input()).await.unwrap();

    assert_eq!(result.catchphrase, "静かな情熱で道を拓く探究者");
    assert_eq!(result.result_type, "Creative Analyst");
    // fractional scores round, out of range scores clamp
    assert_eq!(result.scores.logic, 5);
    assert_eq!(result.scores.curiosity, 5);
    assert_eq!(result.business_aptitude.suitable_roles, vec!["リサーチャー"]);
}

#[tokio::test]
async fn test_request_carries_file_parts_then_prompt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(&result_json().to_string())),
        )
        .mount(&mock_server)
        .await;

    client(&mock_server.uri()).analyze(&input()).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();

    let parts = body["contents"][0]["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0]["inlineData"]["mimeType"], "application/pdf");
    assert_eq!(parts[0]["inlineData"]["data"], "JVBERi0=");
    let prompt = parts[1]["text"].as_str().unwrap();
    assert!(prompt.contains("[Text]:\nX"));

    let config = &body["generationConfig"];
    assert_eq!(config["responseMimeType"], "application/json");
    assert_eq!(
        config["responseSchema"]["required"].as_array().unwrap().len(),
        6
    );
    assert!(body["systemInstruction"]["parts"][0]["text"].is_string());
}

#[tokio::test]
async fn test_api_errors_keep_status() {
    for status in [400u16, 401, 429, 500] {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": { "code": status, "message": "denied", "status": "FAILED" }
            })))
            .mount(&mock_server)
            .await;

        let err = client(&mock_server.uri())
            .analyze(&input())
            .await
            .unwrap_err();
        match err {
            AnalysisError::Api {
                status: got,
                message,
            } => {
                assert_eq!(got, status);
                assert_eq!(message, "denied");
            }
            other => panic!("expected api error, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_empty_candidates_fail_to_parse() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server.uri())
        .analyze(&input())
        .await
        .unwrap_err();
    assert!(matches!(err, AnalysisError::Parse(_)));
}

#[tokio::test]
async fn test_missing_api_key_never_calls_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = GeminiClient::new(&GeminiConfig {
        api_key: None,
        base_url: mock_server.uri(),
        model: "gemini-2.5-flash".to_string(),
        timeout_seconds: None,
    })
    .unwrap();

    let err = client.analyze(&input()).await.unwrap_err();
    assert!(matches!(err, AnalysisError::MissingApiKey));
    assert_eq!(err.status(), Some(401));
}
