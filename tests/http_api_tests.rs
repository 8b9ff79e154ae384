// Integration tests for the HTTP API
//
// The router is driven in-process with `tower::ServiceExt::oneshot`; the LLM
// and narration providers are stubbed with wiremock.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use guided_meditation::config::{LlmConfig, NarrationConfig, TimingConfig};
use guided_meditation::narration::PREVIEW_TEXT;
use guided_meditation::script::{LlmScriptGenerator, PromptTemplate};
use guided_meditation::{create_router, AppState, LlmClient, ProviderSynthesizer, StateStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header as header_matcher, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

struct TestApp {
    router: Router,
    _data: TempDir,
}

async fn store() -> (Arc<StateStore>, TempDir) {
    let data = tempfile::tempdir().unwrap();
    let store = StateStore::open(data.path()).await.unwrap();
    (Arc::new(store), data)
}

async fn app_with(llm: Option<&MockServer>, tts: Option<&MockServer>) -> TestApp {
    let (store, data) = store().await;
    let mut state = AppState::new(store).with_api_tokens(vec![TOKEN.to_string()]);

    if let Some(server) = llm {
        let client = LlmClient::new(&LlmConfig {
            base_url: server.uri(),
            api_key: Some("sk-test".to_string()),
            ..LlmConfig::default()
        })
        .unwrap();
        state = state.with_generator(Arc::new(LlmScriptGenerator::new(
            client,
            PromptTemplate::built_in(),
            TimingConfig::default(),
        )));
    }

    if let Some(server) = tts {
        let provider = ProviderSynthesizer::new(&NarrationConfig {
            base_url: server.uri(),
            api_key: Some("xi-test".to_string()),
            ..NarrationConfig::default()
        })
        .unwrap();
        state = state.with_narration(Arc::new(provider));
    }

    TestApp {
        router: create_router(state),
        _data: data,
    }
}

fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn assessment() -> Value {
    json!({
        "goal": "stress-relief",
        "currentState": "tense after work",
        "durationMinutes": 5,
        "experience": "beginner",
        "environment": "living room",
        "wisdomSource": "stoic",
        "selectedFeelings": ["anxious"],
        "primer": "let the day go"
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = app_with(None, None).await;

    let response = app.router.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["narration"], "local");
}

#[tokio::test]
async fn test_generate_requires_token() {
    let llm = MockServer::start().await;
    let app = app_with(Some(&llm), None).await;

    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/meditations/generate", assessment(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(json_body(response).await["error"].is_string());

    let response = app
        .router
        .oneshot(post_json(
            "/api/meditations/generate",
            assessment(),
            Some("wrong"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_generate_validates_assessment() {
    let llm = MockServer::start().await;
    let app = app_with(Some(&llm), None).await;

    let mut empty_goal = assessment();
    empty_goal["goal"] = json!("  ");
    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/meditations/generate", empty_goal, Some(TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut too_long = assessment();
    too_long["durationMinutes"] = json!(121);
    let response = app
        .router
        .oneshot(post_json("/api/meditations/generate", too_long, Some(TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_returns_script() {
    let llm = MockServer::start().await;
    let reply = json!({
        "title": "Letting Go",
        "introText": "Welcome.",
        "mainContent": "Breathe in slowly.",
        "closingText": "Return gently."
    })
    .to_string();

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header_matcher("authorization", "Bearer sk-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": reply}}]
        })))
        .expect(1)
        .mount(&llm)
        .await;

    let app = app_with(Some(&llm), None).await;
    let response = app
        .router
        .oneshot(post_json("/api/meditations/generate", assessment(), Some(TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["title"], "Letting Go");
    assert_eq!(body["introText"], "Welcome.");
    assert_eq!(body["mainContent"], "Breathe in slowly.");
    assert_eq!(body["closingText"], "Return gently.");
}

#[tokio::test]
async fn test_generate_maps_llm_failure_to_bad_gateway() {
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"message": "upstream exploded"}
        })))
        .mount(&llm)
        .await;

    let app = app_with(Some(&llm), None).await;
    let response = app
        .router
        .oneshot(post_json("/api/meditations/generate", assessment(), Some(TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("upstream exploded"));
}

#[tokio::test]
async fn test_narration_without_provider_points_to_local() {
    let app = app_with(None, None).await;

    let response = app
        .router
        .oneshot(post_json(
            "/api/narration",
            json!({"text": "Breathe in.", "voiceId": "voice-1"}),
            Some(TOKEN),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["fallback"], "local");
}

#[tokio::test]
async fn test_narration_returns_audio() {
    let tts = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/text-to-speech/voice-1"))
        .and(header_matcher("xi-api-key", "xi-test"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mpeg")
                .set_body_bytes(vec![7u8, 7, 7]),
        )
        .expect(1)
        .mount(&tts)
        .await;

    let app = app_with(None, Some(&tts)).await;
    let response = app
        .router
        .oneshot(post_json(
            "/api/narration",
            json!({"text": "Breathe in.", "voiceId": "voice-1"}),
            Some(TOKEN),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.as_ref(), &[7u8, 7, 7]);
}

#[tokio::test]
async fn test_narration_rejects_empty_text() {
    let tts = MockServer::start().await;
    let app = app_with(None, Some(&tts)).await;

    let response = app
        .router
        .oneshot(post_json(
            "/api/narration",
            json!({"text": "   ", "voiceId": "voice-1"}),
            Some(TOKEN),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_voice_preview_speaks_sample_text() {
    let tts = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/text-to-speech/voice-2"))
        .and(body_partial_json(json!({"text": PREVIEW_TEXT})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mpeg")
                .set_body_bytes(vec![1u8, 2, 3, 4]),
        )
        .expect(1)
        .mount(&tts)
        .await;

    let app = app_with(None, Some(&tts)).await;
    let response = app
        .router
        .oneshot(post_json(
            "/api/narration/preview",
            json!({"voiceId": "voice-2"}),
            Some(TOKEN),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.as_ref(), &[1u8, 2, 3, 4]);
}

#[tokio::test]
async fn test_narration_provider_failure_is_bad_gateway() {
    let tts = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "detail": {"status": "too_many_requests", "message": "Slow down"}
        })))
        .mount(&tts)
        .await;

    let app = app_with(None, Some(&tts)).await;
    let response = app
        .router
        .oneshot(post_json(
            "/api/narration/preview",
            json!({"voiceId": "voice-1"}),
            Some(TOKEN),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_saved_session_lifecycle() {
    let app = app_with(None, None).await;
    let config = json!({
        "config": {
            "name": "Evening wind-down",
            "requestedDurationMinutes": 5,
            "voiceId": "voice-1",
            "layers": {"musicVolume": 1.5, "voiceVolume": 0.8, "musicType": "rain"},
            "assessmentData": assessment()
        }
    });

    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/sessions", config, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let saved = json_body(response).await;
    let id = saved["id"].as_str().unwrap().to_string();
    assert_eq!(saved["config"]["layers"]["musicVolume"], 1.0);

    let response = app.router.clone().oneshot(get("/api/sessions")).await.unwrap();
    let list = json_body(response).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["config"]["name"], "Evening wind-down");

    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/api/sessions/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/api/sessions/{}", id))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(delete).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .router
        .oneshot(get(&format!("/api/sessions/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stats_accumulate_whole_minutes() {
    let app = app_with(None, None).await;

    for elapsed in [130, 59] {
        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/api/stats/sessions",
                json!({"elapsedSecs": elapsed}),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.router.oneshot(get("/api/stats")).await.unwrap();
    let stats = json_body(response).await;
    assert_eq!(stats["totalMinutes"], 2);
    assert_eq!(stats["sessionsCompleted"], 2);
    assert!(stats["lastSessionAt"].is_string());
}
