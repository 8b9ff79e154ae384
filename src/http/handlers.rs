use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::assessment::AssessmentData;
use crate::llm::LlmError;
use crate::narration::{NarrationRequest, NarrationSynthesizer};
use crate::script::MeditationScript;
use crate::session::{SavedSession, SessionConfig, SessionSummary, UserStats};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub narration: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub voice_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSessionRequest {
    pub config: SessionConfig,
    #[serde(default)]
    pub script: Option<MeditationScript>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSessionRequest {
    pub elapsed_secs: u64,
    #[serde(default)]
    pub total_secs: Option<u64>,
}

// ============================================================================
// Helpers
// ============================================================================

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}

fn authorize(state: &AppState, headers: &HeaderMap) -> ApiResult<()> {
    if state.is_authorized(bearer_token(headers)) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

fn audio_response(mime: String, bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, mime)], bytes).into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        narration: if state.narration.is_some() {
            "provider"
        } else {
            "local"
        },
    })
}

/// POST /api/meditations/generate
/// Generate a script from assessment answers
pub async fn generate_meditation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(assessment): Json<AssessmentData>,
) -> ApiResult<Json<MeditationScript>> {
    authorize(&state, &headers)?;
    assessment.validate().map_err(ApiError::BadRequest)?;

    let generator = state
        .generator
        .as_ref()
        .ok_or(ApiError::Llm(LlmError::MissingApiKey))?;

    let script = generator.generate(&assessment).await?;
    Ok(Json(script))
}

/// POST /api/narration
/// Synthesize one piece of narration with the hosted provider
pub async fn synthesize_narration(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<NarrationRequest>,
) -> ApiResult<Response> {
    authorize(&state, &headers)?;

    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest("text must not be empty".to_string()));
    }
    let narration = state.narration.as_ref().ok_or(ApiError::NarrationUnavailable)?;

    let clip = narration.synthesize(&request).await?;
    Ok(audio_response(clip.mime, clip.bytes))
}

/// POST /api/narration/preview
/// Speak a fixed sample in the requested voice
pub async fn preview_voice(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PreviewRequest>,
) -> ApiResult<Response> {
    authorize(&state, &headers)?;

    if request.voice_id.trim().is_empty() {
        return Err(ApiError::BadRequest("voiceId must not be empty".to_string()));
    }
    let narration = state.narration.as_ref().ok_or(ApiError::NarrationUnavailable)?;

    let clip = narration.preview(&request.voice_id).await?;
    Ok(audio_response(clip.mime, clip.bytes))
}

/// GET /api/sessions
pub async fn list_sessions(State(state): State<AppState>) -> Json<Vec<SavedSession>> {
    Json(state.store.snapshot().await.saved_sessions)
}

/// POST /api/sessions
/// Save a named session configuration
pub async fn save_session(
    State(state): State<AppState>,
    Json(request): Json<SaveSessionRequest>,
) -> ApiResult<(StatusCode, Json<SavedSession>)> {
    if request.config.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }
    request
        .config
        .assessment_data
        .validate()
        .map_err(ApiError::BadRequest)?;

    let mut config = request.config;
    config.layers = config.layers.normalized();
    let session = SavedSession::new(config, request.script);

    info!("Saving session {} ({:?})", session.id, session.config.name);

    let saved = session.clone();
    state
        .store
        .update(move |s| s.with_saved_session(saved))
        .await?;

    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SavedSession>> {
    state
        .store
        .snapshot()
        .await
        .saved_session(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Session {}", id)))
}

/// DELETE /api/sessions/:id
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.store.snapshot().await.saved_session(id).is_none() {
        return Err(ApiError::NotFound(format!("Session {}", id)));
    }

    state.store.update(|s| s.without_saved_session(id)).await?;
    info!("Deleted session {}", id);

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/stats
pub async fn get_stats(State(state): State<AppState>) -> Json<UserStats> {
    Json(state.store.snapshot().await.stats)
}

/// POST /api/stats/sessions
/// Credit a finished session to the cumulative stats
pub async fn record_session(
    State(state): State<AppState>,
    Json(request): Json<RecordSessionRequest>,
) -> ApiResult<Json<UserStats>> {
    let summary = SessionSummary {
        elapsed_secs: request.elapsed_secs,
        total_secs: request.total_secs.unwrap_or(request.elapsed_secs),
    };

    let next = state
        .store
        .update(|s| s.with_completed_session(&summary, Utc::now()))
        .await?;

    info!(
        "Recorded {} min session, {} min total",
        summary.minutes(),
        next.stats.total_minutes
    );

    Ok(Json(next.stats))
}
