//! Speech API endpoints: transcription, intent deduction, and synthesis
//!
//! Error policy per endpoint: transcription and synthesis fail hard with a
//! server error carrying the upstream message; intent deduction always
//! answers 200 with three options, substituting the fixed fallback when the
//! AI backend is degraded.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::intent::IntentOptions;

/// Declared mime type assumed for browser recordings when the upload
/// carries none
const DEFAULT_AUDIO_MIME: &str = "audio/webm;codecs=opus";

/// Build speech router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/transcribe", post(transcribe))
        .route("/deduce-intent", post(deduce_intent))
        .route("/speak", post(speak))
        .with_state(state)
}

/// Transcription response
#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub text: String,
}

/// Transcribe an uploaded audio file to text
///
/// Accepts a multipart form with a `file` field holding the recording
async fn transcribe(
    State(state): State<Arc<ApiState>>,
    mut multipart: Multipart,
) -> Result<Json<TranscribeResponse>, SpeechError> {
    let mut upload: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| SpeechError::InvalidUpload(e.to_string()))?
    {
        if field.name() == Some("file") {
            let mime = field
                .content_type()
                .unwrap_or(DEFAULT_AUDIO_MIME)
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| SpeechError::InvalidUpload(e.to_string()))?;
            upload = Some((bytes.to_vec(), mime));
            break;
        }
    }

    let (audio, mime) = upload.ok_or(SpeechError::BadRequest("Missing file field"))?;

    if audio.is_empty() {
        return Err(SpeechError::BadRequest("Empty audio data"));
    }

    let text = state
        .transcriber
        .transcribe(&audio, &mime)
        .await
        .map_err(|e| SpeechError::TranscriptionFailed(e.to_string()))?;

    Ok(Json(TranscribeResponse { text }))
}

/// Intent deduction request
#[derive(Debug, Deserialize)]
pub struct DeduceIntentRequest {
    pub text: String,
}

/// Deduce complete candidate sentences for a fragment
///
/// Always 200 with an `options` list; upstream failure yields the fixed
/// fallback options rather than an error.
async fn deduce_intent(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<DeduceIntentRequest>,
) -> Json<IntentOptions> {
    let facts = state.context_repo.all().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "context read failed, proceeding without facts");
        Vec::new()
    });

    Json(state.intent.deduce_or_fallback(&request.text, &facts).await)
}

/// Synthesis request
#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    pub text: String,
    #[serde(default)]
    pub voice_id: Option<String>,
}

/// Synthesis response
#[derive(Debug, Serialize)]
pub struct SpeakResponse {
    pub audio_base64: String,
}

/// Synthesize a chosen sentence to speech
async fn speak(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SpeakRequest>,
) -> Result<Json<SpeakResponse>, SpeechError> {
    if request.text.is_empty() {
        return Err(SpeechError::BadRequest("Empty text"));
    }

    let audio = state
        .synthesizer
        .synthesize(&request.text, request.voice_id.as_deref())
        .await
        .map_err(|e| SpeechError::SynthesisFailed(e.to_string()))?;

    Ok(Json(SpeakResponse {
        audio_base64: BASE64.encode(audio),
    }))
}

/// Speech API errors
#[derive(Debug)]
pub enum SpeechError {
    BadRequest(&'static str),
    InvalidUpload(String),
    TranscriptionFailed(String),
    SynthesisFailed(String),
}

impl IntoResponse for SpeechError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.to_string()),
            Self::InvalidUpload(msg) => (StatusCode::BAD_REQUEST, "invalid_upload", msg),
            Self::TranscriptionFailed(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "transcription_failed", msg)
            }
            Self::SynthesisFailed(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "synthesis_failed", msg)
            }
        };

        (status, Json(ErrorResponse { error: ErrorBody { code, message } })).into_response()
    }
}
