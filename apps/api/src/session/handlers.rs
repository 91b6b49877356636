//! Axum route handlers for the Session API.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::analysis::tone::Tone;
use crate::errors::AppError;
use crate::llm_client::ApiKey;
use crate::session::orchestrator::{self, AnalysisInput, UploadedFile};
use crate::session::view::{AnalysisView, SessionSnapshot};
use crate::session::{Notice, SessionPhase};
use crate::state::AppState;

pub const COVER_LETTER_FILE_NAME: &str = "cover_letter.txt";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub phase: SessionPhase,
}

/// `tone` arrives as free text so an unknown value is reported in the usual error
/// envelope. Absent means the default tone.
#[derive(Debug, Deserialize)]
pub struct CoverLetterRequest {
    #[serde(default)]
    pub tone: Option<String>,
}

impl CoverLetterRequest {
    pub fn tone(&self) -> Result<Tone, AppError> {
        match self.tone.as_deref() {
            Some(raw) => Ok(raw.parse::<Tone>()?),
            None => Ok(Tone::default()),
        }
    }
}

/// An analyze error together with the notices the run recorded before it stopped,
/// so the raw model output behind a failed stage still reaches the user.
#[derive(Debug)]
pub struct AnalysisFailure {
    error: AppError,
    notices: Vec<Notice>,
}

impl From<AppError> for AnalysisFailure {
    fn from(error: AppError) -> Self {
        Self {
            error,
            notices: Vec::new(),
        }
    }
}

impl IntoResponse for AnalysisFailure {
    fn into_response(self) -> Response {
        let (status, code, message) = self.error.response_parts();
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "notices": self.notices
            }
        }));

        (status, body).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct CoverLetterResponse {
    pub tone: Tone,
    pub cover_letter: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/tones
///
/// The tone picker options, default first.
pub async fn handle_list_tones() -> Json<[Tone; 3]> {
    Json(Tone::ALL)
}

/// POST /api/v1/sessions
///
/// Opens a session bound to the caller's API key. Nothing else is usable until this succeeds.
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), AppError> {
    let credential = ApiKey::new(request.api_key).ok_or_else(|| {
        AppError::Validation("Please enter your OpenAI API key to continue.".to_string())
    })?;

    let session_id = state.sessions.create(credential).await;

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id,
            phase: SessionPhase::Idle,
        }),
    ))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = state.sessions.get(id).await?;
    let session = session.lock().await;
    Ok(Json(SessionSnapshot::from(&*session)))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Session {id} not found")))
    }
}

/// POST /api/v1/sessions/:id/analyze
///
/// Multipart form: `job_description` (text) and `resume` (PDF or DOCX file).
/// Runs the full pipeline and returns the dashboard view. On failure the error body
/// also carries the run's notices.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<AnalysisView>, AnalysisFailure> {
    let session = state.sessions.get(id).await?;
    let input = read_analysis_form(multipart).await?;

    let mut session = session.lock().await;
    match orchestrator::run_analysis(&mut session, state.llm.as_ref(), input).await {
        Ok(view) => Ok(Json(view)),
        // Rejected before the run started: the held notices belong to an earlier run.
        Err(AppError::MissingInput) => Err(AppError::MissingInput.into()),
        Err(error) => Err(AnalysisFailure {
            error,
            notices: session.notices.clone(),
        }),
    }
}

/// POST /api/v1/sessions/:id/cover-letter
///
/// Generates (or regenerates) a cover letter from the profiles of the last analysis.
pub async fn handle_generate_cover_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CoverLetterRequest>,
) -> Result<Json<CoverLetterResponse>, AppError> {
    let tone = request.tone()?;
    let session = state.sessions.get(id).await?;

    let mut session = session.lock().await;
    let letter =
        orchestrator::generate_cover_letter(&mut session, state.llm.as_ref(), tone).await?;

    Ok(Json(CoverLetterResponse {
        tone: letter.tone,
        cover_letter: letter.text,
    }))
}

/// GET /api/v1/sessions/:id/cover-letter
///
/// Downloads the latest cover letter as a plain-text attachment.
pub async fn handle_download_cover_letter(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.sessions.get(id).await?;
    let session = session.lock().await;
    let letter = session
        .cover_letter
        .as_ref()
        .ok_or_else(|| AppError::NotFound("No cover letter has been generated yet".to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{COVER_LETTER_FILE_NAME}\""),
            ),
        ],
        letter.text.clone(),
    ))
}

/// Collects the analyze form. Unknown fields are ignored; a file input left empty
/// by the browser counts as no upload.
async fn read_analysis_form(mut multipart: Multipart) -> Result<AnalysisInput, AppError> {
    let mut input = AnalysisInput::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| form_error("Invalid form data", e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "job_description" => {
                input.job_description = field
                    .text()
                    .await
                    .map_err(|e| form_error("Invalid job description", e))?;
            }
            "resume" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| form_error("Invalid resume upload", e))?;
                if !file_name.is_empty() && !bytes.is_empty() {
                    input.resume = Some(UploadedFile { file_name, bytes });
                }
            }
            _ => {}
        }
    }

    Ok(input)
}

/// Body-limit hits become 413; anything else is a malformed form.
fn form_error(context: &str, err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(
            "The upload exceeds the maximum allowed size. Please upload a smaller resume."
                .to_string(),
        )
    } else {
        AppError::Validation(format!("{context}: {}", err.body_text()))
    }
}
