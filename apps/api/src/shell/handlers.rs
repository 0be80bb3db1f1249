use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::sequencing::{ask_question, process_files};
use super::session::{ProcessOutcome, Selection, SessionSnapshot, View};
use crate::detail::download::{download, Download};
use crate::detail::linkedin_url;
use crate::errors::AppError;
use crate::intake::multipart::read_files;
use crate::models::notification::Notification;
use crate::models::resume::ResumeRecord;
use crate::models::upload::UploadItem;
use crate::results::{badge_tone, band_counts, filter, BadgeTone, BandCounts, ScoreBand};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionResponse {
    pub selection: Selection,
    pub files: Vec<UploadItem>,
    pub accepted: usize,
    pub rejected: usize,
    pub notification: Option<Notification>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    #[serde(flatten)]
    pub outcome: ProcessOutcome,
    pub view: View,
    pub record_count: usize,
    pub notification: Option<Notification>,
}

#[derive(Deserialize)]
pub struct ViewRequest {
    pub view: View,
}

#[derive(Deserialize, Default)]
pub struct RecordsQuery {
    #[serde(default)]
    pub band: ScoreBand,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRow {
    #[serde(flatten)]
    pub record: ResumeRecord,
    pub badge: BadgeTone,
}

impl From<&ResumeRecord> for RecordRow {
    fn from(record: &ResumeRecord) -> Self {
        Self {
            badge: badge_tone(record.fitment_score),
            record: record.clone(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordsResponse {
    pub band: ScoreBand,
    pub counts: BandCounts,
    pub records: Vec<RecordRow>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailResponse {
    #[serde(flatten)]
    pub row: RecordRow,
    pub linkedin_url: Option<String>,
}

#[derive(Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Serialize)]
pub struct AskResponse {
    pub answer: String,
}

#[derive(Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
}

// ── sessions ────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionSnapshot>) {
    let (_, handle) = state.sessions.create();
    let snapshot = handle.lock().snapshot();
    (StatusCode::CREATED, Json(snapshot))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let snapshot = state.sessions.get(id)?.lock().snapshot();
    Ok(Json(snapshot))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ── intake ──────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/resumes
pub async fn handle_select_resumes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<SelectionResponse>, AppError> {
    select(&state, id, Selection::Resumes, multipart).await
}

/// POST /api/v1/sessions/:id/job-description
pub async fn handle_select_job_description(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<SelectionResponse>, AppError> {
    select(&state, id, Selection::JobDescription, multipart).await
}

async fn select(
    state: &AppState,
    id: Uuid,
    selection: Selection,
    multipart: Multipart,
) -> Result<Json<SelectionResponse>, AppError> {
    let handle = state.sessions.get(id)?;
    let files = read_files(multipart).await?;

    let mut session = handle.lock();
    let report = session.select_files(selection, files)?;
    info!(
        session = %id,
        ?selection,
        accepted = report.accepted,
        rejected = report.rejected,
        selected = session.intake(selection).len(),
        "files selected"
    );
    Ok(Json(SelectionResponse {
        selection,
        files: session.intake(selection).items().to_vec(),
        accepted: report.accepted,
        rejected: report.rejected,
        notification: report.warning,
    }))
}

/// DELETE /api/v1/sessions/:id/resumes/:index
pub async fn handle_remove_resume(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<SelectionResponse>, AppError> {
    remove(&state, id, Selection::Resumes, index)
}

/// DELETE /api/v1/sessions/:id/job-description/:index
pub async fn handle_remove_job_description(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<SelectionResponse>, AppError> {
    remove(&state, id, Selection::JobDescription, index)
}

fn remove(
    state: &AppState,
    id: Uuid,
    selection: Selection,
    index: usize,
) -> Result<Json<SelectionResponse>, AppError> {
    let handle = state.sessions.get(id)?;
    let mut session = handle.lock();
    let removed = session.remove_file(selection, index)?;
    info!(session = %id, ?selection, file = %removed.file.name, "file removed");
    Ok(Json(SelectionResponse {
        selection,
        files: session.intake(selection).items().to_vec(),
        accepted: 0,
        rejected: 0,
        notification: None,
    }))
}

// ── processing and navigation ───────────────────────────────────────────────

/// POST /api/v1/sessions/:id/process
pub async fn handle_process(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProcessResponse>, AppError> {
    let handle = state.sessions.get(id)?;
    let outcome = process_files(&handle, state.processor.as_ref()).await?;

    let session = handle.lock();
    Ok(Json(ProcessResponse {
        outcome,
        view: session.view(),
        record_count: session.records().len(),
        notification: session.latest_notification().cloned(),
    }))
}

/// POST /api/v1/sessions/:id/clear
pub async fn handle_clear(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let handle = state.sessions.get(id)?;
    let mut session = handle.lock();
    session.clear_all()?;
    Ok(Json(session.snapshot()))
}

/// PUT /api/v1/sessions/:id/view
pub async fn handle_set_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ViewRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let handle = state.sessions.get(id)?;
    let mut session = handle.lock();
    session.set_view(req.view)?;
    Ok(Json(session.snapshot()))
}

// ── results and detail ──────────────────────────────────────────────────────

/// GET /api/v1/sessions/:id/records?band=
pub async fn handle_list_records(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<RecordsQuery>,
) -> Result<Json<RecordsResponse>, AppError> {
    let records = state.sessions.get(id)?.lock().records().clone();
    Ok(Json(RecordsResponse {
        band: query.band,
        counts: band_counts(&records),
        records: filter(&records, query.band).into_iter().map(RecordRow::from).collect(),
    }))
}

/// GET /api/v1/sessions/:id/records/:record_id
/// Opens the detail viewer on the record.
pub async fn handle_open_detail(
    State(state): State<AppState>,
    Path((id, record_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<DetailResponse>, AppError> {
    let handle = state.sessions.get(id)?;
    let mut session = handle.lock();
    let record = session
        .open_detail(Some(record_id))?
        .ok_or_else(|| AppError::NotFound(format!("Record {record_id} not found")))?;
    Ok(Json(DetailResponse {
        linkedin_url: record.linkedin.as_deref().map(linkedin_url),
        row: RecordRow::from(record),
    }))
}

/// DELETE /api/v1/sessions/:id/detail
pub async fn handle_close_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.get(id)?.lock().close_detail();
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/sessions/:id/records/:record_id/download
pub async fn handle_download(
    State(state): State<AppState>,
    Path((id, record_id)): Path<(Uuid, Uuid)>,
) -> Result<Download, AppError> {
    let record = state.sessions.get(id)?.lock().record(record_id)?.clone();
    let file = download(&state.downloads, &record)?;
    info!(session = %id, %record_id, file = %file.file_name, "download served");
    Ok(file)
}

// ── questions and notifications ─────────────────────────────────────────────

/// POST /api/v1/sessions/:id/questions
pub async fn handle_ask(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let handle = state.sessions.get(id)?;
    let answer = ask_question(&handle, state.answerer.as_ref(), &req.question).await?;
    Ok(Json(AskResponse { answer }))
}

/// GET /api/v1/sessions/:id/notifications
/// Drains the session's pending notifications, oldest first.
pub async fn handle_notifications(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NotificationsResponse>, AppError> {
    let notifications = state.sessions.get(id)?.lock().drain_notifications();
    Ok(Json(NotificationsResponse { notifications }))
}
