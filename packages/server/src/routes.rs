//! HTTP API over the builder session and preview signal

use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, patch, post},
    Json, Router,
};
use futures::stream::Stream;
use homepage_builder::{
    Applied, BuilderError, BuilderSession, BuilderView, MutationError, PersistError, PreviewEvent,
    Section, SectionId, SectionPatch, DEFAULT_SECTION_KEY, DEFAULT_SECTION_TITLE,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;
use tower_http::cors::CorsLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/builder", get(get_state))
        .route("/api/builder/reload", post(reload_builder))
        .route("/api/sections", post(add_section))
        .route("/api/sections/reorder", post(reorder))
        .route("/api/sections/:id", patch(update_section).delete(delete_section))
        .route("/api/sections/:id/visibility", post(toggle_visibility))
        .route("/api/sections/:id/lock", post(toggle_lock))
        .route("/api/sections/:id/duplicate", post(duplicate_section))
        .route("/api/history/undo", post(undo))
        .route("/api/history/redo", post(redo))
        .route("/api/selection", post(select).delete(clear_selection))
        .route("/api/save", post(save))
        .route("/api/preview/reload", post(force_preview_reload))
        .route("/api/preview/events", get(preview_events))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Error body returned by every route
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// The builder failed to load; carries the load error
    Unavailable(String),
    Builder(BuilderError),
}

impl From<BuilderError> for ApiError {
    fn from(e: BuilderError) -> Self {
        ApiError::Builder(e)
    }
}

impl From<PersistError> for ApiError {
    fn from(e: PersistError) -> Self {
        ApiError::Builder(e.into())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Builder(e) => match e {
                BuilderError::Mutation(MutationError::InvalidLayout(_)) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                BuilderError::Mutation(MutationError::Locked(_) | MutationError::DuplicateId(_)) => {
                    StatusCode::CONFLICT
                }
                BuilderError::Mutation(_) => StatusCode::BAD_REQUEST,
                BuilderError::Persist(PersistError::Store(_)) | BuilderError::Load(_) => {
                    StatusCode::BAD_GATEWAY
                }
                BuilderError::Persist(_) | BuilderError::Inconsistent(_) => StatusCode::CONFLICT,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = match &self {
            ApiError::Unavailable(reason) => format!("Homepage builder unavailable: {}", reason),
            ApiError::Builder(e) => e.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), %error, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), %error, "Request rejected");
        }

        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// Everything the builder UI renders from
#[derive(Debug, Serialize)]
pub struct BuilderStateResponse {
    pub sections: Vec<Section>,
    pub selection: Vec<SectionId>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub has_unsaved_changes: bool,
    pub saving: bool,
    pub revision: u64,
}

impl BuilderStateResponse {
    fn new(session: &BuilderSession, saving: bool) -> Self {
        Self {
            sections: session.sections().to_vec(),
            selection: session.selection().ids().cloned().collect(),
            can_undo: session.can_undo(),
            can_redo: session.can_redo(),
            has_unsaved_changes: session.has_unsaved_changes(),
            saving,
            revision: session.revision(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MutationResponse {
    /// False when the request referenced something that no longer exists
    pub applied: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<SectionId>,

    pub state: BuilderStateResponse,
}

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub revision: u64,
    pub state: BuilderStateResponse,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddSectionRequest {
    pub section_key: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ReorderRequest {
    ByIndex { source_index: usize, dest_index: usize },
    ById { source_id: SectionId, dest_id: SectionId },
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub id: SectionId,
    #[serde(default)]
    pub multi_select: bool,
}

fn ready(view: &BuilderView) -> Result<&BuilderSession, ApiError> {
    match view {
        BuilderView::Ready(session) => Ok(session),
        BuilderView::Unavailable { reason } => Err(ApiError::Unavailable(reason.clone())),
    }
}

fn ready_mut(view: &mut BuilderView) -> Result<&mut BuilderSession, ApiError> {
    match view {
        BuilderView::Ready(session) => Ok(session),
        BuilderView::Unavailable { reason } => Err(ApiError::Unavailable(reason.clone())),
    }
}

/// Run one synchronous edit under the view lock
async fn mutate<F>(state: &AppState, edit: F) -> Result<Json<MutationResponse>, ApiError>
where
    F: FnOnce(&mut BuilderSession) -> Result<Applied, BuilderError>,
{
    let mut view = state.view.lock().await;
    let session = ready_mut(&mut view)?;
    let applied = edit(session)?;

    Ok(Json(MutationResponse {
        applied: applied.is_recorded(),
        created: applied.created().map(str::to_string),
        state: BuilderStateResponse::new(session, state.gate.is_saving()),
    }))
}

/// Undo/redo and selection changes never create sections
async fn navigate<F>(state: &AppState, step: F) -> Result<Json<MutationResponse>, ApiError>
where
    F: FnOnce(&mut BuilderSession) -> bool,
{
    let mut view = state.view.lock().await;
    let session = ready_mut(&mut view)?;
    let applied = step(session);

    Ok(Json(MutationResponse {
        applied,
        created: None,
        state: BuilderStateResponse::new(session, state.gate.is_saving()),
    }))
}

async fn get_state(State(state): State<AppState>) -> Result<Json<BuilderStateResponse>, ApiError> {
    let view = state.view.lock().await;
    let session = ready(&view)?;
    Ok(Json(BuilderStateResponse::new(session, state.gate.is_saving())))
}

/// Re-fetch from storage, discarding history and unsaved edits
async fn reload_builder(
    State(state): State<AppState>,
) -> Result<Json<BuilderStateResponse>, ApiError> {
    state.reload().await;
    get_state(State(state)).await
}

/// The body is optional; without one the section gets the default key and title
async fn add_section(
    State(state): State<AppState>,
    request: Option<Json<AddSectionRequest>>,
) -> Result<Json<MutationResponse>, ApiError> {
    let request = request.map(|Json(request)| request).unwrap_or_default();
    mutate(&state, |session| {
        session.add_section(
            request.section_key.unwrap_or_else(|| DEFAULT_SECTION_KEY.to_string()),
            request.title.unwrap_or_else(|| DEFAULT_SECTION_TITLE.to_string()),
        )
    })
    .await
}

async fn update_section(
    State(state): State<AppState>,
    Path(id): Path<SectionId>,
    Json(patch): Json<SectionPatch>,
) -> Result<Json<MutationResponse>, ApiError> {
    mutate(&state, |session| session.update_section(&id, patch)).await
}

async fn delete_section(
    State(state): State<AppState>,
    Path(id): Path<SectionId>,
) -> Result<Json<MutationResponse>, ApiError> {
    mutate(&state, |session| session.delete(&id)).await
}

async fn toggle_visibility(
    State(state): State<AppState>,
    Path(id): Path<SectionId>,
) -> Result<Json<MutationResponse>, ApiError> {
    mutate(&state, |session| session.toggle_visibility(&id)).await
}

async fn toggle_lock(
    State(state): State<AppState>,
    Path(id): Path<SectionId>,
) -> Result<Json<MutationResponse>, ApiError> {
    mutate(&state, |session| session.toggle_lock(&id)).await
}

async fn duplicate_section(
    State(state): State<AppState>,
    Path(id): Path<SectionId>,
) -> Result<Json<MutationResponse>, ApiError> {
    mutate(&state, |session| session.duplicate(&id)).await
}

async fn reorder(
    State(state): State<AppState>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    mutate(&state, |session| match request {
        ReorderRequest::ByIndex {
            source_index,
            dest_index,
        } => session.reorder(source_index, dest_index),
        ReorderRequest::ById { source_id, dest_id } => session.reorder_by_id(&source_id, &dest_id),
    })
    .await
}

async fn undo(State(state): State<AppState>) -> Result<Json<MutationResponse>, ApiError> {
    navigate(&state, BuilderSession::undo).await
}

async fn redo(State(state): State<AppState>) -> Result<Json<MutationResponse>, ApiError> {
    navigate(&state, BuilderSession::redo).await
}

async fn select(
    State(state): State<AppState>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    navigate(&state, |session| {
        session.select(&request.id, request.multi_select);
        session.selection().contains(&request.id)
    })
    .await
}

async fn clear_selection(State(state): State<AppState>) -> Result<Json<MutationResponse>, ApiError> {
    navigate(&state, |session| {
        let had_selection = !session.selection().is_empty();
        session.clear_selection();
        had_selection
    })
    .await
}

/// Explicit save. The view lock is released while the store is written so
/// edits keep working; they stay unsaved after this save completes.
async fn save(State(state): State<AppState>) -> Result<Json<SaveResponse>, ApiError> {
    let ticket = {
        let view = state.view.lock().await;
        ready(&view)?.prepare_save()
    };

    let revision = state.gate.save(&ticket.snapshot).await?;

    let mut view = state.view.lock().await;
    let session = ready_mut(&mut view)?;
    session.complete_save(&ticket);

    Ok(Json(SaveResponse {
        revision,
        state: BuilderStateResponse::new(session, state.gate.is_saving()),
    }))
}

async fn force_preview_reload(State(state): State<AppState>) -> Json<PreviewEvent> {
    state.gate.preview().force_reload();
    Json(state.gate.preview().latest())
}

/// Server-sent reload notifications for the live preview frame.
///
/// The latest event is sent on connect; intermediate events may be skipped
/// when a subscriber falls behind, which is fine for "reload now" signals.
async fn preview_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let events = WatchStream::new(state.gate.preview().subscribe())
        .map(|event| Event::default().event("reload").json_data(event));

    Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
