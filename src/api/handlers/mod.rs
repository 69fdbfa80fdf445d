use std::sync::MutexGuard;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SharedTimeline;
use crate::db::Database;
use crate::durations::Durations;
use crate::error::TimelineError;
use crate::models::*;
use crate::summary::{DaySummary, HistoryGroup};
use crate::timeline::Timeline;

// ============================================================
// Error Handling
// ============================================================

/// Map a timeline error to a response. Store failures are logged in full
/// and reported to the client as a generic message.
fn timeline_error(e: TimelineError) -> (StatusCode, String) {
    if e.is_not_found() {
        return (StatusCode::NOT_FOUND, e.to_string());
    }
    if e.is_validation() {
        tracing::warn!("Validation error: {}", e);
        return (StatusCode::BAD_REQUEST, e.to_string());
    }

    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn lock(state: &SharedTimeline) -> MutexGuard<'_, Timeline<Database>> {
    state.lock().expect("timeline lock poisoned")
}

// ============================================================
// Request / Response Types
// ============================================================

/// Body for start/stop. Without `at` the current time is used.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AtInput {
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
}

/// Range for listing windows. Defaults to the current local day.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WindowRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeadTimeInput {
    pub minutes: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub now: DateTime<Utc>,
    pub is_fasting: bool,
    pub active_window: Option<Window>,
    pub durations: Durations,
    pub lead_time_minutes: i64,
    pub today: Vec<Window>,
    pub last_error: Option<String>,
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Fasting
// ============================================================

pub async fn status(
    State(state): State<SharedTimeline>,
) -> Result<Json<StatusResponse>, (StatusCode, String)> {
    let mut timeline = lock(&state);
    timeline.refresh().map_err(timeline_error)?;

    Ok(Json(StatusResponse {
        now: timeline.now(),
        is_fasting: timeline.is_fasting(),
        active_window: timeline.active_window().cloned(),
        durations: timeline.configured_durations(),
        lead_time_minutes: timeline.lead_time().num_minutes(),
        today: timeline.today_windows().to_vec(),
        last_error: timeline.last_error().map(str::to_string),
    }))
}

pub async fn start_fast(
    State(state): State<SharedTimeline>,
    Json(input): Json<AtInput>,
) -> Result<Json<Window>, (StatusCode, String)> {
    let mut timeline = lock(&state);
    let at = input.at.unwrap_or_else(|| timeline.now());
    timeline.start_fast(at).map(Json).map_err(timeline_error)
}

pub async fn stop_fast(
    State(state): State<SharedTimeline>,
    Json(input): Json<AtInput>,
) -> Result<Json<Window>, (StatusCode, String)> {
    let mut timeline = lock(&state);
    let at = input.at.unwrap_or_else(|| timeline.now());
    timeline.stop_fast(at).map(Json).map_err(timeline_error)
}

// ============================================================
// Windows
// ============================================================

pub async fn list_windows(
    State(state): State<SharedTimeline>,
    Query(range): Query<WindowRange>,
) -> Result<Json<Vec<Window>>, (StatusCode, String)> {
    let timeline = lock(&state);
    let (day_start, day_end) = timeline.today_bounds();
    let from = range.from.unwrap_or(day_start);
    let to = range.to.unwrap_or(day_end);
    timeline
        .list_windows(from, to)
        .map(Json)
        .map_err(timeline_error)
}

pub async fn create_window(
    State(state): State<SharedTimeline>,
    Json(input): Json<CreateWindowInput>,
) -> Result<(StatusCode, Json<Window>), (StatusCode, String)> {
    lock(&state)
        .create_window(input)
        .map(|w| (StatusCode::CREATED, Json(w)))
        .map_err(timeline_error)
}

pub async fn update_window(
    State(state): State<SharedTimeline>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateWindowInput>,
) -> Result<Json<Window>, (StatusCode, String)> {
    lock(&state)
        .update_window(id, input)
        .map(Json)
        .map_err(timeline_error)
}

pub async fn delete_window(
    State(state): State<SharedTimeline>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if lock(&state).delete_window(id).map_err(timeline_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Window not found".to_string()))
    }
}

// ============================================================
// Regimens
// ============================================================

pub async fn list_regimens(
    State(state): State<SharedTimeline>,
) -> Result<Json<Vec<Regimen>>, (StatusCode, String)> {
    lock(&state).regimens().map(Json).map_err(timeline_error)
}

pub async fn create_regimen(
    State(state): State<SharedTimeline>,
    Json(mut input): Json<SaveRegimenInput>,
) -> Result<(StatusCode, Json<Regimen>), (StatusCode, String)> {
    input.id = None;
    lock(&state)
        .save_regimen(input)
        .map(|r| (StatusCode::CREATED, Json(r)))
        .map_err(timeline_error)
}

pub async fn update_regimen(
    State(state): State<SharedTimeline>,
    Path(id): Path<Uuid>,
    Json(mut input): Json<SaveRegimenInput>,
) -> Result<Json<Regimen>, (StatusCode, String)> {
    input.id = Some(id);
    lock(&state)
        .save_regimen(input)
        .map(Json)
        .map_err(timeline_error)
}

pub async fn activate_regimen(
    State(state): State<SharedTimeline>,
    Path(id): Path<Uuid>,
) -> Result<Json<Regimen>, (StatusCode, String)> {
    lock(&state)
        .activate_regimen(id)
        .map(Json)
        .map_err(timeline_error)
}

pub async fn delete_regimen(
    State(state): State<SharedTimeline>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if lock(&state).delete_regimen(id).map_err(timeline_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Regimen not found".to_string()))
    }
}

// ============================================================
// Projections
// ============================================================

pub async fn weekly_summary(
    State(state): State<SharedTimeline>,
) -> Result<Json<Vec<DaySummary>>, (StatusCode, String)> {
    let mut timeline = lock(&state);
    timeline.refresh().map_err(timeline_error)?;
    Ok(Json(timeline.weekly_summary().to_vec()))
}

pub async fn history(
    State(state): State<SharedTimeline>,
) -> Result<Json<Vec<HistoryGroup>>, (StatusCode, String)> {
    let mut timeline = lock(&state);
    timeline.refresh().map_err(timeline_error)?;
    Ok(Json(timeline.history().to_vec()))
}

pub async fn reminders(
    State(state): State<SharedTimeline>,
) -> Result<Json<Vec<ReminderEvent>>, (StatusCode, String)> {
    let mut timeline = lock(&state);
    timeline.refresh().map_err(timeline_error)?;
    Ok(Json(timeline.reminder_events().to_vec()))
}

pub async fn set_lead_time(
    State(state): State<SharedTimeline>,
    Json(input): Json<LeadTimeInput>,
) -> Result<Json<Vec<ReminderEvent>>, (StatusCode, String)> {
    if input.minutes < 0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "Lead time must not be negative".to_string(),
        ));
    }
    let mut timeline = lock(&state);
    timeline
        .set_lead_time(Duration::minutes(input.minutes))
        .map_err(timeline_error)?;
    Ok(Json(timeline.reminder_events().to_vec()))
}

// ============================================================
// Whole store
// ============================================================

pub async fn export(
    State(state): State<SharedTimeline>,
) -> Result<Json<Snapshot>, (StatusCode, String)> {
    lock(&state).snapshot().map(Json).map_err(timeline_error)
}

pub async fn reset(
    State(state): State<SharedTimeline>,
) -> Result<StatusCode, (StatusCode, String)> {
    lock(&state).reset().map_err(timeline_error)?;
    Ok(StatusCode::NO_CONTENT)
}
