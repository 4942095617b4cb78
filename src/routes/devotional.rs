use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::extractors::{JsonBody, UserId};
use crate::progression::service::DevotionalStatus;
use crate::response::{created, ok, AppError};
use crate::routes::rotation::LocaleQuery;
use crate::state::AppState;
use crate::validation::normalize_locale;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_status))
        .route("/open", post(open_day))
        .route("/complete", post(complete_day))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EntryView {
    day: u32,
    id: String,
    locale: String,
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusView {
    started_at: chrono::DateTime<chrono::Utc>,
    unlocked: u32,
    series_length: u32,
    next_unlock_at: Option<chrono::DateTime<chrono::Utc>>,
    is_complete: bool,
    position: u32,
    completed_days: Vec<u32>,
    entry: EntryView,
}

impl StatusView {
    fn new(status: DevotionalStatus<'_>, locale: &str) -> Self {
        let entry = status.entry;
        Self {
            started_at: status.window.started_at,
            unlocked: status.window.unlocked,
            series_length: status.window.series_length,
            next_unlock_at: status.window.next_unlock_at,
            is_complete: status.window.is_complete(),
            position: status.position,
            completed_days: status.completed_days,
            entry: EntryView {
                day: entry.day,
                id: entry.id.clone(),
                locale: locale.to_string(),
                title: entry.title_for(locale).to_string(),
                body: entry.body_for(locale).to_string(),
            },
        }
    }
}

async fn get_status(
    user: UserId,
    State(state): State<AppState>,
    Query(query): Query<LocaleQuery>,
) -> Result<impl IntoResponse, AppError> {
    let locale = normalize_locale(query.locale.as_deref());
    let status = state
        .progression()
        .devotional_status(user.as_str(), chrono::Utc::now())?;
    Ok(ok(StatusView::new(status, &locale)))
}

#[derive(Debug, Deserialize)]
struct DayRequest {
    day: u32,
}

async fn open_day(
    user: UserId,
    State(state): State<AppState>,
    Query(query): Query<LocaleQuery>,
    JsonBody(req): JsonBody<DayRequest>,
) -> Result<impl IntoResponse, AppError> {
    let locale = normalize_locale(query.locale.as_deref());
    let status =
        state
            .progression()
            .open_devotional_day(user.as_str(), req.day, chrono::Utc::now())?;
    Ok(ok(StatusView::new(status, &locale)))
}

async fn complete_day(
    user: UserId,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<DayRequest>,
) -> Result<impl IntoResponse, AppError> {
    let record =
        state
            .progression()
            .complete_devotional_day(user.as_str(), req.day, chrono::Utc::now())?;
    Ok(created(record))
}
