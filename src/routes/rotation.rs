//! 测验 + 每日轮换项目（爱之语、性格）的通用路由，按维度类型实例化。

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::catalog::ContentItem;
use crate::extractors::{JsonBody, UserId};
use crate::progression::service::RotationCategory;
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::validation::normalize_locale;

pub fn router<C: RotationCategory>() -> Router<AppState> {
    Router::new()
        .route("/quiz", post(submit_quiz::<C>))
        .route("/profile", get(get_profile::<C>))
        .route("/today", get(get_today::<C>))
        .route("/complete", post(complete::<C>))
}

#[derive(Debug, Deserialize)]
pub(crate) struct LocaleQuery {
    pub locale: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ItemView<C> {
    id: String,
    category: C,
    ordinal: u32,
    locale: String,
    text: String,
}

impl<C: Copy> ItemView<C> {
    pub(crate) fn new(item: &ContentItem<C>, locale: &str) -> Self {
        Self {
            id: item.id.clone(),
            category: item.category,
            ordinal: item.ordinal,
            locale: locale.to_string(),
            text: item.text_for(locale).to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct QuizRequest {
    answers: Vec<String>,
}

async fn submit_quiz<C: RotationCategory>(
    user: UserId,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<QuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let now = chrono::Utc::now();
    let record = state
        .progression()
        .submit_quiz::<C>(user.as_str(), &req.answers, now)?;
    Ok(created(record))
}

async fn get_profile<C: RotationCategory>(
    user: UserId,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let record = state
        .progression()
        .profile::<C>(user.as_str())?
        .ok_or_else(|| AppError::not_found("尚未完成测验"))?;
    Ok(ok(record))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TodayView<C> {
    program: &'static str,
    day: u64,
    category: C,
    fell_back: bool,
    completed: bool,
    profile_owner: Option<String>,
    item: ItemView<C>,
}

async fn get_today<C: RotationCategory>(
    user: UserId,
    State(state): State<AppState>,
    Query(query): Query<LocaleQuery>,
) -> Result<impl IntoResponse, AppError> {
    let locale = normalize_locale(query.locale.as_deref());
    let now = chrono::Utc::now();
    let today = state.progression().today_item::<C>(user.as_str(), now)?;

    Ok(ok(TodayView {
        program: C::PROGRAM.as_str(),
        day: today.day,
        category: today.selection.target,
        fell_back: today.selection.fell_back,
        completed: today.completed,
        profile_owner: today.profile_owner,
        item: ItemView::new(today.selection.item, &locale),
    }))
}

#[derive(Debug, Deserialize)]
struct CompleteRequest {
    day: u64,
}

async fn complete<C: RotationCategory>(
    user: UserId,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CompleteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let now = chrono::Utc::now();
    let done = state
        .progression()
        .complete_item::<C>(user.as_str(), req.day, now)?;

    Ok(ok(serde_json::json!({
        "completedDay": done.completed_day,
        "nextDay": done.next_day,
        "itemId": done.item_id,
    })))
}
