use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::extractors::{JsonBody, UserId};
use crate::progression::types::IntimacyBand;
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::validation::normalize_locale;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/questions", get(get_questions))
        .route("/advance", post(advance_level))
}

#[derive(Debug, Deserialize)]
struct QuestionsQuery {
    count: Option<usize>,
    locale: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuestionView {
    id: String,
    band: IntimacyBand,
    min_level: u32,
    max_level: u32,
    text: String,
}

async fn get_questions(
    user: UserId,
    State(state): State<AppState>,
    Query(query): Query<QuestionsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let locale = normalize_locale(query.locale.as_deref());
    let round = state
        .progression()
        .game_round(user.as_str(), query.count, chrono::Utc::now())?;

    let questions: Vec<QuestionView> = round
        .questions
        .iter()
        .map(|q| QuestionView {
            id: q.item.id.clone(),
            band: q.item.category,
            min_level: q.min_level,
            max_level: q.max_level,
            text: q.item.text_for(&locale).to_string(),
        })
        .collect();

    Ok(ok(serde_json::json!({
        "level": round.level,
        "band": round.band,
        "locale": locale,
        "questions": questions,
    })))
}

#[derive(Debug, Deserialize)]
struct AdvanceRequest {
    level: u64,
}

async fn advance_level(
    user: UserId,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<AdvanceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let counter =
        state
            .progression()
            .advance_game_level(user.as_str(), req.level, chrono::Utc::now())?;
    let band = u32::try_from(counter.value)
        .ok()
        .and_then(|level| state.progression().game_catalog().band_for_level(level));

    Ok(ok(serde_json::json!({
        "level": counter.value,
        "band": band,
        "updatedAt": counter.updated_at,
    })))
}
