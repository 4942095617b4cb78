use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::extractors::{JsonBody, UserId};
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::validation::validate_user_id;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_pair).put(link).delete(unlink))
}

async fn get_pair(
    user: UserId,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let link = state.store().get_partner(user.as_str())?;
    Ok(ok(link))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkRequest {
    partner_id: String,
}

async fn link(
    user: UserId,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LinkRequest>,
) -> Result<impl IntoResponse, AppError> {
    let partner_id = req.partner_id.trim();
    validate_user_id(partner_id).map_err(|msg| AppError::bad_request("INVALID_USER_ID", msg))?;

    let link = state
        .progression()
        .link_partner(user.as_str(), partner_id, chrono::Utc::now())?;
    Ok(ok(link))
}

async fn unlink(
    user: UserId,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let unlinked = state.progression().unlink_partner(user.as_str())?;
    Ok(ok(serde_json::json!({ "unlinked": unlinked })))
}
