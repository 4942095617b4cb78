pub mod devotional;
pub mod game;
pub mod health;
pub mod pair;
pub mod rotation;

use axum::extract::DefaultBodyLimit;
use axum::response::IntoResponse;
use axum::Router;

use crate::middleware::request_id;
use crate::progression::types::{LoveLanguage, Temperament};
use crate::response::AppError;
use crate::state::AppState;

/// 请求体上限 64 KiB：最大的请求是 20 道题的答案
const MAX_BODY_SIZE: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .nest("/pair", pair::router())
        .nest("/love-language", rotation::router::<LoveLanguage>())
        .nest("/temperament", rotation::router::<Temperament>())
        .nest("/devotional", devotional::router())
        .nest("/game", game::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE));

    Router::new()
        .nest("/api", api_routes)
        .nest("/health", health::router())
        .fallback(fallback_404)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .with_state(state)
}

async fn fallback_404() -> impl IntoResponse {
    AppError::not_found("Not found")
}
