use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};

use crate::{
    dto::celebration::{CelebrationRequest, CelebrationResponse},
    error::AppError,
    services::celebration_service,
    state::SharedState,
};

/// Routes deciding whether a run deserves the top-3 celebration.
pub fn router() -> Router<SharedState> {
    Router::new().route("/celebrations/{game_id}", post(check_celebration))
}

/// Check a score against the game's current top-3 and record it when it
/// qualifies.
#[utoipa::path(
    post,
    path = "/celebrations/{game_id}",
    tag = "celebration",
    params(("game_id" = String, Path, description = "Game identifier")),
    request_body = CelebrationRequest,
    responses(
        (status = 200, description = "Celebration verdict", body = CelebrationResponse),
        (status = 404, description = "Unknown game"),
    )
)]
pub async fn check_celebration(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    Json(payload): Json<CelebrationRequest>,
) -> Result<Json<CelebrationResponse>, AppError> {
    let outcome = celebration_service::check_and_celebrate(&state, &game_id, payload.score).await?;
    Ok(Json(CelebrationResponse {
        celebrate: outcome.celebrate,
        saved: outcome.saved,
    }))
}
