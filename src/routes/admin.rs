use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, post},
};

use crate::{
    dto::{
        admin::{ClearResponse, PruneQuery, PruneResponse},
        leaderboard::{ScoreRow, source_tag},
    },
    error::AppError,
    services::leaderboard_service,
    state::SharedState,
};

/// Administrative routes: pruning and the full wipe.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/admin/leaderboards/{game_id}/prune", post(prune_game))
        .route("/admin/rankings", delete(clear_rankings))
}

/// Delete everything beyond the top entries of one game.
#[utoipa::path(
    post,
    path = "/admin/leaderboards/{game_id}/prune",
    tag = "admin",
    params(
        ("game_id" = String, Path, description = "Game identifier"),
        ("keep" = Option<usize>, Query, description = "Entries to keep, defaults to 3"),
    ),
    responses((status = 200, description = "Prune outcome", body = PruneResponse))
)]
pub async fn prune_game(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    Query(query): Query<PruneQuery>,
) -> Result<Json<PruneResponse>, AppError> {
    let outcome = leaderboard_service::prune_game_rankings(&state, &game_id, query.keep).await?;
    Ok(Json(PruneResponse {
        game_id,
        kept: outcome.kept.into_iter().map(ScoreRow::from).collect(),
        deleted: outcome.deleted,
        source: source_tag(outcome.source).to_owned(),
    }))
}

/// Wipe every ranking tier and the in-process celebration locks.
#[utoipa::path(
    delete,
    path = "/admin/rankings",
    tag = "admin",
    responses((status = 200, description = "Wipe outcome", body = ClearResponse))
)]
pub async fn clear_rankings(State(state): State<SharedState>) -> Json<ClearResponse> {
    let outcome = leaderboard_service::clear_all_rankings(&state).await;
    Json(ClearResponse {
        remote_cleared: outcome.remote_cleared,
        local_cleared: outcome.local_cleared,
    })
}
