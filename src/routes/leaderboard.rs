use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};

use crate::{
    dto::leaderboard::{
        BundleQuery, BundleResponse, SaveScoreRequest, SaveScoreResponse, ScoreRow,
        TopScoresQuery, TopScoresResponse,
    },
    error::AppError,
    services::leaderboard_service,
    state::SharedState,
};

/// Routes serving ranked reads and score writes.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/leaderboards", get(top_scores_bundle))
        .route("/leaderboards/{game_id}", get(top_scores))
        .route("/leaderboards/{game_id}/scores", post(save_score))
}

/// Top entries for one game, best available tier.
#[utoipa::path(
    get,
    path = "/leaderboards/{game_id}",
    tag = "leaderboard",
    params(
        ("game_id" = String, Path, description = "Game identifier"),
        ("limit" = Option<usize>, Query, description = "Row cap, defaults to 3"),
        ("forceRefresh" = Option<bool>, Query, description = "Bypass the persisted cache"),
    ),
    responses((status = 200, description = "Ranked rows", body = TopScoresResponse))
)]
pub async fn top_scores(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    Query(query): Query<TopScoresQuery>,
) -> Json<TopScoresResponse> {
    let rows =
        leaderboard_service::get_top_scores(&state, &game_id, query.limit, query.force_refresh)
            .await;
    Json(TopScoresResponse {
        game_id,
        rows: rows.into_iter().map(ScoreRow::from).collect(),
    })
}

/// Top entries for several games in one pass, with a provenance tag.
#[utoipa::path(
    get,
    path = "/leaderboards",
    tag = "leaderboard",
    params(
        ("games" = Option<String>, Query, description = "Comma-separated game ids; defaults to the catalog"),
        ("limit" = Option<usize>, Query, description = "Row cap per game, defaults to 3"),
        ("forceRefresh" = Option<bool>, Query, description = "Bypass the persisted cache"),
    ),
    responses((status = 200, description = "Rows per game", body = BundleResponse))
)]
pub async fn top_scores_bundle(
    State(state): State<SharedState>,
    Query(query): Query<BundleQuery>,
) -> Json<BundleResponse> {
    let game_ids: Vec<String> = match query.games.as_deref() {
        Some(games) => games
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_owned)
            .collect(),
        None => state.config().games.keys().cloned().collect(),
    };

    let outcome = leaderboard_service::get_top_scores_bundle(
        &state,
        &game_ids,
        query.limit,
        query.force_refresh,
    )
    .await;
    Json(BundleResponse::from(outcome))
}

/// Record a finished run's score.
#[utoipa::path(
    post,
    path = "/leaderboards/{game_id}/scores",
    tag = "leaderboard",
    params(("game_id" = String, Path, description = "Game identifier")),
    request_body = SaveScoreRequest,
    responses(
        (status = 200, description = "Score recorded", body = SaveScoreResponse),
        (status = 400, description = "Score is not a finite number"),
        (status = 401, description = "Sign-in required for remote writes"),
        (status = 503, description = "Remote tier unavailable"),
    )
)]
pub async fn save_score(
    State(state): State<SharedState>,
    Path(game_id): Path<String>,
    Json(payload): Json<SaveScoreRequest>,
) -> Result<Json<SaveScoreResponse>, AppError> {
    let saved = leaderboard_service::save_score(
        &state,
        &game_id,
        payload.name.as_deref(),
        payload.score,
        payload.extra,
    )
    .await?;
    Ok(Json(SaveScoreResponse::from(saved)))
}
