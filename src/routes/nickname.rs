use axum::{Json, Router, extract::State, routing::put};
use axum_valid::Valid;

use crate::{
    dto::nickname::{NicknameRequest, NicknameResponse, RenameReport},
    error::AppError,
    services::nickname_service,
    state::SharedState,
};

/// Routes managing the signed-in player's nickname.
pub fn router() -> Router<SharedState> {
    Router::new().route("/nickname", put(set_nickname))
}

/// Change the signed-in player's nickname and rename their historical
/// entries.
#[utoipa::path(
    put,
    path = "/nickname",
    tag = "nickname",
    request_body = NicknameRequest,
    responses(
        (status = 200, description = "Nickname changed", body = NicknameResponse),
        (status = 401, description = "Sign-in required"),
        (status = 429, description = "Cooldown or daily limit hit"),
        (status = 502, description = "Nickname could not be saved anywhere"),
    )
)]
pub async fn set_nickname(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<NicknameRequest>>,
) -> Result<Json<NicknameResponse>, AppError> {
    let outcome = nickname_service::set_nickname(&state, &payload.nickname).await?;
    Ok(Json(NicknameResponse {
        renamed_entries: outcome.renamed_entries(),
        nickname: outcome.nickname,
        wrote_server: outcome.wrote_server,
        renames: outcome
            .renames
            .into_iter()
            .map(|r| RenameReport {
                game_id: r.game_id,
                renamed: r.renamed,
                error: r.error,
            })
            .collect(),
    }))
}
