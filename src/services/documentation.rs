use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Hall of Fame Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::leaderboard::top_scores,
        crate::routes::leaderboard::top_scores_bundle,
        crate::routes::leaderboard::save_score,
        crate::routes::celebration::check_celebration,
        crate::routes::nickname::set_nickname,
        crate::routes::auth::me,
        crate::routes::auth::sign_in,
        crate::routes::auth::sign_out,
        crate::routes::admin::prune_game,
        crate::routes::admin::clear_rankings,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::leaderboard::ScoreRow,
            crate::dto::leaderboard::TopScoresResponse,
            crate::dto::leaderboard::BundleResponse,
            crate::dto::leaderboard::SaveScoreRequest,
            crate::dto::leaderboard::SaveScoreResponse,
            crate::dto::celebration::CelebrationRequest,
            crate::dto::celebration::CelebrationResponse,
            crate::dto::nickname::NicknameRequest,
            crate::dto::nickname::NicknameResponse,
            crate::dto::nickname::RenameReport,
            crate::dto::auth::UserDto,
            crate::dto::auth::SessionResponse,
            crate::dto::auth::SignInRequest,
            crate::dto::admin::PruneResponse,
            crate::dto::admin::ClearResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "leaderboard", description = "Ranked reads and score writes"),
        (name = "celebration", description = "Top-3 celebration checks"),
        (name = "nickname", description = "Nickname management"),
        (name = "auth", description = "Session lifecycle"),
        (name = "admin", description = "Pruning and wipes"),
    )
)]
pub struct ApiDoc;
