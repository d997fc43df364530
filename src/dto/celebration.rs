use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Payload for a celebration check.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CelebrationRequest {
    pub score: f64,
}

/// Verdict of a celebration check.
#[derive(Debug, Serialize, ToSchema)]
pub struct CelebrationResponse {
    /// Whether the score enters the current top-3.
    pub celebrate: bool,
    /// Whether the best-effort auto-save recorded the score.
    pub saved: bool,
}
