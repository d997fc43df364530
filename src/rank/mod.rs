//! Pure leaderboard primitives: score/name normalization and the shared
//! ordering law applied identically by every store tier.

/// Score and display-name normalization.
pub mod codec;
/// Ordering, tie-break, and top-K selection.
pub mod ordering;

pub use codec::{
    DEFAULT_PLAYER_NAME, MAX_NAME_CHARS, normalize_nickname, normalize_score, sanitize_name,
    score_from_value,
};
pub use ordering::{TOP_K, clamp_limit, select_top_k, sort_entries};
