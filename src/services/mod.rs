/// Sign-in context gating and session fan-out.
pub mod auth_service;
/// Embedded browser detection and the external-browser escape URL.
pub mod browser;
/// Top-3 qualification checks with the one-shot celebration lock.
pub mod celebration_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Read and write paths over the tiered leaderboard stores.
pub mod leaderboard_service;
/// Nickname cooldown and daily-quota accounting.
pub mod nickname_limit;
/// Nickname changes with historical entry renames.
pub mod nickname_service;
/// Remote connection supervisor with reconnection backoff.
pub mod remote_supervisor;
/// Shared top-3 snapshot maintenance.
pub mod snapshot_service;
