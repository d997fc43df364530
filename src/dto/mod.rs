pub mod admin;
pub mod auth;
pub mod celebration;
pub mod health;
pub mod leaderboard;
pub mod nickname;
pub mod validation;
