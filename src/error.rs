use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::dao::storage::StorageError;

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Score was NaN or infinite after normalization.
    #[error("score is not a finite number")]
    InvalidScore,
    /// Nickname collapsed to nothing after trimming.
    #[error("invalid nickname: {0}")]
    InvalidName(String),
    /// The operation requires a signed-in identity.
    #[error("sign-in required")]
    AuthRequired,
    /// The remote tier is unreachable and the operation cannot fall back.
    #[error("remote leaderboard unavailable")]
    RemoteUnavailable,
    /// Sign-in cannot run in the calling context at all.
    #[error("sign-in is not supported in this context")]
    AuthUnsupportedContext,
    /// Sign-in refused because the calling page is not on a secure origin.
    #[error("sign-in requires a secure origin")]
    AuthInsecureContext,
    /// Sign-in refused because the caller is an embedded in-app browser.
    #[error("sign-in is blocked inside the {browser} in-app browser")]
    AuthEmbeddedBrowserBlocked {
        browser: String,
        /// URL that reopens the page in a real browser, when one can be built.
        redirect: Option<String>,
    },
    /// No auth persistence mode could be established for the session.
    #[error("no auth persistence is available")]
    AuthStorageUnavailable,
    /// Nickname change attempted before the cooldown elapsed.
    #[error("nickname changed too recently, retry in {retry_after_seconds}s")]
    NicknameCooldown { retry_after_seconds: u64 },
    /// Nickname change attempted after the daily quota was spent.
    #[error("nickname daily limit of {limit} reached")]
    NicknameDailyLimit { limit: u32 },
    /// Nickname could not be stored anywhere.
    #[error("nickname could not be saved")]
    NicknameSaveFailed,
    /// The interactive sign-in flow failed.
    #[error("sign-in failed: {0}")]
    SignInFailed(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Storage backend failure surfaced unchanged.
    #[error("storage unavailable")]
    Storage(#[from] StorageError),
}

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// Stable machine-readable code.
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Escape URL for embedded-browser rejections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

/// Application-level error carrying the HTTP mapping of a [`ServiceError`].
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl AppError {
    fn new(status: StatusCode, code: &'static str, message: String) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message,
                retry_after_seconds: None,
                limit: None,
                redirect: None,
            },
        }
    }

    /// 400 with a free-form message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad-request", message.into())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::bad_request(format!("validation failed: {err}"))
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let message = err.to_string();
        match err {
            ServiceError::InvalidScore => {
                Self::new(StatusCode::BAD_REQUEST, "invalid-score", message)
            }
            ServiceError::InvalidName(_) => {
                Self::new(StatusCode::BAD_REQUEST, "invalid-name", message)
            }
            ServiceError::AuthRequired => {
                Self::new(StatusCode::UNAUTHORIZED, "auth-required", message)
            }
            ServiceError::RemoteUnavailable => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "remote-unavailable", message)
            }
            ServiceError::AuthUnsupportedContext => {
                Self::new(StatusCode::FORBIDDEN, "auth-unsupported-context", message)
            }
            ServiceError::AuthInsecureContext => {
                Self::new(StatusCode::FORBIDDEN, "auth-insecure-context", message)
            }
            ServiceError::AuthEmbeddedBrowserBlocked { redirect, .. } => {
                let mut app =
                    Self::new(StatusCode::FORBIDDEN, "auth-embedded-browser-blocked", message);
                app.body.redirect = redirect;
                app
            }
            ServiceError::AuthStorageUnavailable => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "auth-storage-unavailable", message)
            }
            ServiceError::NicknameCooldown { retry_after_seconds } => {
                let mut app =
                    Self::new(StatusCode::TOO_MANY_REQUESTS, "nickname-cooldown", message);
                app.body.retry_after_seconds = Some(retry_after_seconds);
                app
            }
            ServiceError::NicknameDailyLimit { limit } => {
                let mut app =
                    Self::new(StatusCode::TOO_MANY_REQUESTS, "nickname-daily-limit", message);
                app.body.limit = Some(limit);
                app
            }
            ServiceError::NicknameSaveFailed => {
                Self::new(StatusCode::BAD_GATEWAY, "nickname-save-failed", message)
            }
            ServiceError::SignInFailed(_) => {
                Self::new(StatusCode::BAD_GATEWAY, "sign-in-failed", message)
            }
            ServiceError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, "not-found", message),
            ServiceError::Storage(_) => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "storage-unavailable", message)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_carries_retry_seconds() {
        let app = AppError::from(ServiceError::NicknameCooldown {
            retry_after_seconds: 17,
        });
        assert_eq!(app.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(app.body.code, "nickname-cooldown");
        assert_eq!(app.body.retry_after_seconds, Some(17));
    }

    #[test]
    fn daily_limit_carries_quota() {
        let app = AppError::from(ServiceError::NicknameDailyLimit { limit: 2 });
        assert_eq!(app.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(app.body.limit, Some(2));
    }

    #[test]
    fn embedded_browser_rejection_carries_redirect() {
        let app = AppError::from(ServiceError::AuthEmbeddedBrowserBlocked {
            browser: "kakaotalk".into(),
            redirect: Some("https://example.com/play".into()),
        });
        assert_eq!(app.status, StatusCode::FORBIDDEN);
        assert_eq!(app.body.redirect.as_deref(), Some("https://example.com/play"));
    }
}
