use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, header},
    routing::{get, post},
};

use crate::{
    dto::auth::{SessionResponse, SignInRequest},
    error::AppError,
    services::auth_service::{self, ClientContext},
    state::SharedState,
};

/// Routes exposing the session lifecycle.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-out", post(sign_out))
}

/// Current session, falling back to the cached rendering snapshot.
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses((status = 200, description = "Session view", body = SessionResponse))
)]
pub async fn me(State(state): State<SharedState>) -> Json<SessionResponse> {
    let view = auth_service::current_session(&state).await;
    Json(SessionResponse::from(view))
}

/// Run the interactive sign-in flow for the calling context.
#[utoipa::path(
    post,
    path = "/auth/sign-in",
    tag = "auth",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 403, description = "Context refused (embedded browser, file page, insecure origin)"),
        (status = 502, description = "Interactive flow failed"),
    )
)]
pub async fn sign_in(
    State(state): State<SharedState>,
    headers: HeaderMap,
    payload: Option<Json<SignInRequest>>,
) -> Result<Json<SessionResponse>, AppError> {
    let target_url = payload.and_then(|Json(body)| body.target_url);
    let ctx = client_context(&headers, target_url);

    auth_service::sign_in(&state, &ctx).await?;
    let view = auth_service::current_session(&state).await;
    Ok(Json(SessionResponse::from(view)))
}

/// Terminate the current session.
#[utoipa::path(
    post,
    path = "/auth/sign-out",
    tag = "auth",
    responses((status = 200, description = "Signed out", body = SessionResponse))
)]
pub async fn sign_out(State(state): State<SharedState>) -> Result<Json<SessionResponse>, AppError> {
    auth_service::sign_out(&state).await?;
    let view = auth_service::current_session(&state).await;
    Ok(Json(SessionResponse::from(view)))
}

/// Reconstruct the calling page's context from request headers: the Origin
/// header when present, otherwise forwarded-proto plus Host.
fn client_context(headers: &HeaderMap, target_url: Option<String>) -> ClientContext {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("")
            .to_owned()
    };

    let user_agent = header_str(header::USER_AGENT);

    let (scheme, host) = match headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .and_then(|origin| origin.split_once("://"))
    {
        Some((scheme, host)) => (scheme.to_owned(), host.to_owned()),
        None => {
            let scheme = headers
                .get("x-forwarded-proto")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("http")
                .to_owned();
            (scheme, header_str(header::HOST))
        }
    };

    ClientContext {
        user_agent,
        scheme,
        host,
        target_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn context_prefers_origin_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ORIGIN,
            HeaderValue::from_static("https://games.example.com"),
        );
        headers.insert(header::HOST, HeaderValue::from_static("internal:8080"));

        let ctx = client_context(&headers, None);
        assert_eq!(ctx.scheme, "https");
        assert_eq!(ctx.host, "games.example.com");
    }

    #[test]
    fn context_falls_back_to_forwarded_proto_and_host() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        headers.insert(header::HOST, HeaderValue::from_static("games.example.com"));

        let ctx = client_context(&headers, None);
        assert_eq!(ctx.scheme, "https");
        assert_eq!(ctx.host, "games.example.com");
    }
}
