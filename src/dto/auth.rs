use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dao::{identity::Identity, models::AuthCacheEntity},
    services::auth_service::SessionView,
};

/// Rendering view of a session's identity.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub uid: String,
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(rename = "photoURL", skip_serializing_if = "String::is_empty")]
    pub photo_url: String,
}

impl From<Identity> for UserDto {
    fn from(identity: Identity) -> Self {
        Self {
            uid: identity.uid,
            name: identity.display_name,
            email: identity.email,
            photo_url: identity.photo_url,
        }
    }
}

impl From<AuthCacheEntity> for UserDto {
    fn from(cached: AuthCacheEntity) -> Self {
        Self {
            uid: cached.uid,
            name: cached.display_name,
            email: cached.email,
            photo_url: cached.photo_url,
        }
    }
}

/// Response to `GET /auth/me` and `POST /auth/sign-in`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub signed_in: bool,
    /// Live session, stored nickname applied over the provider name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserDto>,
    /// Last-known identity for rendering while signed out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<UserDto>,
}

impl From<SessionView> for SessionResponse {
    fn from(view: SessionView) -> Self {
        let nickname = view.nickname;
        let user = view.identity.map(|identity| {
            let mut dto = UserDto::from(identity);
            if let Some(nickname) = nickname {
                dto.name = nickname;
            }
            dto
        });

        Self {
            signed_in: user.is_some(),
            user,
            cached: view.cached.map(UserDto::from),
        }
    }
}

/// Payload for the interactive sign-in flow.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    /// URL of the calling page, used to build the external-browser escape
    /// link when the caller is an embedded browser.
    #[serde(default)]
    pub target_url: Option<String>,
}
