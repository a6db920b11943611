//! Per-request identity.
//!
//! Credentials are verified by an authenticator in front of this service,
//! which forwards the resolved user id in a configurable header. Handlers
//! that need a caller take an [`AuthUser`]; requests without a usable id are
//! rejected with 401 before the handler runs.

use agora_shared::UserId;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::api::AppState;
use crate::error::ServerError;

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub UserId);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(&state.config.identity_header) else {
            return Err(ServerError::Unauthenticated(
                "No token, authorization denied".into(),
            ));
        };

        value
            .to_str()
            .ok()
            .and_then(|raw| UserId::parse(raw).ok())
            .map(AuthUser)
            .ok_or_else(|| ServerError::Unauthenticated("Token is not valid".into()))
    }
}
