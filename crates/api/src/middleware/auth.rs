//! Authentication extractors.
//!
//! Identity rides in an `Authorization: Bearer` token whose claims carry
//! the user id and admin flag; handlers pick the extractor matching the
//! access they need:
//!
//! - [`CurrentUser`] - optional identity (public routes that personalize)
//! - [`RequireAuth`] - any authenticated user
//! - [`RequireAdmin`] - admin users only

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use cedarmarket_core::UserId;

use crate::state::AppState;

/// The identity carried by a verified token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: UserId,
    pub is_admin: bool,
}

/// Extractor for an optional authenticated identity.
///
/// Never rejects: a missing or invalid token yields `CurrentUser(None)`.
pub struct CurrentUser(pub Option<AuthUser>);

/// Extractor that requires an authenticated identity.
pub struct RequireAuth(pub AuthUser);

/// Extractor that requires an authenticated admin.
pub struct RequireAdmin(pub AuthUser);

/// Rejection for the auth extractors.
pub enum AuthRejection {
    /// No valid token on the request.
    Unauthorized,
    /// Valid token, but the caller is not an admin.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Not authorized, token missing or invalid" })),
            )
                .into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(json!({ "message": "Admin access required" })),
            )
                .into_response(),
        }
    }
}

/// Pull and verify the Bearer token from the request, if any.
fn authenticate<S>(parts: &Parts, state: &S) -> Option<AuthUser>
where
    AppState: FromRef<S>,
{
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?;

    let app_state = AppState::from_ref(state);
    match app_state.jwt().verify(token) {
        Ok(claims) => Some(AuthUser {
            id: claims.user_id(),
            is_admin: claims.admin,
        }),
        Err(e) => {
            tracing::debug!(error = %e, "rejected bearer token");
            None
        }
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(authenticate(parts, state)))
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authenticate(parts, state)
            .map(Self)
            .ok_or(AuthRejection::Unauthorized)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).ok_or(AuthRejection::Unauthorized)?;

        if !user.is_admin {
            return Err(AuthRejection::Forbidden);
        }

        Ok(Self(user))
    }
}
