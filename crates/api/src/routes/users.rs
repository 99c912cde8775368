//! User route handlers.
//!
//! Registration and login return a Bearer token alongside the profile.
//! Profile reads and writes are self-or-admin.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use cedarmarket_core::{Email, UserId};

use crate::db::{RepositoryError, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::User;
use crate::routes::{CountResponse, MessageResponse};
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

/// Registration payload.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login payload.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Profile update payload.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Authentication response: the profile plus a fresh token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// Register a new account.
#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".to_owned()));
    }

    let (user, token) = AuthService::new(state.pool(), state.jwt())
        .register(body.name.trim(), &body.email, &body.password)
        .await?;

    tracing::info!(user = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

/// Login with email and password.
#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let (user, token) = AuthService::new(state.pool(), state.jwt())
        .login(&body.email, &body.password)
        .await?;

    Ok(Json(AuthResponse { user, token }))
}

/// The caller's own profile.
#[instrument(skip(state))]
pub async fn me(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<User>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;

    Ok(Json(user))
}

/// List every user (admin).
#[instrument(skip(state))]
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>> {
    let users = UserRepository::new(state.pool()).list().await?;
    Ok(Json(users))
}

/// Total user count (admin).
#[instrument(skip(state))]
pub async fn count(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<CountResponse>> {
    let count = UserRepository::new(state.pool()).count().await?;
    Ok(Json(CountResponse { count }))
}

/// One user's profile (self or admin).
#[instrument(skip(state))]
pub async fn get_by_id(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<User>> {
    ensure_self_or_admin(&auth, id)?;

    let user = UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;

    Ok(Json(user))
}

/// Update a profile (self or admin). A new password is re-validated and
/// re-hashed.
#[instrument(skip(state, body))]
pub async fn update(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    ensure_self_or_admin(&auth, id)?;

    let repo = UserRepository::new(state.pool());
    let current = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;

    let name = body.name.unwrap_or(current.name);
    let email = match body.email {
        Some(raw) => Email::parse(&raw).map_err(AuthError::from)?,
        None => current.email,
    };
    let password_hash = body
        .password
        .map(|password| AuthService::new(state.pool(), state.jwt()).hash_new_password(&password))
        .transpose()?;

    let updated = repo
        .update(id, &name, &email, password_hash.as_deref())
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AppError::Auth(AuthError::UserAlreadyExists),
            other => AppError::Database(other),
        })?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;

    Ok(Json(updated))
}

/// Delete an account (self or admin).
#[instrument(skip(state))]
pub async fn delete(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<MessageResponse>> {
    ensure_self_or_admin(&auth, id)?;

    let deleted = UserRepository::new(state.pool()).delete(id).await?;
    if !deleted {
        return Err(AppError::NotFound("User not found".to_owned()));
    }

    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// Owner-or-admin guard shared by the profile routes.
fn ensure_self_or_admin(auth: &crate::middleware::AuthUser, id: UserId) -> Result<()> {
    if auth.id != id && !auth.is_admin {
        return Err(AppError::Forbidden(
            "Not authorized to access this user".to_owned(),
        ));
    }
    Ok(())
}
