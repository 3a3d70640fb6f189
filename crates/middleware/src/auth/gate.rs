use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use std::sync::Arc;
use tracing::debug;

use recall_database::service::DbService;
use recall_error::{AppError, AppResult};
use recall_models::user::User;

use crate::auth::jwt::JwtService;

/// Everything the gate needs to turn a bearer token into a stored user
#[derive(Clone)]
pub struct AuthState {
    pub jwt_service: Arc<JwtService>,
    pub users: Arc<DbService<'static, User>>,
}

impl AuthState {
    pub fn new(jwt_service: Arc<JwtService>, users: Arc<DbService<'static, User>>) -> Self {
        Self { jwt_service, users }
    }
}

/// The resolved identity a protected handler receives. Extracting it IS the
/// auth gate: the handler body never runs unless the bearer token decoded
/// and resolved to a stored user.
#[derive(Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<AuthState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AuthState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).await
    }
}

/// The gate itself. Short-circuits before the protected handler runs: a
/// missing header is a 403, a malformed/expired/unknown-subject token a 401.
pub async fn authenticate(parts: &Parts, state: &AuthState) -> AppResult<AuthUser> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(AppError::missing_authorization)?;

    let auth_str = auth_header.to_str().map_err(|_| AppError::token_invalid())?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(AppError::token_invalid)?;

    let claims = state.jwt_service.validate_token(token)?;

    // A decoded subject that no longer maps to a stored user is treated
    // exactly like a forged token
    let user = state
        .users
        .get_record_by_id(&claims.sub)
        .await?
        .ok_or_else(AppError::token_invalid)?;

    debug!("Authenticated request for user {}", user.username);

    Ok(AuthUser(user))
}
