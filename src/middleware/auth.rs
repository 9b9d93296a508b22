use axum::{
    extract::Request,
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{self, Claims};
use crate::error::ApiError;

/// Authenticated caller context extracted from the bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_idx: i64,
    pub is_admin: bool,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_idx: claims.user_idx,
            is_admin: claims.is_admin,
        }
    }
}

/// Middleware requiring a valid bearer token; injects `AuthUser` into the
/// request extensions for downstream handlers.
pub async fn require_auth(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&headers)?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Middleware requiring a valid bearer token whose claim carries the admin
/// flag. The flag must be exactly true; anything else is rejected.
pub async fn require_admin(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&headers)?;

    if !user.is_admin {
        return Err(ApiError::unauthorized("no admin"));
    }
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

fn authenticate(headers: &HeaderMap) -> Result<AuthUser, ApiError> {
    let token = extract_bearer(headers)?;
    let claims = auth::verify_token(&token).map_err(|_| ApiError::unauthorized("invalid token"))?;

    Ok(AuthUser::from(claims))
}

/// Extract the token from an `Authorization: Bearer <token>` header
fn extract_bearer(headers: &HeaderMap) -> Result<String, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("no token"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("invalid scheme"))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized("invalid scheme"))?;

    if token.trim().is_empty() {
        return Err(ApiError::unauthorized("no token"));
    }

    Ok(token.trim().to_string())
}
