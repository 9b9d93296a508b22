use axum::extract::{Extension, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::handlers::AppState;
use crate::middleware::{ApiResponse, ApiValue, AuthUser};
use crate::services::account::RegisterParams;
use crate::services::AccountService;

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    pub id: String,
    pub pw: String,
    pub nickname: String,
    pub email: String,
}

/// POST /account - local signup
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> ApiValue {
    let service = AccountService::new(state.pool.clone());
    let user_idx = service
        .register(RegisterParams {
            login_id: body.id,
            password: body.pw,
            nickname: body.nickname,
            email: body.email,
        })
        .await?;

    Ok(ApiResponse::created(json!({ "idx": user_idx })))
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub id: String,
    pub pw: String,
}

/// POST /account/auth - local login, returns a bearer token
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginBody>) -> ApiValue {
    let service = AccountService::new(state.pool.clone());
    let outcome = service.login(&body.id, &body.pw).await?;

    Ok(ApiResponse::success(json!({
        "token": outcome.token,
        "user": outcome.user,
    })))
}

#[derive(Debug, Deserialize)]
pub struct OauthCallbackQuery {
    pub code: String,
}

/// GET /account/auth/oauth - provider callback; exchanges the code and
/// registers the external identity
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(query): Query<OauthCallbackQuery>,
) -> ApiValue {
    let identity = state.provider.exchange(&query.code).await?;

    let service = AccountService::new(state.pool.clone());
    let outcome = service.oauth_register(identity).await?;

    Ok(ApiResponse::success(json!({
        "idx": outcome.user_idx,
        "email": outcome.email,
        "token": outcome.token,
    })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateInfoBody {
    pub nickname: String,
    pub email: String,
}

/// PUT /account/info - change own nickname/email
pub async fn update_info(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateInfoBody>,
) -> ApiValue {
    let service = AccountService::new(state.pool.clone());
    service
        .update_profile(user.user_idx, &body.nickname, &body.email)
        .await?;

    Ok(ApiResponse::success(Value::Null))
}

/// DELETE /account/me - soft-delete own account
pub async fn withdraw(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiValue {
    let service = AccountService::new(state.pool.clone());
    service.withdraw(user.user_idx).await?;

    Ok(ApiResponse::success(Value::Null))
}
