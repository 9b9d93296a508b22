use axum::extract::{Extension, Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::handlers::AppState;
use crate::middleware::{ApiResponse, ApiValue, AuthUser};
use crate::services::admin::ApproveGameParams;
use crate::services::AdminService;

#[derive(Debug, Deserialize)]
pub struct ApproveGameBody {
    pub request_idx: i64,
    pub title: String,
    pub title_kor: String,
    pub title_eng: String,
    pub thumbnail_url: String,
    pub banner_url: String,
}

/// POST /admin/game - approve a pending game request
pub async fn approve_game(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<ApproveGameBody>,
) -> ApiValue {
    let service = AdminService::new(state.pool.clone());
    let game_idx = service
        .approve_game(
            user.user_idx,
            ApproveGameParams {
                request_idx: body.request_idx,
                title: body.title,
                title_kor: body.title_kor,
                title_eng: body.title_eng,
                thumbnail_url: body.thumbnail_url,
                banner_url: body.banner_url,
            },
        )
        .await?;

    Ok(ApiResponse::created(json!({ "gameIdx": game_idx })))
}

/// DELETE /admin/request/:request_idx - deny a pending game request
pub async fn deny_game(
    State(state): State<AppState>,
    Path(request_idx): Path<i64>,
) -> ApiValue {
    let service = AdminService::new(state.pool.clone());
    service.deny_game(request_idx).await?;

    Ok(ApiResponse::success(Value::Null))
}
