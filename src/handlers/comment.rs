use axum::extract::{Extension, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::handlers::AppState;
use crate::middleware::{ApiResponse, ApiValue, AuthUser};
use crate::services::CommentService;

#[derive(Debug, Deserialize)]
pub struct CreateCommentBody {
    pub post_idx: i64,
    pub game_idx: i64,
    pub content: String,
}

/// POST /comment - comment on a post
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateCommentBody>,
) -> ApiValue {
    let service = CommentService::new(state.pool.clone());
    service
        .create_comment(user.user_idx, body.post_idx, body.game_idx, &body.content)
        .await?;

    Ok(ApiResponse::created(Value::Null))
}
