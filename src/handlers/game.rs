use axum::extract::{Extension, Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::handlers::AppState;
use crate::middleware::{ApiResponse, ApiValue, AuthUser};
use crate::services::GameService;

#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
    pub title: String,
}

/// POST /game/request - ask for a new game board
pub async fn create_request(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateRequestBody>,
) -> ApiValue {
    let service = GameService::new(state.pool.clone());
    service.create_request(user.user_idx, &body.title).await?;

    Ok(ApiResponse::success(Value::Null))
}

#[derive(Debug, Deserialize)]
pub struct ReviseWikiBody {
    pub content: String,
}

/// PUT /game/:game_idx/wiki - append a wiki revision
pub async fn revise_wiki(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(game_idx): Path<i64>,
    Json(body): Json<ReviseWikiBody>,
) -> ApiValue {
    let service = GameService::new(state.pool.clone());
    service
        .revise_wiki(game_idx, user.user_idx, &body.content)
        .await?;

    Ok(ApiResponse::created(Value::Null))
}
