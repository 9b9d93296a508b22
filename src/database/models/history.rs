use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One wiki revision. Append-only; the latest row per game is the current
/// wiki content.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct History {
    pub idx: i64,
    pub game_idx: i64,
    pub user_idx: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
