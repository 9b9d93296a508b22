use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A game creation request. Terminal once deleted_at is set:
/// is_confirmed tells approval apart from denial.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GameRequest {
    pub idx: i64,
    pub user_idx: i64,
    pub title: String,
    pub is_confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
