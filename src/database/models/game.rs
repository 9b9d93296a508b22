use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A game board. Tombstoned rows (soft-deleted at insert) exist only to
/// anchor denial notifications and never show up in live listings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Game {
    pub idx: i64,
    pub user_idx: i64,
    pub title: String,
    pub title_kor: Option<String>,
    pub title_eng: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
