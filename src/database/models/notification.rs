use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Append-only notification row; one per recipient even for bulk fan-out.
/// The type column is nullable in the schema, see NotificationKind.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub idx: i64,
    #[sqlx(rename = "type")]
    pub r#type: Option<i16>,
    pub user_idx: i64,
    pub game_idx: Option<i64>,
    pub post_idx: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
