use sqlx::PgPool;
use tracing::debug;

use crate::services::{notification, NotificationKind, WorkflowError};

pub struct GameService {
    pool: PgPool,
}

impl GameService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// File a request for a new game board. A live game already carrying
    /// the display title blocks the request.
    pub async fn create_request(&self, user_idx: i64, title: &str) -> Result<(), WorkflowError> {
        if title.trim().is_empty() {
            return Err(WorkflowError::BadRequest("no title".to_string()));
        }

        let mut tx = self.pool.begin().await.map_err(WorkflowError::from)?;

        let existing: i64 = sqlx::query_scalar(
            r#"
            SELECT
                COUNT(*)
            FROM
                game
            WHERE
                title = $1
            AND
                deleted_at IS NULL"#,
        )
        .bind(title)
        .fetch_one(&mut *tx)
        .await?;
        if existing > 0 {
            return Err(WorkflowError::Conflict("that game already exists".to_string()));
        }

        sqlx::query(
            r#"
            INSERT INTO
                request (user_idx, title)
            VALUES
                ($1, $2)"#,
        )
        .bind(user_idx)
        .bind(title)
        .execute(&mut *tx)
        .await?;

        tx.commit().await.map_err(WorkflowError::from)?;
        Ok(())
    }

    /// Append a wiki revision and fan a notification out to every distinct
    /// prior contributor. The fan-out rides the same transaction as the
    /// history insert: if the insert fails, no notification survives.
    pub async fn revise_wiki(
        &self,
        game_idx: i64,
        user_idx: i64,
        content: &str,
    ) -> Result<(), WorkflowError> {
        if content.trim().is_empty() {
            return Err(WorkflowError::BadRequest("no content".to_string()));
        }

        let mut tx = self.pool.begin().await.map_err(WorkflowError::from)?;

        let contributors: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT
                user_idx
            FROM
                history
            WHERE
                game_idx = $1"#,
        )
        .bind(game_idx)
        .fetch_all(&mut *tx)
        .await?;
        if contributors.is_empty() {
            return Err(WorkflowError::NoContent("no history".to_string()));
        }

        notification::notify_all_within(&mut tx, NotificationKind::ModifyGame, &contributors, game_idx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO
                history (game_idx, user_idx, content)
            VALUES
                ($1, $2, $3)"#,
        )
        .bind(game_idx)
        .bind(user_idx)
        .bind(content)
        .execute(&mut *tx)
        .await?;

        tx.commit().await.map_err(WorkflowError::from)?;
        debug!("wiki revised for game {} by user {}", game_idx, user_idx);

        Ok(())
    }
}
