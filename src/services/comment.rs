use sqlx::PgPool;
use tracing::error;

use crate::services::{notification, NotificationKind, WorkflowError};

pub struct CommentService {
    pool: PgPool,
}

impl CommentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Write a comment, then tell the post owner. The notification runs
    /// strictly after commit and is best-effort: its failure never undoes
    /// the comment.
    pub async fn create_comment(
        &self,
        user_idx: i64,
        post_idx: i64,
        game_idx: i64,
        content: &str,
    ) -> Result<(), WorkflowError> {
        if content.trim().is_empty() {
            return Err(WorkflowError::BadRequest("no content".to_string()));
        }

        let mut tx = self.pool.begin().await.map_err(WorkflowError::from)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO
                comment (user_idx, post_idx, content)
            VALUES
                ($1, $2, $3)"#,
        )
        .bind(user_idx)
        .bind(post_idx)
        .bind(content)
        .execute(&mut *tx)
        .await?;
        if inserted.rows_affected() == 0 {
            return Err(WorkflowError::NoContent("comment failed".to_string()));
        }

        tx.commit().await.map_err(WorkflowError::from)?;

        // Post-commit: the comment stands whatever happens below
        match self.post_owner(post_idx).await {
            Ok(Some(owner_idx)) => notification::notify_detached(
                &self.pool,
                NotificationKind::MakeComment,
                owner_idx,
                Some(game_idx),
                Some(post_idx),
            ),
            Ok(None) => {}
            Err(err) => error!("post owner lookup failed: {}", err),
        }

        Ok(())
    }

    async fn post_owner(&self, post_idx: i64) -> sqlx::Result<Option<i64>> {
        sqlx::query_scalar(
            r#"
            SELECT
                u.idx
            FROM
                post p
            JOIN
                "user" u ON p.user_idx = u.idx
            WHERE
                p.idx = $1
            AND
                p.deleted_at IS NULL"#,
        )
        .bind(post_idx)
        .fetch_optional(&self.pool)
        .await
    }
}
