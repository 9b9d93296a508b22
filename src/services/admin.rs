use sqlx::PgPool;
use tracing::debug;

use crate::services::{notification, uniqueness, NotificationKind, WorkflowError};

#[derive(Debug, Clone)]
pub struct ApproveGameParams {
    pub request_idx: i64,
    pub title: String,
    pub title_kor: String,
    pub title_eng: String,
    pub thumbnail_url: String,
    pub banner_url: String,
}

pub struct AdminService {
    pool: PgPool,
}

impl AdminService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Approve a pending game request: consume the request, create the game
    /// with its announcement post and images, all in one transaction. Any
    /// failure leaves the request pending.
    pub async fn approve_game(
        &self,
        admin_idx: i64,
        params: ApproveGameParams,
    ) -> Result<i64, WorkflowError> {
        if params.thumbnail_url.is_empty() || params.banner_url.is_empty() {
            return Err(WorkflowError::BadRequest("no image".to_string()));
        }

        let mut tx = self.pool.begin().await.map_err(WorkflowError::from)?;

        // Consume the request first; live rows only, so a terminal request
        // cannot be approved twice
        let consumed: Option<(i64, String)> = sqlx::query_as(
            r#"
            UPDATE
                request
            SET
                deleted_at = now(), is_confirmed = true
            WHERE
                idx = $1
            AND
                deleted_at IS NULL
            RETURNING
                user_idx, title"#,
        )
        .bind(params.request_idx)
        .fetch_optional(&mut *tx)
        .await?;
        let (requester_idx, _request_title) = consumed
            .ok_or_else(|| WorkflowError::NoContent("no pending request".to_string()))?;

        if uniqueness::game_title_exists(&mut tx, &params.title_kor, &params.title_eng).await? {
            return Err(WorkflowError::Conflict("existing game title".to_string()));
        }

        let game_idx: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO
                game (title, title_kor, title_eng, user_idx)
            VALUES
                ($1, $2, $3, $4)
            RETURNING
                idx"#,
        )
        .bind(&params.title)
        .bind(&params.title_kor)
        .bind(&params.title_eng)
        .bind(requester_idx)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| WorkflowError::NoContent("game creation failed".to_string()))?;

        let post_title = format!("A new game \"{}\" has opened", params.title);
        let post_content = "Come say hello on the new board.".to_string();

        sqlx::query(
            r#"
            INSERT INTO
                post (title, content, user_idx, game_idx)
            VALUES
                ($1, $2, $3, $4)"#,
        )
        .bind(&post_title)
        .bind(&post_content)
        .bind(admin_idx)
        .bind(game_idx)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO
                game_img_thumbnail (game_idx, img_path)
            VALUES
                ($1, $2)"#,
        )
        .bind(game_idx)
        .bind(&params.thumbnail_url)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO
                game_img_banner (game_idx, img_path)
            VALUES
                ($1, $2)"#,
        )
        .bind(game_idx)
        .bind(&params.banner_url)
        .execute(&mut *tx)
        .await?;

        tx.commit().await.map_err(WorkflowError::from)?;
        debug!("request {} approved as game {}", params.request_idx, game_idx);

        Ok(game_idx)
    }

    /// Deny a pending game request and tell the requester. The tombstoned
    /// game row exists only so the notification has a game_idx to carry; it
    /// is soft-deleted the moment it is created.
    pub async fn deny_game(&self, request_idx: i64) -> Result<i64, WorkflowError> {
        let mut tx = self.pool.begin().await.map_err(WorkflowError::from)?;

        let denied: Option<(i64, String)> = sqlx::query_as(
            r#"
            UPDATE
                request
            SET
                deleted_at = now(), is_confirmed = false
            WHERE
                idx = $1
            AND
                deleted_at IS NULL
            RETURNING
                user_idx, title"#,
        )
        .bind(request_idx)
        .fetch_optional(&mut *tx)
        .await?;
        let (requester_idx, title) =
            denied.ok_or_else(|| WorkflowError::NoContent("no pending request".to_string()))?;

        let tombstone_idx: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO
                game (title, user_idx, deleted_at)
            VALUES
                ($1, $2, now())
            RETURNING
                idx"#,
        )
        .bind(&title)
        .bind(requester_idx)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| WorkflowError::NoContent("denial failed".to_string()))?;

        notification::notify_within(
            &mut tx,
            NotificationKind::DenyGame,
            requester_idx,
            Some(tombstone_idx),
            None,
        )
        .await?;

        tx.commit().await.map_err(WorkflowError::from)?;
        debug!("request {} denied, tombstone game {}", request_idx, tombstone_idx);

        Ok(tombstone_idx)
    }
}
