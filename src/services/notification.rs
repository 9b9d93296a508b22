//! Notification dispatch. Two modes, chosen explicitly at the call site:
//! `notify_within`/`notify_all_within` write on the caller's transaction and
//! roll back with it; `notify_detached` runs on its own pooled connection
//! after the caller has committed, and never fails the caller.

use sqlx::{PgConnection, PgPool};

/// Kinds of notification and their fixed type codes in the `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Someone commented on the recipient's post
    MakeComment,
    /// A game wiki the recipient contributed to was revised
    ModifyGame,
    /// The recipient's game request was denied
    DenyGame,
}

impl NotificationKind {
    pub fn type_code(self) -> i16 {
        match self {
            NotificationKind::MakeComment => 1,
            NotificationKind::ModifyGame => 2,
            NotificationKind::DenyGame => 3,
        }
    }
}

/// Insert exactly one notification row on the caller's transaction.
pub async fn notify_within(
    conn: &mut PgConnection,
    kind: NotificationKind,
    user_idx: i64,
    game_idx: Option<i64>,
    post_idx: Option<i64>,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO
            notification (type, user_idx, game_idx, post_idx)
        VALUES
            ($1, $2, $3, $4)"#,
    )
    .bind(kind.type_code())
    .bind(user_idx)
    .bind(game_idx)
    .bind(post_idx)
    .execute(conn)
    .await?;

    Ok(())
}

/// Insert one row per recipient in a single bulk statement, atomic as a set.
pub async fn notify_all_within(
    conn: &mut PgConnection,
    kind: NotificationKind,
    user_idxs: &[i64],
    game_idx: i64,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO
            notification (type, game_idx, post_idx, user_idx)
        SELECT
            $1, $2, NULL,
            UNNEST($3::bigint[])"#,
    )
    .bind(kind.type_code())
    .bind(game_idx)
    .bind(user_idxs.to_vec())
    .execute(conn)
    .await?;

    Ok(())
}

/// Fire-and-forget dispatch on a fresh pooled connection. Failures are
/// logged and swallowed; must not be used where the row has to roll back
/// with an enclosing transaction.
pub fn notify_detached(
    pool: &PgPool,
    kind: NotificationKind,
    user_idx: i64,
    game_idx: Option<i64>,
    post_idx: Option<i64>,
) {
    let pool = pool.clone();
    tokio::spawn(async move {
        let result = sqlx::query(
            r#"
            INSERT INTO
                notification (type, user_idx, game_idx, post_idx)
            VALUES
                ($1, $2, $3, $4)"#,
        )
        .bind(kind.type_code())
        .bind(user_idx)
        .bind(game_idx)
        .bind(post_idx)
        .execute(&pool)
        .await;

        if let Err(err) = result {
            tracing::error!("detached notification dispatch failed: {}", err);
        }
    });
}
