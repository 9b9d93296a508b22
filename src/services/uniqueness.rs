//! Read-only existence predicates over live (non-soft-deleted) rows.
//!
//! Callers pairing a check with a dependent write must run both on the same
//! transaction, which is why every predicate takes `&mut PgConnection`
//! instead of a pool. The partial unique indexes remain the final backstop
//! for the remaining race window.

use sqlx::PgConnection;

pub async fn login_id_exists(conn: &mut PgConnection, login_id: &str) -> sqlx::Result<bool> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT
            COUNT(*)
        FROM
            account_local al
        JOIN
            "user" u ON al.user_idx = u.idx
        WHERE
            al.login_id = $1
        AND
            u.deleted_at IS NULL"#,
    )
    .bind(login_id)
    .fetch_one(conn)
    .await?;

    Ok(count > 0)
}

/// Live owner of a nickname, if any. Returning the owner lets callers tell
/// "taken by someone else" apart from "already mine".
pub async fn nickname_owner(conn: &mut PgConnection, nickname: &str) -> sqlx::Result<Option<i64>> {
    sqlx::query_scalar(
        r#"
        SELECT
            idx
        FROM
            "user"
        WHERE
            nickname = $1
        AND
            deleted_at IS NULL"#,
    )
    .bind(nickname)
    .fetch_optional(conn)
    .await
}

/// Live owner of an email address, if any.
pub async fn email_owner(conn: &mut PgConnection, email: &str) -> sqlx::Result<Option<i64>> {
    sqlx::query_scalar(
        r#"
        SELECT
            idx
        FROM
            "user"
        WHERE
            email = $1
        AND
            deleted_at IS NULL"#,
    )
    .bind(email)
    .fetch_optional(conn)
    .await
}

pub async fn oauth_key_exists(conn: &mut PgConnection, oauth_key: &str) -> sqlx::Result<bool> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT
            COUNT(*)
        FROM
            account_oauth ao
        JOIN
            "user" u ON ao.user_idx = u.idx
        WHERE
            ao.oauth_key = $1
        AND
            u.deleted_at IS NULL"#,
    )
    .bind(oauth_key)
    .fetch_one(conn)
    .await?;

    Ok(count > 0)
}

/// True when a live game already carries either localized title.
pub async fn game_title_exists(
    conn: &mut PgConnection,
    title_kor: &str,
    title_eng: &str,
) -> sqlx::Result<bool> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT
            COUNT(*)
        FROM
            game
        WHERE
            (title_kor = $1 OR title_eng = $2)
        AND
            deleted_at IS NULL"#,
    )
    .bind(title_kor)
    .bind(title_eng)
    .fetch_one(conn)
    .await?;

    Ok(count > 0)
}
