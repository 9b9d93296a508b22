use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::{distributions::Alphanumeric, Rng};
use sqlx::{PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use crate::auth::{self, Claims};
use crate::database::models::User;
use crate::oauth::ExternalIdentity;
use crate::services::{uniqueness, WorkflowError};

/// Generated nicknames are fixed-length alphanumeric; a handful of random
/// candidates, then a UUID-derived fallback so the loop always terminates.
const NICKNAME_LEN: usize = 20;
const NICKNAME_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone)]
pub struct RegisterParams {
    pub login_id: String,
    pub password: String,
    pub nickname: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone)]
pub struct OauthOutcome {
    pub token: String,
    pub user_idx: i64,
    pub email: String,
}

pub struct AccountService {
    pool: PgPool,
}

impl AccountService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Local signup: one user row plus one credential row, or nothing.
    pub async fn register(&self, params: RegisterParams) -> Result<i64, WorkflowError> {
        let mut tx = self.pool.begin().await.map_err(WorkflowError::from)?;

        if uniqueness::login_id_exists(&mut tx, &params.login_id).await? {
            return Err(WorkflowError::Conflict("existing id".to_string()));
        }
        if uniqueness::nickname_owner(&mut tx, &params.nickname)
            .await?
            .is_some()
        {
            return Err(WorkflowError::Conflict("existing nickname".to_string()));
        }
        if uniqueness::email_owner(&mut tx, &params.email)
            .await?
            .is_some()
        {
            return Err(WorkflowError::Conflict("existing email".to_string()));
        }

        let pw_hash = hash_password(&params.password)?;

        let user_idx: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO
                "user" (nickname, email, is_admin)
            VALUES
                ($1, $2, false)
            RETURNING
                idx"#,
        )
        .bind(&params.nickname)
        .bind(&params.email)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| WorkflowError::NoContent("signup failed".to_string()))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO
                account_local (user_idx, login_id, pw_hash)
            VALUES
                ($1, $2, $3)"#,
        )
        .bind(user_idx)
        .bind(&params.login_id)
        .bind(&pw_hash)
        .execute(&mut *tx)
        .await?;
        if inserted.rows_affected() == 0 {
            return Err(WorkflowError::NoContent("signup failed".to_string()));
        }

        tx.commit().await.map_err(WorkflowError::from)?;
        debug!("registered user {}", user_idx);

        Ok(user_idx)
    }

    /// Verify a local credential and issue a bearer token.
    pub async fn login(&self, login_id: &str, password: &str) -> Result<LoginOutcome, WorkflowError> {
        #[derive(sqlx::FromRow)]
        struct CredentialRow {
            pw_hash: String,
            #[sqlx(flatten)]
            user: User,
        }

        let row: Option<CredentialRow> = sqlx::query_as(
            r#"
            SELECT
                al.pw_hash,
                u.idx, u.nickname, u.email, u.is_admin, u.created_at, u.deleted_at
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
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or_else(|| WorkflowError::Unauthorized("invalid login".to_string()))?;

        if !verify_password(password, &row.pw_hash)? {
            return Err(WorkflowError::Unauthorized("invalid password".to_string()));
        }

        let token = auth::sign_token(&Claims::new(row.user.idx, row.user.is_admin))?;
        Ok(LoginOutcome {
            token,
            user: row.user,
        })
    }

    /// Signup through the external identity provider. The code exchange has
    /// already happened; this consumes its result.
    pub async fn oauth_register(
        &self,
        identity: ExternalIdentity,
    ) -> Result<OauthOutcome, WorkflowError> {
        let mut tx = self.pool.begin().await.map_err(WorkflowError::from)?;

        if uniqueness::oauth_key_exists(&mut tx, &identity.oauth_key).await? {
            return Err(WorkflowError::Conflict("existing oauth account".to_string()));
        }
        if uniqueness::email_owner(&mut tx, &identity.email)
            .await?
            .is_some()
        {
            return Err(WorkflowError::Conflict("existing email".to_string()));
        }

        let nickname = pick_free_nickname(&mut tx).await?;

        let user_idx: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO
                "user" (nickname, email, is_admin)
            VALUES
                ($1, $2, false)
            RETURNING
                idx"#,
        )
        .bind(&nickname)
        .bind(&identity.email)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| WorkflowError::NoContent("oauth signup failed".to_string()))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO
                account_oauth (user_idx, oauth_key)
            VALUES
                ($1, $2)"#,
        )
        .bind(user_idx)
        .bind(&identity.oauth_key)
        .execute(&mut *tx)
        .await?;
        if inserted.rows_affected() == 0 {
            return Err(WorkflowError::NoContent("oauth signup failed".to_string()));
        }

        // Read the linked pair back so the issued claim reflects what was
        // actually committed
        let linked: Option<(i64, bool)> = sqlx::query_as(
            r#"
            SELECT
                u.idx, u.is_admin
            FROM
                account_oauth ao
            JOIN
                "user" u ON ao.user_idx = u.idx
            WHERE
                ao.oauth_key = $1
            AND
                u.deleted_at IS NULL"#,
        )
        .bind(&identity.oauth_key)
        .fetch_optional(&mut *tx)
        .await?;
        let (user_idx, is_admin) =
            linked.ok_or_else(|| WorkflowError::NoContent("oauth signup failed".to_string()))?;

        tx.commit().await.map_err(WorkflowError::from)?;
        debug!("registered oauth user {}", user_idx);

        let token = auth::sign_token(&Claims::new(user_idx, is_admin))?;
        Ok(OauthOutcome {
            token,
            user_idx,
            email: identity.email,
        })
    }

    /// Change own nickname and email. A value held by a different live user
    /// is a conflict; holding it oneself already is fine.
    pub async fn update_profile(
        &self,
        user_idx: i64,
        nickname: &str,
        email: &str,
    ) -> Result<(), WorkflowError> {
        let mut tx = self.pool.begin().await.map_err(WorkflowError::from)?;

        let me: Option<User> = sqlx::query_as(
            r#"
            SELECT
                idx, nickname, email, is_admin, created_at, deleted_at
            FROM
                "user"
            WHERE
                idx = $1
            AND
                deleted_at IS NULL"#,
        )
        .bind(user_idx)
        .fetch_optional(&mut *tx)
        .await?;
        let me = me.ok_or_else(|| WorkflowError::NoContent("no such user".to_string()))?;

        if let Some(owner) = uniqueness::nickname_owner(&mut tx, nickname).await? {
            if owner != me.idx {
                return Err(WorkflowError::Conflict("existing nickname".to_string()));
            }
        }
        if let Some(owner) = uniqueness::email_owner(&mut tx, email).await? {
            if owner != me.idx {
                return Err(WorkflowError::Conflict("existing email".to_string()));
            }
        }

        let updated = sqlx::query(
            r#"
            UPDATE
                "user"
            SET
                nickname = $2,
                email = $3
            WHERE
                idx = $1"#,
        )
        .bind(user_idx)
        .bind(nickname)
        .bind(email)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(WorkflowError::NoContent("profile update failed".to_string()));
        }

        tx.commit().await.map_err(WorkflowError::from)?;
        Ok(())
    }

    /// Soft-delete the account; the row stays, uniqueness scopes release.
    pub async fn withdraw(&self, user_idx: i64) -> Result<(), WorkflowError> {
        let deleted = sqlx::query(
            r#"
            UPDATE
                "user"
            SET
                deleted_at = now()
            WHERE
                idx = $1
            AND
                deleted_at IS NULL"#,
        )
        .bind(user_idx)
        .execute(&self.pool)
        .await?;

        if deleted.rows_affected() == 0 {
            return Err(WorkflowError::NoContent("withdrawal failed".to_string()));
        }
        Ok(())
    }
}

/// Find a nickname no live user holds. Bounded: a fixed number of random
/// candidates, then a UUID-derived fallback. The partial unique index still
/// catches a racing writer at insert time.
async fn pick_free_nickname(conn: &mut PgConnection) -> Result<String, WorkflowError> {
    for _ in 0..NICKNAME_ATTEMPTS {
        let candidate = random_nickname(NICKNAME_LEN);
        if uniqueness::nickname_owner(conn, &candidate).await?.is_none() {
            return Ok(candidate);
        }
    }
    Ok(fallback_nickname())
}

fn random_nickname(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn fallback_nickname() -> String {
    let mut uuid = Uuid::new_v4().simple().to_string();
    uuid.truncate(NICKNAME_LEN);
    uuid
}

fn hash_password(password: &str) -> Result<String, WorkflowError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| WorkflowError::Internal(format!("password hashing failed: {}", e)))
}

fn verify_password(password: &str, pw_hash: &str) -> Result<bool, WorkflowError> {
    let parsed = PasswordHash::new(pw_hash)
        .map_err(|e| WorkflowError::Internal(format!("invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
