//! Workflow integration tests. They need a real Postgres database: set
//! TEST_DATABASE_URL to run them, otherwise each test skips. The schema is
//! applied idempotently on every connection and test data is suffixed with
//! random tags, so no cleanup pass is needed.

use anyhow::Result;
use sqlx::{Executor, PgPool};
use uuid::Uuid;

use arcadia_api::database::models::{Comment, Game, GameRequest, History, Notification, Post, User};
use arcadia_api::oauth::ExternalIdentity;
use arcadia_api::services::account::RegisterParams;
use arcadia_api::services::{
    AccountService, AdminService, CommentService, GameService, WorkflowError,
};

async fn test_pool() -> Option<PgPool> {
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("TEST_DATABASE_URL not set; skipping workflow test");
            return None;
        }
    };

    let pool = PgPool::connect(&url).await.expect("connect test database");
    pool.execute(include_str!("../schema.sql"))
        .await
        .expect("apply schema");

    Some(pool)
}

/// Short unique tag so repeated runs never collide on live-scoped uniques
fn tag() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

async fn seed_user(pool: &PgPool, prefix: &str) -> i64 {
    let tag = tag();
    sqlx::query_scalar(
        r#"
        INSERT INTO "user" (nickname, email, is_admin)
        VALUES ($1, $2, false)
        RETURNING idx"#,
    )
    .bind(format!("{}_{}", prefix, &tag[..6]))
    .bind(format!("{}_{}@test.local", prefix, tag))
    .fetch_one(pool)
    .await
    .expect("seed user")
}

async fn seed_request(pool: &PgPool, user_idx: i64, title: &str) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO request (user_idx, title)
        VALUES ($1, $2)
        RETURNING idx"#,
    )
    .bind(user_idx)
    .bind(title)
    .fetch_one(pool)
    .await
    .expect("seed request")
}

async fn seed_game(pool: &PgPool, user_idx: i64, title: &str) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO game (user_idx, title, title_kor, title_eng)
        VALUES ($1, $2, $2, $2)
        RETURNING idx"#,
    )
    .bind(user_idx)
    .bind(title)
    .fetch_one(pool)
    .await
    .expect("seed game")
}

async fn fetch_request(pool: &PgPool, idx: i64) -> GameRequest {
    sqlx::query_as("SELECT * FROM request WHERE idx = $1")
        .bind(idx)
        .fetch_one(pool)
        .await
        .expect("fetch request")
}

async fn notifications_for(pool: &PgPool, user_idx: i64) -> Vec<Notification> {
    sqlx::query_as("SELECT * FROM notification WHERE user_idx = $1 ORDER BY idx")
        .bind(user_idx)
        .fetch_all(pool)
        .await
        .expect("fetch notifications")
}

#[tokio::test]
async fn register_creates_account_and_credential() -> Result<()> {
    let Some(pool) = test_pool().await else { return Ok(()) };
    let service = AccountService::new(pool.clone());
    let tag = tag();

    let user_idx = service
        .register(RegisterParams {
            login_id: format!("id{}", &tag[..6]),
            password: "password1".to_string(),
            nickname: format!("gamer_{}", &tag[..6]),
            email: format!("reg_{}@test.local", tag),
        })
        .await?;

    let user: User = sqlx::query_as(r#"SELECT * FROM "user" WHERE idx = $1"#)
        .bind(user_idx)
        .fetch_one(&pool)
        .await?;
    assert!(user.deleted_at.is_none());
    assert!(!user.is_admin);

    let credentials: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM account_local WHERE user_idx = $1")
            .bind(user_idx)
            .fetch_one(&pool)
            .await?;
    assert_eq!(credentials, 1);

    Ok(())
}

#[tokio::test]
async fn register_conflicts_leave_no_residue() -> Result<()> {
    let Some(pool) = test_pool().await else { return Ok(()) };
    let service = AccountService::new(pool.clone());
    let base = tag();

    let login_id = format!("id{}", &base[..6]);
    let nickname = format!("dup_{}", &base[..6]);
    let email = format!("dup_{}@test.local", base);

    service
        .register(RegisterParams {
            login_id: login_id.clone(),
            password: "password1".to_string(),
            nickname: nickname.clone(),
            email: email.clone(),
        })
        .await?;

    // Same login id, fresh everything else
    let fresh = tag();
    let err = service
        .register(RegisterParams {
            login_id: login_id.clone(),
            password: "password1".to_string(),
            nickname: format!("dup_{}", &fresh[..6]),
            email: format!("dup_{}@test.local", fresh),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Conflict(_)));

    // The failed attempt committed nothing
    let ghosts: i64 = sqlx::query_scalar(
        r#"SELECT COUNT(*) FROM "user" WHERE email = $1 AND deleted_at IS NULL"#,
    )
    .bind(format!("dup_{}@test.local", fresh))
    .fetch_one(&pool)
    .await?;
    assert_eq!(ghosts, 0);

    // Same nickname conflicts too
    let fresh2 = tag();
    let err = service
        .register(RegisterParams {
            login_id: format!("id{}", &fresh2[..6]),
            password: "password1".to_string(),
            nickname: nickname.clone(),
            email: format!("dup_{}@test.local", fresh2),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Conflict(_)));

    // Retrying the rolled-back attempt with corrected input succeeds:
    // nothing from the failures is in the way
    service
        .register(RegisterParams {
            login_id: format!("id{}", &fresh2[..6]),
            password: "password1".to_string(),
            nickname: format!("dup_{}", &fresh2[..6]),
            email: format!("dup_{}@test.local", fresh2),
        })
        .await?;

    Ok(())
}

#[tokio::test]
async fn login_round_trip() -> Result<()> {
    let Some(pool) = test_pool().await else { return Ok(()) };
    let service = AccountService::new(pool.clone());
    let tag = tag();

    let login_id = format!("lg{}", &tag[..6]);
    service
        .register(RegisterParams {
            login_id: login_id.clone(),
            password: "password1".to_string(),
            nickname: format!("login_{}", &tag[..6]),
            email: format!("login_{}@test.local", tag),
        })
        .await?;

    let outcome = service.login(&login_id, "password1").await?;
    assert!(!outcome.token.is_empty());
    assert_eq!(outcome.user.nickname, format!("login_{}", &tag[..6]));

    let err = service.login(&login_id, "wrong-password").await.unwrap_err();
    assert!(matches!(err, WorkflowError::Unauthorized(_)));

    let err = service.login("no-such-id", "password1").await.unwrap_err();
    assert!(matches!(err, WorkflowError::Unauthorized(_)));

    Ok(())
}

#[tokio::test]
async fn oauth_register_links_external_identity() -> Result<()> {
    let Some(pool) = test_pool().await else { return Ok(()) };
    let service = AccountService::new(pool.clone());
    let tag = tag();

    let identity = ExternalIdentity {
        oauth_key: format!("oauth-{}", tag),
        email: format!("oauth_{}@test.local", tag),
    };

    let outcome = service.oauth_register(identity.clone()).await?;
    assert!(!outcome.token.is_empty());

    let linked: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM account_oauth WHERE user_idx = $1 AND oauth_key = $2",
    )
    .bind(outcome.user_idx)
    .bind(&identity.oauth_key)
    .fetch_one(&pool)
    .await?;
    assert_eq!(linked, 1);

    // The generated nickname fits the fixed shape
    let user: User = sqlx::query_as(r#"SELECT * FROM "user" WHERE idx = $1"#)
        .bind(outcome.user_idx)
        .fetch_one(&pool)
        .await?;
    assert_eq!(user.nickname.len(), 20);

    // Linking the same key again is a conflict
    let err = service.oauth_register(identity).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Conflict(_)));

    Ok(())
}

#[tokio::test]
async fn approval_creates_game_post_and_images() -> Result<()> {
    let Some(pool) = test_pool().await else { return Ok(()) };
    let admin_idx = seed_user(&pool, "adm").await;
    let requester_idx = seed_user(&pool, "req").await;
    let title = format!("Frost Keep {}", &tag()[..6]);
    let request_idx = seed_request(&pool, requester_idx, &title).await;

    let service = AdminService::new(pool.clone());
    let game_idx = service
        .approve_game(
            admin_idx,
            approve_params(request_idx, &title, "https://img.test/t.png", "https://img.test/b.png"),
        )
        .await?;

    let game: Game = sqlx::query_as("SELECT * FROM game WHERE idx = $1")
        .bind(game_idx)
        .fetch_one(&pool)
        .await?;
    assert!(game.deleted_at.is_none());
    assert_eq!(game.user_idx, requester_idx);

    let request = fetch_request(&pool, request_idx).await;
    assert!(request.is_confirmed);
    assert!(request.deleted_at.is_some());

    let posts: Vec<Post> = sqlx::query_as("SELECT * FROM post WHERE game_idx = $1")
        .bind(game_idx)
        .fetch_all(&pool)
        .await?;
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].user_idx, admin_idx);

    let images: i64 = sqlx::query_scalar(
        "SELECT
            (SELECT COUNT(*) FROM game_img_thumbnail WHERE game_idx = $1)
          + (SELECT COUNT(*) FROM game_img_banner WHERE game_idx = $1)",
    )
    .bind(game_idx)
    .fetch_one(&pool)
    .await?;
    assert_eq!(images, 2);

    Ok(())
}

#[tokio::test]
async fn approval_title_conflict_leaves_request_pending() -> Result<()> {
    let Some(pool) = test_pool().await else { return Ok(()) };
    let admin_idx = seed_user(&pool, "adm").await;
    let requester_idx = seed_user(&pool, "req").await;

    let taken_title = format!("Taken {}", &tag()[..6]);
    seed_game(&pool, requester_idx, &taken_title).await;

    let request_idx = seed_request(&pool, requester_idx, &taken_title).await;

    let service = AdminService::new(pool.clone());
    let err = service
        .approve_game(
            admin_idx,
            approve_params(request_idx, &taken_title, "https://img.test/t.png", "https://img.test/b.png"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Conflict(_)));

    // The consumption rolled back with everything else
    let request = fetch_request(&pool, request_idx).await;
    assert!(request.deleted_at.is_none());
    assert!(!request.is_confirmed);

    Ok(())
}

#[tokio::test]
async fn approval_rolls_back_as_a_unit_on_late_failure() -> Result<()> {
    let Some(pool) = test_pool().await else { return Ok(()) };
    let admin_idx = seed_user(&pool, "adm").await;
    let requester_idx = seed_user(&pool, "req").await;
    let title = format!("Atomic {}", &tag()[..6]);
    let request_idx = seed_request(&pool, requester_idx, &title).await;

    // Banner path exceeds the column width, so the very last insert fails
    // after game, post and thumbnail were already written
    let oversized = format!("https://img.test/{}", "b".repeat(300));

    let service = AdminService::new(pool.clone());
    let err = service
        .approve_game(
            admin_idx,
            approve_params(request_idx, &title, "https://img.test/t.png", &oversized),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Database(_)));

    let games: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM game WHERE title = $1")
        .bind(&title)
        .fetch_one(&pool)
        .await?;
    assert_eq!(games, 0);

    let request = fetch_request(&pool, request_idx).await;
    assert!(request.deleted_at.is_none());

    // Identical input succeeds once the cause is gone: no residue
    service
        .approve_game(
            admin_idx,
            approve_params(request_idx, &title, "https://img.test/t.png", "https://img.test/b.png"),
        )
        .await?;

    Ok(())
}

#[tokio::test]
async fn denial_tombstones_and_notifies_requester() -> Result<()> {
    let Some(pool) = test_pool().await else { return Ok(()) };
    let requester_idx = seed_user(&pool, "den").await;
    let title = format!("Denied {}", &tag()[..6]);
    let request_idx = seed_request(&pool, requester_idx, &title).await;

    let service = AdminService::new(pool.clone());
    let tombstone_idx = service.deny_game(request_idx).await?;

    // Tombstone is soft-deleted from the start and keeps requester + title
    let tombstone: Game = sqlx::query_as("SELECT * FROM game WHERE idx = $1")
        .bind(tombstone_idx)
        .fetch_one(&pool)
        .await?;
    assert!(tombstone.deleted_at.is_some());
    assert_eq!(tombstone.user_idx, requester_idx);
    assert_eq!(tombstone.title, title);

    let request = fetch_request(&pool, request_idx).await;
    assert!(request.deleted_at.is_some());
    assert!(!request.is_confirmed);

    // Exactly one denial notification, addressed to the requester
    let notifications = notifications_for(&pool, requester_idx).await;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].r#type, Some(3));
    assert_eq!(notifications[0].game_idx, Some(tombstone_idx));

    // A request is terminal: denying it again finds nothing
    let err = service.deny_game(request_idx).await.unwrap_err();
    assert!(matches!(err, WorkflowError::NoContent(_)));

    Ok(())
}

#[tokio::test]
async fn wiki_revision_notifies_each_contributor_once() -> Result<()> {
    let Some(pool) = test_pool().await else { return Ok(()) };
    let owner_idx = seed_user(&pool, "own").await;
    let contributor_a = seed_user(&pool, "wka").await;
    let contributor_b = seed_user(&pool, "wkb").await;
    let editor_idx = seed_user(&pool, "wke").await;
    let game_idx = seed_game(&pool, owner_idx, &format!("Wiki {}", &tag()[..6])).await;

    // Contributor A wrote twice; the fan-out must still hit them once
    for (user, content) in [
        (contributor_a, "first draft"),
        (contributor_a, "typo fix"),
        (contributor_b, "lore section"),
    ] {
        sqlx::query("INSERT INTO history (game_idx, user_idx, content) VALUES ($1, $2, $3)")
            .bind(game_idx)
            .bind(user)
            .bind(content)
            .execute(&pool)
            .await?;
    }

    let service = GameService::new(pool.clone());
    service.revise_wiki(game_idx, editor_idx, "rules rewrite").await?;

    for contributor in [contributor_a, contributor_b] {
        let notifications = notifications_for(&pool, contributor).await;
        assert_eq!(notifications.len(), 1, "one notification per contributor");
        assert_eq!(notifications[0].r#type, Some(2));
        assert_eq!(notifications[0].game_idx, Some(game_idx));
    }

    let revisions: Vec<History> =
        sqlx::query_as("SELECT * FROM history WHERE game_idx = $1 ORDER BY idx")
            .bind(game_idx)
            .fetch_all(&pool)
            .await?;
    assert_eq!(revisions.len(), 4);
    assert_eq!(revisions.last().unwrap().user_idx, editor_idx);

    Ok(())
}

#[tokio::test]
async fn wiki_revision_without_history_is_no_content() -> Result<()> {
    let Some(pool) = test_pool().await else { return Ok(()) };
    let owner_idx = seed_user(&pool, "own").await;
    let editor_idx = seed_user(&pool, "wke").await;
    let game_idx = seed_game(&pool, owner_idx, &format!("Bare {}", &tag()[..6])).await;

    let service = GameService::new(pool.clone());
    let err = service
        .revise_wiki(game_idx, editor_idx, "first!")
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::NoContent(_)));

    // Nothing escaped the rolled-back transaction
    let notifications: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM notification WHERE game_idx = $1")
            .bind(game_idx)
            .fetch_one(&pool)
            .await?;
    assert_eq!(notifications, 0);

    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn comment_notifies_post_owner_after_commit() -> Result<()> {
    let Some(pool) = test_pool().await else { return Ok(()) };
    let owner_idx = seed_user(&pool, "pwn").await;
    let commenter_idx = seed_user(&pool, "cmt").await;
    let game_idx = seed_game(&pool, owner_idx, &format!("Board {}", &tag()[..6])).await;

    let post_idx: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO post (user_idx, game_idx, title, content)
        VALUES ($1, $2, 'strategy thread', 'openers?')
        RETURNING idx"#,
    )
    .bind(owner_idx)
    .bind(game_idx)
    .fetch_one(&pool)
    .await?;

    let service = CommentService::new(pool.clone());
    service
        .create_comment(commenter_idx, post_idx, game_idx, "try the east gate")
        .await?;

    let comments: Vec<Comment> = sqlx::query_as("SELECT * FROM comment WHERE post_idx = $1")
        .bind(post_idx)
        .fetch_all(&pool)
        .await?;
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].user_idx, commenter_idx);

    // The dispatch is detached; give it a moment
    let mut notifications = Vec::new();
    for _ in 0..20 {
        notifications = notifications_for(&pool, owner_idx).await;
        if !notifications.is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].r#type, Some(1));
    assert_eq!(notifications[0].post_idx, Some(post_idx));

    Ok(())
}

#[tokio::test]
async fn game_request_conflicts_with_live_game() -> Result<()> {
    let Some(pool) = test_pool().await else { return Ok(()) };
    let user_idx = seed_user(&pool, "rqr").await;
    let title = format!("Live {}", &tag()[..6]);
    seed_game(&pool, user_idx, &title).await;

    let service = GameService::new(pool.clone());
    let err = service.create_request(user_idx, &title).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Conflict(_)));

    // A fresh title goes through
    service
        .create_request(user_idx, &format!("Fresh {}", &tag()[..6]))
        .await?;

    Ok(())
}

fn approve_params(
    request_idx: i64,
    title: &str,
    thumbnail_url: &str,
    banner_url: &str,
) -> arcadia_api::services::admin::ApproveGameParams {
    arcadia_api::services::admin::ApproveGameParams {
        request_idx,
        title: title.to_string(),
        title_kor: title.to_string(),
        title_eng: title.to_string(),
        thumbnail_url: thumbnail_url.to_string(),
        banner_url: banner_url.to_string(),
    }
}
