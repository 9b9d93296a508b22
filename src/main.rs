use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::{middleware as axum_middleware, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use arcadia_api::handlers::AppState;
use arcadia_api::{config, database, middleware, oauth};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, SECRET_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let app_config = config::config();
    tracing::info!("Starting Arcadia API in {:?} mode", app_config.environment);

    let pool = database::connect()
        .await
        .unwrap_or_else(|e| panic!("failed to connect to database: {}", e));

    let state = AppState::new(pool, Arc::new(oauth::HttpProvider::from_config()));
    let app = app(state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Arcadia API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        .merge(user_routes())
        .merge(admin_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use arcadia_api::handlers::account;

    Router::new()
        .route("/account", post(account::register))
        .route("/account/auth", post(account::login))
        .route("/account/auth/oauth", get(account::oauth_callback))
}

fn user_routes() -> Router<AppState> {
    use arcadia_api::handlers::{account, comment, game};

    Router::new()
        .route("/account/info", put(account::update_info))
        .route("/account/me", delete(account::withdraw))
        .route("/game/request", post(game::create_request))
        .route("/game/:game_idx/wiki", put(game::revise_wiki))
        .route("/comment", post(comment::create_comment))
        .route_layer(axum_middleware::from_fn(middleware::require_auth))
}

fn admin_routes() -> Router<AppState> {
    use arcadia_api::handlers::admin;

    Router::new()
        .route("/admin/game", post(admin::approve_game))
        .route("/admin/request/:request_idx", delete(admin::deny_game))
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Arcadia API",
            "version": version,
            "description": "Game community platform API built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "account": "/account, /account/auth, /account/auth/oauth (public)",
                "profile": "/account/info, /account/me (authenticated)",
                "game": "/game/request, /game/:game_idx/wiki (authenticated)",
                "comment": "/comment (authenticated)",
                "admin": "/admin/game, /admin/request/:request_idx (admin only)",
            }
        }
    }))
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::health_check(&state.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
