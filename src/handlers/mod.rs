use std::sync::Arc;

use sqlx::PgPool;

use crate::oauth;

pub mod account;
pub mod admin;
pub mod comment;
pub mod game;

/// Shared handler state: the store handle plus the external identity
/// provider, both built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub provider: Arc<dyn oauth::Provider>,
}

impl AppState {
    pub fn new(pool: PgPool, provider: Arc<dyn oauth::Provider>) -> Self {
        Self { pool, provider }
    }
}
