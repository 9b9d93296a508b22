pub mod account;
pub mod admin;
pub mod comment;
pub mod game;
pub mod notification;
pub mod uniqueness;

pub use account::AccountService;
pub use admin::AdminService;
pub use comment::CommentService;
pub use game::GameService;
pub use notification::NotificationKind;

use thiserror::Error;

/// Failure kinds shared by every workflow. A workflow either commits all of
/// its writes or reports one of these with everything rolled back.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    /// An expected row was not found or not produced
    #[error("{0}")]
    NoContent(String),

    #[error(transparent)]
    Auth(#[from] crate::auth::AuthError),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

// Duplicate-key failures at insert time are Conflict, not fatal: the oracle
// check narrows the race window but the unique index is the backstop.
impl From<sqlx::Error> for WorkflowError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return WorkflowError::Conflict("duplicate key".to_string());
            }
        }
        WorkflowError::Database(err)
    }
}
