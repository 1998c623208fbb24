// Repository pattern - isolates all database side effects
pub mod accounts;
pub mod posts;
pub mod ratings;
pub mod users;

use std::sync::Arc;

use rusqlite::ErrorCode;
use thiserror::Error;

use crate::state::DbPool;

pub use accounts::{AccountRepository, SqliteAccountRepository};
pub use posts::{PostRepository, SqlitePostRepository};
pub use ratings::{RatingRepository, SqliteRatingRepository};
pub use users::{SqliteUserRepository, UserRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Message of a UNIQUE / PRIMARY KEY violation, e.g.
/// `UNIQUE constraint failed: users.email`. Other errors yield `None`.
pub(crate) fn unique_violation(err: &rusqlite::Error) -> Option<&str> {
    match err {
        rusqlite::Error::SqliteFailure(e, Some(msg))
            if e.code == ErrorCode::ConstraintViolation
                && msg.starts_with("UNIQUE constraint failed") =>
        {
            Some(msg.as_str())
        }
        _ => None,
    }
}

/// Handle to every repository, constructed once and shared via app state.
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub ratings: Arc<dyn RatingRepository>,
    pub accounts: Arc<dyn AccountRepository>,
}

impl Store {
    pub fn sqlite(pool: DbPool) -> Self {
        Self {
            users: Arc::new(SqliteUserRepository::new(pool.clone())),
            posts: Arc::new(SqlitePostRepository::new(pool.clone())),
            ratings: Arc::new(SqliteRatingRepository::new(pool.clone())),
            accounts: Arc::new(SqliteAccountRepository::new(pool)),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::db;

    pub fn migrated_pool() -> DbPool {
        let pool = db::create_memory_pool().unwrap();
        db::run_migrations(&pool).unwrap();
        pool
    }

    pub fn insert_user(pool: &DbPool, username: &str) -> i64 {
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO users (username, email, password) VALUES (?1, ?2, 'hash')",
            rusqlite::params![username, format!("{username}@example.com")],
        )
        .unwrap();
        conn.last_insert_rowid()
    }
}
