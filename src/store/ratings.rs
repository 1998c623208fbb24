use async_trait::async_trait;
use rusqlite::{params, Row};

use super::{unique_violation, RepositoryError};
use crate::db::models::Rating;
use crate::state::DbPool;

#[async_trait]
pub trait RatingRepository: Send + Sync {
    /// Plain insert. A second rating by the same user on the same post
    /// violates the (user_id, post_id) key and comes back as `Conflict`.
    async fn insert(&self, user_id: i64, post_id: i64, rating: i64)
        -> Result<Rating, RepositoryError>;

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Rating>, RepositoryError>;
}

pub struct SqliteRatingRepository {
    pool: DbPool,
}

impl SqliteRatingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn rating_from_row(row: &Row<'_>) -> rusqlite::Result<Rating> {
    Ok(Rating {
        user_id: row.get(0)?,
        post_id: row.get(1)?,
        rating: row.get(2)?,
        created_at: row.get(3)?,
    })
}

#[async_trait]
impl RatingRepository for SqliteRatingRepository {
    async fn insert(
        &self,
        user_id: i64,
        post_id: i64,
        rating: i64,
    ) -> Result<Rating, RepositoryError> {
        let conn = self.pool.get()?;
        conn.query_row(
            "INSERT INTO ratings (user_id, post_id, rating) VALUES (?1, ?2, ?3)
             RETURNING user_id, post_id, rating, created_at",
            params![user_id, post_id, rating],
            rating_from_row,
        )
        .map_err(|e| {
            if unique_violation(&e).is_some() {
                RepositoryError::Conflict("Post already rated by this user".to_string())
            } else {
                RepositoryError::Sql(e)
            }
        })
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Rating>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, post_id, rating, created_at FROM ratings
             WHERE post_id = ?1 ORDER BY created_at, user_id",
        )?;
        let ratings = stmt
            .query_map(params![post_id], rating_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ratings)
    }
}
