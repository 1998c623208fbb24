use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};

use super::RepositoryError;
use crate::db::models::{average_rating, NewPost, Post, PostPublic, PostUpdate, PublicUser};
use crate::state::DbPool;

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<Post>, RepositoryError>;

    /// Post joined with its owner and rating average.
    async fn get_public(&self, id: i64) -> Result<Option<PostPublic>, RepositoryError>;

    /// Every post, or only those whose title contains `search`, oldest first.
    async fn list_public(&self, search: Option<&str>) -> Result<Vec<PostPublic>, RepositoryError>;

    async fn insert(&self, post: NewPost) -> Result<Post, RepositoryError>;

    /// Apply the fields present in `update`. Returns `None` if the post is gone.
    async fn update(&self, id: i64, update: &PostUpdate) -> Result<Option<Post>, RepositoryError>;

    /// Delete a post and, through the foreign key, its ratings.
    async fn delete(&self, id: i64) -> Result<bool, RepositoryError>;
}

pub struct SqlitePostRepository {
    pool: DbPool,
}

impl SqlitePostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const POST_COLUMNS: &str = "id, title, content, published, owner_id, created_at";

const PUBLIC_SELECT: &str = "
    SELECT p.id, p.title, p.content, p.published, p.created_at,
           u.id, u.username, u.email, u.created_at,
           COALESCE(SUM(r.rating), 0), COUNT(r.rating)
    FROM posts p
    JOIN users u ON u.id = p.owner_id
    LEFT JOIN ratings r ON r.post_id = p.id";

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        published: row.get(3)?,
        owner_id: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn public_from_row(row: &Row<'_>) -> rusqlite::Result<PostPublic> {
    let sum: i64 = row.get(9)?;
    let count: i64 = row.get(10)?;
    Ok(PostPublic {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        published: row.get(3)?,
        created_at: row.get(4)?,
        owner: PublicUser {
            id: row.get(5)?,
            username: row.get(6)?,
            email: row.get(7)?,
            created_at: row.get(8)?,
        },
        average_rating: average_rating(sum, count),
    })
}

#[async_trait]
impl PostRepository for SqlitePostRepository {
    async fn get(&self, id: i64) -> Result<Option<Post>, RepositoryError> {
        let conn = self.pool.get()?;
        let post = conn
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
                params![id],
                post_from_row,
            )
            .optional()?;
        Ok(post)
    }

    async fn get_public(&self, id: i64) -> Result<Option<PostPublic>, RepositoryError> {
        let conn = self.pool.get()?;
        let post = conn
            .query_row(
                &format!("{PUBLIC_SELECT} WHERE p.id = ?1 GROUP BY p.id"),
                params![id],
                public_from_row,
            )
            .optional()?;
        Ok(post)
    }

    async fn list_public(&self, search: Option<&str>) -> Result<Vec<PostPublic>, RepositoryError> {
        let conn = self.pool.get()?;

        // instr() is a case-sensitive substring match, same as the default
        // collation of the title column.
        let posts = match search.filter(|s| !s.is_empty()) {
            Some(term) => {
                let mut stmt = conn.prepare(&format!(
                    "{PUBLIC_SELECT} WHERE instr(p.title, ?1) > 0 GROUP BY p.id ORDER BY p.id"
                ))?;
                let rows = stmt.query_map(params![term], public_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt =
                    conn.prepare(&format!("{PUBLIC_SELECT} GROUP BY p.id ORDER BY p.id"))?;
                let rows = stmt.query_map([], public_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };

        Ok(posts)
    }

    async fn insert(&self, post: NewPost) -> Result<Post, RepositoryError> {
        let conn = self.pool.get()?;
        let post = conn.query_row(
            &format!(
                "INSERT INTO posts (title, content, published, owner_id) VALUES (?1, ?2, ?3, ?4)
                 RETURNING {POST_COLUMNS}"
            ),
            params![post.title, post.content, post.published, post.owner_id],
            post_from_row,
        )?;
        Ok(post)
    }

    async fn update(&self, id: i64, update: &PostUpdate) -> Result<Option<Post>, RepositoryError> {
        let conn = self.pool.get()?;
        let post = conn
            .query_row(
                &format!(
                    "UPDATE posts SET
                        title = COALESCE(?2, title),
                        content = COALESCE(?3, content),
                        published = COALESCE(?4, published)
                     WHERE id = ?1
                     RETURNING {POST_COLUMNS}"
                ),
                params![id, update.title, update.content, update.published],
                post_from_row,
            )
            .optional()?;
        Ok(post)
    }

    async fn delete(&self, id: i64) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let rows = conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }
}
