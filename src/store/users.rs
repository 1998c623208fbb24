use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};

use super::{unique_violation, RepositoryError};
use crate::db::models::{NewUser, User};
use crate::state::DbPool;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<User>, RepositoryError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;

    /// Insert a user. Username/email collisions come back as `Conflict`.
    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError>;
}

pub struct SqliteUserRepository {
    pool: DbPool,
}

impl SqliteUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str = "id, username, email, password, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn registration_conflict(err: rusqlite::Error) -> RepositoryError {
    let conflict = unique_violation(&err).and_then(|msg| {
        if msg.contains("users.email") {
            Some("Email already registered")
        } else if msg.contains("users.username") {
            Some("Username already taken")
        } else {
            None
        }
    });

    match conflict {
        Some(reason) => RepositoryError::Conflict(reason.to_string()),
        None => RepositoryError::Sql(err),
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn get(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
                params![username],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<User, RepositoryError> {
        let conn = self.pool.get()?;
        conn.query_row(
            &format!(
                "INSERT INTO users (username, email, password) VALUES (?1, ?2, ?3)
                 RETURNING {USER_COLUMNS}"
            ),
            params![user.username, user.email, user.password_hash],
            user_from_row,
        )
        .map_err(registration_conflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::migrated_pool;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn insert_then_get_returns_same_user() {
        let repo = SqliteUserRepository::new(migrated_pool());
        let created = repo.insert(new_user("alice", "a@x.com")).await.unwrap();

        let fetched = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.username, "alice");
        assert_eq!(fetched.email, "a@x.com");
        assert!(!fetched.created_at.is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() {
        let repo = SqliteUserRepository::new(migrated_pool());
        repo.insert(new_user("alice", "a@x.com")).await.unwrap();

        let err = repo.insert(new_user("bob", "a@x.com")).await.unwrap_err();
        match err {
            RepositoryError::Conflict(msg) => assert_eq!(msg, "Email already registered"),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_username_is_conflict() {
        let repo = SqliteUserRepository::new(migrated_pool());
        repo.insert(new_user("alice", "a@x.com")).await.unwrap();

        let err = repo.insert(new_user("alice", "b@x.com")).await.unwrap_err();
        match err {
            RepositoryError::Conflict(msg) => assert_eq!(msg, "Username already taken"),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn find_by_username_misses_unknown_user() {
        let repo = SqliteUserRepository::new(migrated_pool());
        assert!(repo.find_by_username("ghost").await.unwrap().is_none());
    }
}
