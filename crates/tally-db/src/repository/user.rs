//! # User Repository
//!
//! Minimal user records: sales reference the user who recorded them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tally_core::UserId;

/// A dashboard user.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Repository for user operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user and returns the generated id.
    ///
    /// Fails with a `Unique` constraint error when the email is taken.
    pub async fn insert(&self, name: &str, email: &str) -> DbResult<UserId> {
        debug!(email, "Inserting user");

        let id = sqlx::query("INSERT INTO users (name, email, created_at) VALUES (?1, ?2, ?3)")
            .bind(name)
            .bind(email)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        Ok(id)
    }

    /// Gets a user by id.
    pub async fn get_by_id(&self, id: UserId) -> DbResult<Option<User>> {
        let user: Option<User> =
            sqlx::query_as("SELECT id, name, email, created_at FROM users WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }

    /// Gets a user by email.
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let user: Option<User> =
            sqlx::query_as("SELECT id, name, email, created_at FROM users WHERE email = ?1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConstraintKind, Database, DbConfig, DbError};

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let id = db.users().insert("Ada", "ada@example.com").await.unwrap();

        let user = db.users().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.email, "ada@example.com");

        let by_email = db.users().get_by_email("ada@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(id));
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users().insert("Ada", "ada@example.com").await.unwrap();

        let err = db.users().insert("Other", "ada@example.com").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Constraint {
                kind: ConstraintKind::Unique,
                ..
            }
        ));
    }
}
