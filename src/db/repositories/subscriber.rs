//! Subscriber repository
//!
//! Database operations for the `email_list` table.

use crate::config::DatabaseDriver;
use crate::db::{mysql, sqlite, DynDatabasePool};
use crate::models::Subscriber;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

/// Subscriber repository trait
#[async_trait]
pub trait SubscriberRepository: Send + Sync {
    /// Insert a new row. Fails with a unique violation if the email exists.
    async fn create(&self, subscriber: &Subscriber) -> Result<Subscriber>;

    /// Get a row by (already normalized) email
    async fn get_by_email(&self, email: &str) -> Result<Option<Subscriber>>;

    /// Flip the subscribed flag. Returns false if the email is unknown.
    async fn set_subscribed(&self, email: &str, subscribed: bool) -> Result<bool>;

    /// List every row, newest first
    async fn list(&self) -> Result<Vec<Subscriber>>;

    /// Count rows that are currently subscribed
    async fn count_subscribed(&self) -> Result<i64>;
}

/// SQLx-based subscriber repository implementation
pub struct SqlxSubscriberRepository {
    pool: DynDatabasePool,
}

impl SqlxSubscriberRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SubscriberRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_SUBSCRIBER: &str = r#"
    SELECT id, email, name, phone, message, subscribed, created_at, updated_at
    FROM email_list
"#;

const INSERT_SUBSCRIBER: &str = r#"
    INSERT INTO email_list (email, name, phone, message, subscribed, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?)
"#;

#[async_trait]
impl SubscriberRepository for SqlxSubscriberRepository {
    async fn create(&self, subscriber: &Subscriber) -> Result<Subscriber> {
        let now = Utc::now();
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(INSERT_SUBSCRIBER)
                .bind(&subscriber.email)
                .bind(&subscriber.name)
                .bind(&subscriber.phone)
                .bind(&subscriber.message)
                .bind(subscriber.subscribed)
                .bind(now)
                .bind(now)
                .execute(sqlite(&self.pool)?)
                .await
                .context("Failed to create subscriber")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(INSERT_SUBSCRIBER)
                .bind(&subscriber.email)
                .bind(&subscriber.name)
                .bind(&subscriber.phone)
                .bind(&subscriber.message)
                .bind(subscriber.subscribed)
                .bind(now)
                .bind(now)
                .execute(mysql(&self.pool)?)
                .await
                .context("Failed to create subscriber")?
                .last_insert_id() as i64,
        };

        Ok(Subscriber {
            id,
            created_at: now,
            updated_at: now,
            ..subscriber.clone()
        })
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<Subscriber>> {
        let sql = format!("{} WHERE email = ?", SELECT_SUBSCRIBER);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(email)
                    .fetch_optional(sqlite(&self.pool)?)
                    .await
                    .context("Failed to get subscriber by email")?;
                row.as_ref().map(row_to_subscriber_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(email)
                    .fetch_optional(mysql(&self.pool)?)
                    .await
                    .context("Failed to get subscriber by email")?;
                row.as_ref().map(row_to_subscriber_mysql).transpose()
            }
        }
    }

    async fn set_subscribed(&self, email: &str, subscribed: bool) -> Result<bool> {
        let sql = "UPDATE email_list SET subscribed = ?, updated_at = ? WHERE email = ?";
        let now = Utc::now();
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(subscribed)
                .bind(now)
                .bind(email)
                .execute(sqlite(&self.pool)?)
                .await
                .context("Failed to update subscription")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(subscribed)
                .bind(now)
                .bind(email)
                .execute(mysql(&self.pool)?)
                .await
                .context("Failed to update subscription")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn list(&self) -> Result<Vec<Subscriber>> {
        let sql = format!("{} ORDER BY created_at DESC, id DESC", SELECT_SUBSCRIBER);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .fetch_all(sqlite(&self.pool)?)
                .await
                .context("Failed to list subscribers")?
                .iter()
                .map(row_to_subscriber_sqlite)
                .collect(),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .fetch_all(mysql(&self.pool)?)
                .await
                .context("Failed to list subscribers")?
                .iter()
                .map(row_to_subscriber_mysql)
                .collect(),
        }
    }

    async fn count_subscribed(&self) -> Result<i64> {
        let sql = "SELECT COUNT(*) AS count FROM email_list WHERE subscribed = TRUE";
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .fetch_one(sqlite(&self.pool)?)
                .await
                .context("Failed to count subscribers")?
                .get("count"),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .fetch_one(mysql(&self.pool)?)
                .await
                .context("Failed to count subscribers")?
                .get("count"),
        };
        Ok(count)
    }
}

fn row_to_subscriber_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Subscriber> {
    Ok(Subscriber {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        message: row.try_get("message")?,
        subscribed: row.try_get("subscribed")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_subscriber_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Subscriber> {
    Ok(Subscriber {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        message: row.try_get("message")?,
        subscribed: row.try_get("subscribed")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, is_unique_violation, migrations};
    use crate::models::SubscribeInput;

    async fn setup_test_repo() -> SqlxSubscriberRepository {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        SqlxSubscriberRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_get_and_toggle() {
        let repo = setup_test_repo().await;
        let mut input = SubscribeInput::new("s@x.com");
        input.name = Some("Sam".to_string());

        let created = repo.create(&Subscriber::from_input(input)).await.unwrap();
        assert!(created.id > 0);
        assert!(created.subscribed);

        let fetched = repo.get_by_email("s@x.com").await.unwrap().unwrap();
        assert_eq!(fetched.name.as_deref(), Some("Sam"));
        assert_eq!(repo.count_subscribed().await.unwrap(), 1);

        assert!(repo.set_subscribed("s@x.com", false).await.unwrap());
        assert_eq!(repo.count_subscribed().await.unwrap(), 0);
        assert_eq!(repo.list().await.unwrap().len(), 1);

        assert!(!repo.set_subscribed("nobody@x.com", true).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let repo = setup_test_repo().await;
        let row = Subscriber::from_input(SubscribeInput::new("d@x.com"));
        repo.create(&row).await.unwrap();

        let err = repo.create(&row).await.unwrap_err();
        assert!(is_unique_violation(&err));
    }
}
