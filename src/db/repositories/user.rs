//! User repository
//!
//! Database operations for accounts, including the password-reset token
//! columns.

use crate::config::DatabaseDriver;
use crate::db::{mysql, sqlite, DynDatabasePool};
use crate::models::{CustomerStatus, CustomerTier, User};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Fails with a unique violation if the email exists.
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by (already normalized) email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// List every user, oldest first
    async fn list(&self) -> Result<Vec<User>>;

    /// Grant or revoke admin rights. Returns false if no such user.
    async fn set_admin_flag(&self, id: i64, is_admin: bool) -> Result<bool>;

    async fn set_tier(&self, id: i64, tier: CustomerTier) -> Result<bool>;

    async fn set_status(&self, id: i64, status: CustomerStatus) -> Result<bool>;

    async fn set_notes(&self, id: i64, notes: Option<&str>) -> Result<bool>;

    /// Record a successful login
    async fn touch_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<()>;

    /// Store a pending reset token, replacing any previous one
    async fn set_reset_token(&self, id: i64, token: &str, expires: DateTime<Utc>) -> Result<()>;

    /// Atomically swap in a new password hash for the holder of an unexpired
    /// reset token and clear the token.
    ///
    /// Returns false when no row matched (unknown, expired or already used).
    async fn consume_reset_token(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool>;

    /// Delete a user. Returns false if nothing was deleted.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Count all users
    async fn count(&self) -> Result<i64>;

    /// Count users with the admin flag set
    async fn count_admins(&self) -> Result<i64>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_user_sqlite(sqlite(&self.pool)?, user).await,
            DatabaseDriver::Mysql => create_user_mysql(mysql(&self.pool)?, user).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_user_by_id_sqlite(sqlite(&self.pool)?, id).await,
            DatabaseDriver::Mysql => get_user_by_id_mysql(mysql(&self.pool)?, id).await,
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_user_by_email_sqlite(sqlite(&self.pool)?, email).await,
            DatabaseDriver::Mysql => get_user_by_email_mysql(mysql(&self.pool)?, email).await,
        }
    }

    async fn list(&self) -> Result<Vec<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_users_sqlite(sqlite(&self.pool)?).await,
            DatabaseDriver::Mysql => list_users_mysql(mysql(&self.pool)?).await,
        }
    }

    async fn set_admin_flag(&self, id: i64, is_admin: bool) -> Result<bool> {
        self.update_column("UPDATE users SET is_admin = ?, updated_at = ? WHERE id = ?", is_admin, id)
            .await
    }

    async fn set_tier(&self, id: i64, tier: CustomerTier) -> Result<bool> {
        self.update_column(
            "UPDATE users SET customer_tier = ?, updated_at = ? WHERE id = ?",
            tier.as_str(),
            id,
        )
        .await
    }

    async fn set_status(&self, id: i64, status: CustomerStatus) -> Result<bool> {
        self.update_column(
            "UPDATE users SET customer_status = ?, updated_at = ? WHERE id = ?",
            status.as_str(),
            id,
        )
        .await
    }

    async fn set_notes(&self, id: i64, notes: Option<&str>) -> Result<bool> {
        self.update_column("UPDATE users SET admin_notes = ?, updated_at = ? WHERE id = ?", notes, id)
            .await
    }

    async fn touch_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let sql = "UPDATE users SET last_login = ?, updated_at = ? WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(at)
                    .bind(at)
                    .bind(id)
                    .execute(sqlite(&self.pool)?)
                    .await
                    .context("Failed to update last login")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(at)
                    .bind(at)
                    .bind(id)
                    .execute(mysql(&self.pool)?)
                    .await
                    .context("Failed to update last login")?;
            }
        }
        Ok(())
    }

    async fn set_reset_token(&self, id: i64, token: &str, expires: DateTime<Utc>) -> Result<()> {
        let sql = "UPDATE users SET reset_token = ?, reset_token_expires = ?, updated_at = ? WHERE id = ?";
        let now = Utc::now();
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(token)
                    .bind(expires)
                    .bind(now)
                    .bind(id)
                    .execute(sqlite(&self.pool)?)
                    .await
                    .context("Failed to store reset token")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(token)
                    .bind(expires)
                    .bind(now)
                    .bind(id)
                    .execute(mysql(&self.pool)?)
                    .await
                    .context("Failed to store reset token")?;
            }
        }
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let sql = r#"
            UPDATE users
            SET password_hash = ?, reset_token = NULL, reset_token_expires = NULL, updated_at = ?
            WHERE reset_token = ? AND reset_token_expires > ?
        "#;
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(password_hash)
                .bind(now)
                .bind(token)
                .bind(now)
                .execute(sqlite(&self.pool)?)
                .await
                .context("Failed to consume reset token")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(password_hash)
                .bind(now)
                .bind(token)
                .bind(now)
                .execute(mysql(&self.pool)?)
                .await
                .context("Failed to consume reset token")?
                .rows_affected(),
        };
        Ok(affected == 1)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query("DELETE FROM users WHERE id = ?")
                .bind(id)
                .execute(sqlite(&self.pool)?)
                .await
                .context("Failed to delete user")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query("DELETE FROM users WHERE id = ?")
                .bind(id)
                .execute(mysql(&self.pool)?)
                .await
                .context("Failed to delete user")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn count(&self) -> Result<i64> {
        self.count_where("SELECT COUNT(*) AS count FROM users").await
    }

    async fn count_admins(&self) -> Result<i64> {
        self.count_where("SELECT COUNT(*) AS count FROM users WHERE is_admin = TRUE")
            .await
    }
}

impl SqlxUserRepository {
    /// Run a single-column `UPDATE ... SET <col> = ?, updated_at = ? WHERE id = ?`.
    ///
    /// Only the named column is written, so concurrent writes to other
    /// columns (a password reset, a login) are never overwritten.
    async fn update_column<'q, T>(&self, sql: &'q str, value: T, id: i64) -> Result<bool>
    where
        T: 'q
            + Send
            + sqlx::Encode<'q, sqlx::Sqlite>
            + sqlx::Type<sqlx::Sqlite>
            + sqlx::Encode<'q, sqlx::MySql>
            + sqlx::Type<sqlx::MySql>,
    {
        let now = Utc::now();
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(value)
                .bind(now)
                .bind(id)
                .execute(sqlite(&self.pool)?)
                .await
                .context("Failed to update user")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(value)
                .bind(now)
                .bind(id)
                .execute(mysql(&self.pool)?)
                .await
                .context("Failed to update user")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn count_where(&self, sql: &str) -> Result<i64> {
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .fetch_one(sqlite(&self.pool)?)
                .await
                .context("Failed to count users")?
                .get("count"),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .fetch_one(mysql(&self.pool)?)
                .await
                .context("Failed to count users")?
                .get("count"),
        };
        Ok(count)
    }
}

const SELECT_USER: &str = r#"
    SELECT id, email, password_hash, first_name, last_name, is_admin, customer_tier,
           customer_status, admin_notes, last_login, reset_token, reset_token_expires,
           created_at, updated_at
    FROM users
"#;

const INSERT_USER: &str = r#"
    INSERT INTO users (email, password_hash, first_name, last_name, is_admin, customer_tier,
                       customer_status, admin_notes, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_USER)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_admin)
        .bind(user.customer_tier.as_str())
        .bind(user.customer_status.as_str())
        .bind(&user.admin_notes)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..user.clone()
    })
}

async fn get_user_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_USER))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    row.as_ref().map(row_to_user_sqlite).transpose()
}

async fn get_user_by_email_sqlite(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("{} WHERE email = ?", SELECT_USER))
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by email")?;

    row.as_ref().map(row_to_user_sqlite).transpose()
}

async fn list_users_sqlite(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query(&format!("{} ORDER BY id", SELECT_USER))
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;

    rows.iter().map(row_to_user_sqlite).collect()
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let tier: String = row.get("customer_tier");
    let status: String = row.get("customer_status");

    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        is_admin: row.get("is_admin"),
        customer_tier: CustomerTier::from_str(&tier)?,
        customer_status: CustomerStatus::from_str(&status)?,
        admin_notes: row.get("admin_notes"),
        last_login: row.get("last_login"),
        reset_token: row.get("reset_token"),
        reset_token_expires: row.get("reset_token_expires"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_USER)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_admin)
        .bind(user.customer_tier.as_str())
        .bind(user.customer_status.as_str())
        .bind(&user.admin_notes)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..user.clone()
    })
}

async fn get_user_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_USER))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    row.as_ref().map(row_to_user_mysql).transpose()
}

async fn get_user_by_email_mysql(pool: &MySqlPool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("{} WHERE email = ?", SELECT_USER))
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by email")?;

    row.as_ref().map(row_to_user_mysql).transpose()
}

async fn list_users_mysql(pool: &MySqlPool) -> Result<Vec<User>> {
    let rows = sqlx::query(&format!("{} ORDER BY id", SELECT_USER))
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;

    rows.iter().map(row_to_user_mysql).collect()
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    let tier: String = row.get("customer_tier");
    let status: String = row.get("customer_status");

    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        is_admin: row.get("is_admin"),
        customer_tier: CustomerTier::from_str(&tier)?,
        customer_status: CustomerStatus::from_str(&status)?,
        admin_notes: row.get("admin_notes"),
        last_login: row.get("last_login"),
        reset_token: row.get("reset_token"),
        reset_token_expires: row.get("reset_token_expires"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
