//! Database migrations
//!
//! Schema changes are embedded in the binary as SQL strings, one variant per
//! backend. Applied versions are recorded in a `_migrations` table so running
//! the set again is a no-op.
//!
//! Timestamps are always bound from Rust (`chrono::DateTime<Utc>`) rather than
//! relying on column defaults, so both backends store the same representation.

use anyhow::{Context, Result};
use sqlx::{MySqlPool, Row, SqlitePool};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                first_name VARCHAR(100),
                last_name VARCHAR(100),
                is_admin BOOLEAN NOT NULL DEFAULT 0,
                customer_tier VARCHAR(20) NOT NULL DEFAULT 'free',
                customer_status VARCHAR(20) NOT NULL DEFAULT 'green',
                admin_notes TEXT,
                last_login TIMESTAMP,
                reset_token VARCHAR(64) UNIQUE,
                reset_token_expires TIMESTAMP,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_users_is_admin ON users(is_admin);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                first_name VARCHAR(100),
                last_name VARCHAR(100),
                is_admin BOOLEAN NOT NULL DEFAULT FALSE,
                customer_tier VARCHAR(20) NOT NULL DEFAULT 'free',
                customer_status VARCHAR(20) NOT NULL DEFAULT 'green',
                admin_notes TEXT,
                last_login DATETIME(6) NULL,
                reset_token VARCHAR(64) UNIQUE,
                reset_token_expires DATETIME(6) NULL,
                created_at DATETIME(6) NOT NULL,
                updated_at DATETIME(6) NOT NULL
            );
            CREATE INDEX idx_users_is_admin ON users(is_admin);
        "#,
    },
    Migration {
        version: 2,
        name: "create_blog_articles",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS blog_articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                content TEXT NOT NULL,
                excerpt TEXT,
                featured_image VARCHAR(500),
                published BOOLEAN NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_blog_articles_published ON blog_articles(published);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS blog_articles (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                title VARCHAR(255) NOT NULL,
                slug VARCHAR(255) NOT NULL UNIQUE,
                content LONGTEXT NOT NULL,
                excerpt TEXT,
                featured_image VARCHAR(500),
                published BOOLEAN NOT NULL DEFAULT FALSE,
                created_at DATETIME(6) NOT NULL,
                updated_at DATETIME(6) NOT NULL
            );
            CREATE INDEX idx_blog_articles_published ON blog_articles(published);
        "#,
    },
    Migration {
        version: 3,
        name: "create_email_list",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS email_list (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email VARCHAR(255) NOT NULL UNIQUE,
                name VARCHAR(255),
                phone VARCHAR(50),
                message TEXT,
                subscribed BOOLEAN NOT NULL DEFAULT 1,
                created_at TIMESTAMP NOT NULL,
                updated_at TIMESTAMP NOT NULL
            );
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS email_list (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                email VARCHAR(255) NOT NULL UNIQUE,
                name VARCHAR(255),
                phone VARCHAR(50),
                message TEXT,
                subscribed BOOLEAN NOT NULL DEFAULT TRUE,
                created_at DATETIME(6) NOT NULL,
                updated_at DATETIME(6) NOT NULL
            );
        "#,
    },
];

/// Run all pending migrations.
///
/// Returns the number of migrations applied by this call.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i64> = applied.iter().map(|m| m.version).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&i64::from(migration.version)) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    match pool.driver() {
        DatabaseDriver::Sqlite => get_applied_migrations_sqlite(super::sqlite(pool)?).await,
        DatabaseDriver::Mysql => get_applied_migrations_mysql(super::mysql(pool)?).await,
    }
}

async fn get_applied_migrations_sqlite(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;

    Ok(rows
        .iter()
        .map(|row| MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
        })
        .collect())
}

async fn get_applied_migrations_mysql(pool: &MySqlPool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await
        .context("Failed to read applied migrations")?;

    Ok(rows
        .iter()
        .map(|row| MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
        })
        .collect())
}

async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => apply_migration_sqlite(super::sqlite(pool)?, migration).await,
        DatabaseDriver::Mysql => apply_migration_mysql(super::mysql(pool)?, migration).await,
    }
}

async fn apply_migration_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_sqlite) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

async fn apply_migration_mysql(pool: &MySqlPool, migration: &Migration) -> Result<()> {
    for statement in split_sql_statements(migration.up_mysql) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Shorten SQL for error messages without splitting a UTF-8 character
fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split a migration body on `;`, dropping blank and comment-only chunks
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

/// Number of migrations not yet applied
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    Ok(MIGRATIONS.len().saturating_sub(applied.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use chrono::Utc;

    async fn migrated_pool() -> DynDatabasePool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        pool
    }

    #[tokio::test]
    async fn test_run_migrations_is_idempotent() {
        let pool = create_test_pool().await.unwrap();

        let count = run_migrations(&pool).await.unwrap();
        assert_eq!(count, MIGRATIONS.len());

        let count = run_migrations(&pool).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_pending_count() {
        let pool = create_test_pool().await.unwrap();
        assert_eq!(pending_count(&pool).await.unwrap(), MIGRATIONS.len());

        run_migrations(&pool).await.unwrap();
        assert_eq!(pending_count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_users_email_unique() {
        let pool = migrated_pool().await;
        let sqlite_pool = pool.as_sqlite().unwrap();
        let now = Utc::now();

        let insert = "INSERT INTO users (email, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?)";
        sqlx::query(insert)
            .bind("a@x.com")
            .bind("hash")
            .bind(now)
            .bind(now)
            .execute(sqlite_pool)
            .await
            .expect("Failed to create first user");

        let result = sqlx::query(insert)
            .bind("a@x.com")
            .bind("hash2")
            .bind(now)
            .bind(now)
            .execute(sqlite_pool)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_users_defaults() {
        let pool = migrated_pool().await;
        let sqlite_pool = pool.as_sqlite().unwrap();
        let now = Utc::now();

        sqlx::query("INSERT INTO users (email, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind("d@x.com")
            .bind("hash")
            .bind(now)
            .bind(now)
            .execute(sqlite_pool)
            .await
            .unwrap();

        let row = sqlx::query("SELECT is_admin, customer_tier, customer_status FROM users")
            .fetch_one(sqlite_pool)
            .await
            .unwrap();
        let is_admin: bool = row.get("is_admin");
        let tier: String = row.get("customer_tier");
        let status: String = row.get("customer_status");
        assert!(!is_admin);
        assert_eq!(tier, "free");
        assert_eq!(status, "green");
    }

    #[tokio::test]
    async fn test_blog_slug_and_email_list_unique() {
        let pool = migrated_pool().await;
        let sqlite_pool = pool.as_sqlite().unwrap();
        let now = Utc::now();

        let article = "INSERT INTO blog_articles (title, slug, content, created_at, updated_at) VALUES (?, ?, ?, ?, ?)";
        for expect_ok in [true, false] {
            let result = sqlx::query(article)
                .bind("Title")
                .bind("same-slug")
                .bind("Body")
                .bind(now)
                .bind(now)
                .execute(sqlite_pool)
                .await;
            assert_eq!(result.is_ok(), expect_ok);
        }

        let subscriber =
            "INSERT INTO email_list (email, created_at, updated_at) VALUES (?, ?, ?)";
        for expect_ok in [true, false] {
            let result = sqlx::query(subscriber)
                .bind("s@x.com")
                .bind(now)
                .bind(now)
                .execute(sqlite_pool)
                .await;
            assert_eq!(result.is_ok(), expect_ok);
        }
    }

    #[test]
    fn test_split_sql_statements() {
        let sql = "CREATE TABLE a (id INT); CREATE TABLE b (id INT);";
        assert_eq!(split_sql_statements(sql).len(), 2);

        let sql_with_comments = "-- Comment\nCREATE TABLE a (id INT);\n-- trailing\n";
        assert_eq!(split_sql_statements(sql_with_comments).len(), 1);
    }

    #[test]
    fn test_is_comment_only() {
        assert!(is_comment_only("-- This is a comment"));
        assert!(is_comment_only("-- Line 1\n\n-- Line 2"));
        assert!(!is_comment_only("CREATE TABLE test"));
        assert!(!is_comment_only("-- Comment\nCREATE TABLE test"));
    }

    #[test]
    fn test_truncate_sql() {
        assert_eq!(truncate_sql("SELECT 1"), "SELECT 1");
        let long = "x".repeat(150);
        assert_eq!(truncate_sql(&long).len(), 103);
    }
}
