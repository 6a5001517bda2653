//! Article repository
//!
//! Database operations for blog articles.

use crate::config::DatabaseDriver;
use crate::db::{mysql, sqlite, DynDatabasePool};
use crate::models::Article;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Article repository trait
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Insert a new article. Fails with a unique violation if the slug exists.
    async fn create(&self, article: &Article) -> Result<Article>;

    /// Get article by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Article>>;

    /// Get article by slug, regardless of publication state
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Article>>;

    /// List all articles including drafts, newest first
    async fn list(&self) -> Result<Vec<Article>>;

    /// List published articles, newest first
    async fn list_published(&self) -> Result<Vec<Article>>;

    /// Write back every mutable column of `article`
    async fn update(&self, article: &Article) -> Result<Article>;

    /// Delete an article. Returns false if nothing was deleted.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Count all articles
    async fn count(&self) -> Result<i64>;

    /// Count published articles
    async fn count_published(&self) -> Result<i64>;
}

/// SQLx-based article repository implementation
pub struct SqlxArticleRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleRepository {
    /// Create a new SQLx article repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(pool))
    }
}

const SELECT_ARTICLE: &str = r#"
    SELECT id, title, slug, content, excerpt, featured_image, published, created_at, updated_at
    FROM blog_articles
"#;

const NEWEST_FIRST: &str = "ORDER BY created_at DESC, id DESC";

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn create(&self, article: &Article) -> Result<Article> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_article_sqlite(sqlite(&self.pool)?, article).await,
            DatabaseDriver::Mysql => create_article_mysql(mysql(&self.pool)?, article).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        let sql = format!("{} WHERE id = ?", SELECT_ARTICLE);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(sqlite(&self.pool)?)
                    .await
                    .context("Failed to get article by ID")?;
                row.as_ref().map(row_to_article_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(mysql(&self.pool)?)
                    .await
                    .context("Failed to get article by ID")?;
                row.as_ref().map(row_to_article_mysql).transpose()
            }
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        let sql = format!("{} WHERE slug = ?", SELECT_ARTICLE);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(slug)
                    .fetch_optional(sqlite(&self.pool)?)
                    .await
                    .context("Failed to get article by slug")?;
                row.as_ref().map(row_to_article_sqlite).transpose()
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(slug)
                    .fetch_optional(mysql(&self.pool)?)
                    .await
                    .context("Failed to get article by slug")?;
                row.as_ref().map(row_to_article_mysql).transpose()
            }
        }
    }

    async fn list(&self) -> Result<Vec<Article>> {
        self.fetch_all(&format!("{} {}", SELECT_ARTICLE, NEWEST_FIRST))
            .await
    }

    async fn list_published(&self) -> Result<Vec<Article>> {
        self.fetch_all(&format!(
            "{} WHERE published = TRUE {}",
            SELECT_ARTICLE, NEWEST_FIRST
        ))
        .await
    }

    async fn update(&self, article: &Article) -> Result<Article> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_article_sqlite(sqlite(&self.pool)?, article).await,
            DatabaseDriver::Mysql => update_article_mysql(mysql(&self.pool)?, article).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query("DELETE FROM blog_articles WHERE id = ?")
                .bind(id)
                .execute(sqlite(&self.pool)?)
                .await
                .context("Failed to delete article")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query("DELETE FROM blog_articles WHERE id = ?")
                .bind(id)
                .execute(mysql(&self.pool)?)
                .await
                .context("Failed to delete article")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn count(&self) -> Result<i64> {
        self.count_where("SELECT COUNT(*) AS count FROM blog_articles")
            .await
    }

    async fn count_published(&self) -> Result<i64> {
        self.count_where("SELECT COUNT(*) AS count FROM blog_articles WHERE published = TRUE")
            .await
    }
}

impl SqlxArticleRepository {
    async fn fetch_all(&self, sql: &str) -> Result<Vec<Article>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .fetch_all(sqlite(&self.pool)?)
                .await
                .context("Failed to list articles")?
                .iter()
                .map(row_to_article_sqlite)
                .collect(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .fetch_all(mysql(&self.pool)?)
                .await
                .context("Failed to list articles")?
                .iter()
                .map(row_to_article_mysql)
                .collect(),
        }
    }

    async fn count_where(&self, sql: &str) -> Result<i64> {
        let count: i64 = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .fetch_one(sqlite(&self.pool)?)
                .await
                .context("Failed to count articles")?
                .get("count"),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .fetch_one(mysql(&self.pool)?)
                .await
                .context("Failed to count articles")?
                .get("count"),
        };
        Ok(count)
    }
}

const INSERT_ARTICLE: &str = r#"
    INSERT INTO blog_articles (title, slug, content, excerpt, featured_image, published, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?)
"#;

const UPDATE_ARTICLE: &str = r#"
    UPDATE blog_articles
    SET title = ?, slug = ?, content = ?, excerpt = ?, featured_image = ?, published = ?, updated_at = ?
    WHERE id = ?
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_article_sqlite(pool: &SqlitePool, article: &Article) -> Result<Article> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_ARTICLE)
        .bind(&article.title)
        .bind(&article.slug)
        .bind(&article.content)
        .bind(&article.excerpt)
        .bind(&article.featured_image)
        .bind(article.published)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create article")?;

    Ok(Article {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..article.clone()
    })
}

async fn update_article_sqlite(pool: &SqlitePool, article: &Article) -> Result<Article> {
    let now = Utc::now();

    sqlx::query(UPDATE_ARTICLE)
        .bind(&article.title)
        .bind(&article.slug)
        .bind(&article.content)
        .bind(&article.excerpt)
        .bind(&article.featured_image)
        .bind(article.published)
        .bind(now)
        .bind(article.id)
        .execute(pool)
        .await
        .context("Failed to update article")?;

    Ok(Article {
        updated_at: now,
        ..article.clone()
    })
}

fn row_to_article_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Article> {
    Ok(Article {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        content: row.try_get("content")?,
        excerpt: row.try_get("excerpt")?,
        featured_image: row.try_get("featured_image")?,
        published: row.try_get("published")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_article_mysql(pool: &MySqlPool, article: &Article) -> Result<Article> {
    let now = Utc::now();

    let result = sqlx::query(INSERT_ARTICLE)
        .bind(&article.title)
        .bind(&article.slug)
        .bind(&article.content)
        .bind(&article.excerpt)
        .bind(&article.featured_image)
        .bind(article.published)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create article")?;

    Ok(Article {
        id: result.last_insert_id() as i64,
        created_at: now,
        updated_at: now,
        ..article.clone()
    })
}

async fn update_article_mysql(pool: &MySqlPool, article: &Article) -> Result<Article> {
    let now = Utc::now();

    sqlx::query(UPDATE_ARTICLE)
        .bind(&article.title)
        .bind(&article.slug)
        .bind(&article.content)
        .bind(&article.excerpt)
        .bind(&article.featured_image)
        .bind(article.published)
        .bind(now)
        .bind(article.id)
        .execute(pool)
        .await
        .context("Failed to update article")?;

    Ok(Article {
        updated_at: now,
        ..article.clone()
    })
}

fn row_to_article_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Article> {
    Ok(Article {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        content: row.try_get("content")?,
        excerpt: row.try_get("excerpt")?,
        featured_image: row.try_get("featured_image")?,
        published: row.try_get("published")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
