//! Article service
//!
//! Blog article management: validation, slug uniqueness, publishing, and
//! the public read paths that only ever expose published articles.

use crate::db::is_unique_violation;
use crate::db::repositories::ArticleRepository;
use crate::models::{Article, CreateArticleInput, UpdateArticleInput};
use anyhow::Context;
use std::sync::Arc;

/// Error types for article service operations
#[derive(Debug, thiserror::Error)]
pub enum ArticleServiceError {
    /// Article not found (or not published, on public paths)
    #[error("Article not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Duplicate slug
    #[error("Article slug already exists: {0}")]
    DuplicateSlug(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Article service for managing blog articles
pub struct ArticleService {
    repo: Arc<dyn ArticleRepository>,
}

impl ArticleService {
    pub fn new(repo: Arc<dyn ArticleRepository>) -> Self {
        Self { repo }
    }

    /// Create an article.
    ///
    /// # Errors
    ///
    /// - `ValidationError` for an empty title or content, or a malformed slug
    /// - `DuplicateSlug` if another article already uses the slug
    pub async fn create(&self, input: CreateArticleInput) -> Result<Article, ArticleServiceError> {
        let input = CreateArticleInput {
            title: input.title.trim().to_string(),
            slug: input.slug.trim().to_string(),
            ..input
        };
        validate_title(&input.title)?;
        validate_slug(&input.slug)?;
        validate_content(&input.content)?;

        self.ensure_slug_free(&input.slug, None).await?;

        let article = Article::from_input(input);
        let created = self
            .repo
            .create(&article)
            .await
            .map_err(|e| map_write_error(e, &article.slug))?;

        tracing::info!("Article created: {} (id {})", created.slug, created.id);
        Ok(created)
    }

    /// Get article by ID regardless of publication state
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Article>, ArticleServiceError> {
        let article = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get article by ID")?;
        Ok(article)
    }

    /// Get article by ID or fail with `NotFound`
    pub async fn get_existing(&self, id: i64) -> Result<Article, ArticleServiceError> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| ArticleServiceError::NotFound(id.to_string()))
    }

    /// Public lookup: drafts are reported as not found
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<Article, ArticleServiceError> {
        self.repo
            .get_by_slug(slug)
            .await
            .context("Failed to get article by slug")?
            .filter(|article| article.published)
            .ok_or_else(|| ArticleServiceError::NotFound(slug.to_string()))
    }

    /// All articles including drafts, newest first
    pub async fn list(&self) -> Result<Vec<Article>, ArticleServiceError> {
        Ok(self.repo.list().await?)
    }

    /// Published articles only, newest first
    pub async fn list_published(&self) -> Result<Vec<Article>, ArticleServiceError> {
        Ok(self.repo.list_published().await?)
    }

    /// Partially update an article.
    ///
    /// Blank title, slug or content values are treated as "not provided".
    pub async fn update(
        &self,
        id: i64,
        input: UpdateArticleInput,
    ) -> Result<Article, ArticleServiceError> {
        let mut article = self.get_existing(id).await?;

        let input = UpdateArticleInput {
            title: non_blank(input.title),
            slug: non_blank(input.slug),
            content: input.content.filter(|c| !c.trim().is_empty()),
            ..input
        };

        if let Some(slug) = &input.slug {
            validate_slug(slug)?;
            if *slug != article.slug {
                self.ensure_slug_free(slug, Some(id)).await?;
            }
        }

        if !input.has_changes() {
            return Ok(article);
        }

        input.apply_to(&mut article);
        self.repo
            .update(&article)
            .await
            .map_err(|e| map_write_error(e, &article.slug))
    }

    /// Publish or unpublish an article
    pub async fn set_published(
        &self,
        id: i64,
        published: bool,
    ) -> Result<Article, ArticleServiceError> {
        self.update(id, UpdateArticleInput::new().with_published(published))
            .await
    }

    /// Delete an article
    pub async fn delete(&self, id: i64) -> Result<(), ArticleServiceError> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .context("Failed to delete article")?;

        if !deleted {
            return Err(ArticleServiceError::NotFound(id.to_string()));
        }
        tracing::info!("Article {} deleted", id);
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, ArticleServiceError> {
        Ok(self.repo.count().await?)
    }

    pub async fn count_published(&self) -> Result<i64, ArticleServiceError> {
        Ok(self.repo.count_published().await?)
    }

    async fn ensure_slug_free(
        &self,
        slug: &str,
        except_id: Option<i64>,
    ) -> Result<(), ArticleServiceError> {
        let existing = self
            .repo
            .get_by_slug(slug)
            .await
            .context("Failed to check slug")?;

        match existing {
            Some(article) if Some(article.id) != except_id => {
                Err(ArticleServiceError::DuplicateSlug(slug.to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// A unique violation on insert/update can only come from the slug column
fn map_write_error(e: anyhow::Error, slug: &str) -> ArticleServiceError {
    if is_unique_violation(&e) {
        ArticleServiceError::DuplicateSlug(slug.to_string())
    } else {
        ArticleServiceError::InternalError(e)
    }
}

/// Lowercase ASCII letters and digits in dash-separated groups, e.g.
/// `capsule-wardrobe` or `seasoncolortrends2025`.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.split('-').all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        })
}

fn validate_title(title: &str) -> Result<(), ArticleServiceError> {
    if title.is_empty() {
        return Err(ArticleServiceError::ValidationError(
            "Title cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_slug(slug: &str) -> Result<(), ArticleServiceError> {
    if !is_valid_slug(slug) {
        return Err(ArticleServiceError::ValidationError(
            "Slug must contain only lowercase letters, digits and single dashes".to_string(),
        ));
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<(), ArticleServiceError> {
    if content.trim().is_empty() {
        return Err(ArticleServiceError::ValidationError(
            "Content cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
