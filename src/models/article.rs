//! Blog article model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Blog article entity.
///
/// Serializes with snake_case keys, which is also the public JSON shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    /// URL-friendly slug (unique)
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    /// Only published articles are visible on the public blog
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Build an unsaved article from creation input
    pub fn from_input(input: CreateArticleInput) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by database
            title: input.title,
            slug: input.slug,
            content: input.content,
            excerpt: input.excerpt,
            featured_image: input.featured_image,
            published: input.published,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a new article
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateArticleInput {
    pub title: String,
    pub slug: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub published: bool,
}

impl CreateArticleInput {
    pub fn new(
        title: impl Into<String>,
        slug: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            slug: slug.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = Some(excerpt.into());
        self
    }

    pub fn with_featured_image(mut self, url: impl Into<String>) -> Self {
        self.featured_image = Some(url.into());
        self
    }

    pub fn published(mut self, published: bool) -> Self {
        self.published = published;
        self
    }
}

/// Partial update of an article. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateArticleInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub published: Option<bool>,
}

impl UpdateArticleInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_published(mut self, published: bool) -> Self {
        self.published = Some(published);
        self
    }

    /// Apply the set fields onto an existing article
    pub fn apply_to(self, article: &mut Article) {
        if let Some(title) = self.title {
            article.title = title;
        }
        if let Some(slug) = self.slug {
            article.slug = slug;
        }
        if let Some(content) = self.content {
            article.content = content;
        }
        if let Some(excerpt) = self.excerpt {
            article.excerpt = Some(excerpt);
        }
        if let Some(featured_image) = self.featured_image {
            article.featured_image = Some(featured_image);
        }
        if let Some(published) = self.published {
            article.published = published;
        }
    }

    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.slug.is_some()
            || self.content.is_some()
            || self.excerpt.is_some()
            || self.featured_image.is_some()
            || self.published.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_input() {
        let article = Article::from_input(
            CreateArticleInput::new("Title", "title", "Body")
                .with_excerpt("Short")
                .published(true),
        );

        assert_eq!(article.id, 0);
        assert_eq!(article.slug, "title");
        assert_eq!(article.excerpt.as_deref(), Some("Short"));
        assert!(article.featured_image.is_none());
        assert!(article.published);
    }

    #[test]
    fn test_create_input_published_defaults_to_false() {
        let input: CreateArticleInput =
            serde_json::from_str(r#"{"title":"T","slug":"t","content":"C"}"#).unwrap();
        assert!(!input.published);
        assert!(input.excerpt.is_none());
    }

    #[test]
    fn test_update_apply_to_only_touches_set_fields() {
        let mut article = Article::from_input(CreateArticleInput::new("Old", "old", "Body"));
        let update = UpdateArticleInput::new().with_title("New").with_published(true);
        assert!(update.has_changes());

        update.apply_to(&mut article);

        assert_eq!(article.title, "New");
        assert_eq!(article.slug, "old");
        assert_eq!(article.content, "Body");
        assert!(article.published);
        assert!(!UpdateArticleInput::new().has_changes());
    }
}
