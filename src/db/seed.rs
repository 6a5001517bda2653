//! Bootstrap data
//!
//! Creates the default admin account and a few sample articles. Safe to run
//! on every start: existing data is never touched.

use anyhow::{Context, Result};

use super::repositories::{
    ArticleRepository, SqlxArticleRepository, SqlxUserRepository, UserRepository,
};
use super::DynDatabasePool;
use crate::config::SeedConfig;
use crate::models::{Article, CreateArticleInput, CustomerStatus, CustomerTier, User};
use crate::services::password::hash_password;

const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/800x400";

/// What a seeding run inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub admin_created: bool,
    pub articles_created: usize,
}

/// Insert the admin account if missing and sample articles if the blog is
/// empty. Migrations must already have run.
pub async fn seed(pool: &DynDatabasePool, config: &SeedConfig) -> Result<SeedReport> {
    let users = SqlxUserRepository::new(pool.clone());
    let articles = SqlxArticleRepository::new(pool.clone());
    let mut report = SeedReport::default();

    let admin_email = config.admin_email.trim().to_lowercase();
    if users.get_by_email(&admin_email).await?.is_none() {
        let password_hash =
            hash_password(&config.admin_password).context("Failed to hash admin password")?;
        let mut admin = User::new(
            admin_email.clone(),
            password_hash,
            Some("Admin".to_string()),
            Some("User".to_string()),
        );
        admin.is_admin = true;
        admin.customer_tier = CustomerTier::Paid;
        admin.customer_status = CustomerStatus::ActiveCustomer;

        users
            .create(&admin)
            .await
            .context("Failed to create admin user")?;
        tracing::info!("Admin user created: {}", admin_email);
        report.admin_created = true;
    } else {
        tracing::debug!("Admin user already exists");
    }

    if config.sample_articles && articles.count().await? == 0 {
        for input in sample_articles() {
            articles
                .create(&Article::from_input(input))
                .await
                .context("Failed to create sample article")?;
            report.articles_created += 1;
        }
        tracing::info!("Added {} sample articles", report.articles_created);
    }

    Ok(report)
}

fn sample_articles() -> Vec<CreateArticleInput> {
    vec![
        CreateArticleInput::new(
            "Capsule Wardrobe Essentials",
            "capsule-wardrobe",
            "# Capsule Wardrobe\n\nA capsule wardrobe is a collection of essential, versatile pieces...",
        )
        .with_excerpt("Learn the basics of building a capsule wardrobe"),
        CreateArticleInput::new(
            "2025 Season Color Trends",
            "seasoncolortrends2025",
            "# 2025 Color Trends\n\nThis season brings fresh, vibrant colors to the fashion world...",
        )
        .with_excerpt("Discover the hottest color trends for 2025"),
        CreateArticleInput::new(
            "Mixing Like a Pro",
            "mixinglikeapro",
            "# Mixing Like a Pro\n\nMixing patterns can seem intimidating, but with these tips...",
        )
        .with_excerpt("Master the art of mixing patterns and styles"),
    ]
    .into_iter()
    .map(|input| input.with_featured_image(PLACEHOLDER_IMAGE).published(true))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::services::password::verify_password;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        let config = SeedConfig::default();

        let first = seed(&pool, &config).await.unwrap();
        assert!(first.admin_created);
        assert_eq!(first.articles_created, 3);

        let second = seed(&pool, &config).await.unwrap();
        assert_eq!(second, SeedReport::default());

        let users = SqlxUserRepository::new(pool.clone());
        assert_eq!(users.count().await.unwrap(), 1);

        let admin = users
            .get_by_email("admin@adriastyle.com")
            .await
            .unwrap()
            .unwrap();
        assert!(admin.is_admin);
        assert_eq!(admin.customer_tier, CustomerTier::Paid);
        assert_eq!(admin.customer_status, CustomerStatus::ActiveCustomer);
        assert!(verify_password("Admin123!", &admin.password_hash).unwrap());

        let articles = SqlxArticleRepository::new(pool);
        let published = articles.list_published().await.unwrap();
        assert_eq!(published.len(), 3);
        assert!(published.iter().any(|a| a.slug == "capsule-wardrobe"));
    }

    #[tokio::test]
    async fn test_seed_skips_articles_when_blog_not_empty() {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();

        let articles = SqlxArticleRepository::new(pool.clone());
        articles
            .create(&Article::from_input(CreateArticleInput::new("Mine", "mine", "Body")))
            .await
            .unwrap();

        let report = seed(&pool, &SeedConfig::default()).await.unwrap();
        assert_eq!(report.articles_created, 0);
        assert_eq!(articles.count().await.unwrap(), 1);
    }
}
