//! Mailing list service

use crate::db::is_unique_violation;
use crate::db::repositories::SubscriberRepository;
use crate::models::{SubscribeInput, Subscriber};
use crate::services::user::{is_valid_email, normalize_email};
use anyhow::Context;
use std::sync::Arc;

/// Error types for subscriber service operations
#[derive(Debug, thiserror::Error)]
pub enum SubscriberServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Email is not on the list
    #[error("Subscriber not found")]
    NotFound,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Result of a subscribe call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// A new row was created
    Created,
    /// The email was already on the list; it is subscribed again
    AlreadySubscribed,
}

impl SubscribeOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            SubscribeOutcome::Created => "Subscribed successfully",
            SubscribeOutcome::AlreadySubscribed => "Already subscribed",
        }
    }
}

pub struct SubscriberService {
    repo: Arc<dyn SubscriberRepository>,
}

impl SubscriberService {
    pub fn new(repo: Arc<dyn SubscriberRepository>) -> Self {
        Self { repo }
    }

    /// Add an email to the list. Idempotent: an existing row is flipped back
    /// to subscribed instead of duplicated.
    pub async fn subscribe(
        &self,
        input: SubscribeInput,
    ) -> Result<SubscribeOutcome, SubscriberServiceError> {
        let email = normalize_email(&input.email);
        if !is_valid_email(&email) {
            return Err(SubscriberServiceError::ValidationError(
                "Invalid email format".to_string(),
            ));
        }

        if self
            .repo
            .get_by_email(&email)
            .await
            .context("Failed to check subscriber")?
            .is_some()
        {
            self.repo.set_subscribed(&email, true).await?;
            return Ok(SubscribeOutcome::AlreadySubscribed);
        }

        let row = Subscriber::from_input(SubscribeInput { email, ..input });
        match self.repo.create(&row).await {
            Ok(created) => {
                tracing::info!("New subscriber {}", created.id);
                Ok(SubscribeOutcome::Created)
            }
            // Lost a race with an identical request
            Err(e) if is_unique_violation(&e) => {
                self.repo.set_subscribed(&row.email, true).await?;
                Ok(SubscribeOutcome::AlreadySubscribed)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Mark an email as unsubscribed
    pub async fn unsubscribe(&self, email: &str) -> Result<(), SubscriberServiceError> {
        let email = normalize_email(email);
        if !self.repo.set_subscribed(&email, false).await? {
            return Err(SubscriberServiceError::NotFound);
        }
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Subscriber>, SubscriberServiceError> {
        Ok(self.repo.list().await?)
    }

    /// Number of rows currently subscribed
    pub async fn count_subscribed(&self) -> Result<i64, SubscriberServiceError> {
        Ok(self.repo.count_subscribed().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxSubscriberRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_service() -> SubscriberService {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        SubscriberService::new(SqlxSubscriberRepository::boxed(pool))
    }

    #[tokio::test]
    async fn test_subscribe_twice_keeps_one_subscribed_row() {
        let service = setup_test_service().await;

        let first = service.subscribe(SubscribeInput::new("s@x.com")).await.unwrap();
        let second = service
            .subscribe(SubscribeInput::new(" S@X.com "))
            .await
            .unwrap();

        assert_eq!(first, SubscribeOutcome::Created);
        assert_eq!(second, SubscribeOutcome::AlreadySubscribed);

        let rows = service.list().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].subscribed);
        assert_eq!(service.count_subscribed().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_resubscribe_after_unsubscribe() {
        let service = setup_test_service().await;
        service.subscribe(SubscribeInput::new("u@x.com")).await.unwrap();

        service.unsubscribe("u@x.com").await.unwrap();
        assert_eq!(service.count_subscribed().await.unwrap(), 0);

        let outcome = service.subscribe(SubscribeInput::new("u@x.com")).await.unwrap();
        assert_eq!(outcome, SubscribeOutcome::AlreadySubscribed);
        assert_eq!(service.count_subscribed().await.unwrap(), 1);
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_unknown_and_invalid_email() {
        let service = setup_test_service().await;

        assert!(matches!(
            service.unsubscribe("ghost@x.com").await,
            Err(SubscriberServiceError::NotFound)
        ));
        assert!(matches!(
            service.subscribe(SubscribeInput::new("not-an-email")).await,
            Err(SubscriberServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_contact_details_stored() {
        let service = setup_test_service().await;
        let input = SubscribeInput {
            email: "c@x.com".to_string(),
            name: Some("Cleo".to_string()),
            phone: Some("555-0100".to_string()),
            message: Some("Hello".to_string()),
        };
        service.subscribe(input).await.unwrap();

        let row = service.list().await.unwrap().remove(0);
        assert_eq!(row.name.as_deref(), Some("Cleo"));
        assert_eq!(row.phone.as_deref(), Some("555-0100"));
        assert_eq!(row.message.as_deref(), Some("Hello"));
    }
}
