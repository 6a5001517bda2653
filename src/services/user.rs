//! User service
//!
//! Account lifecycle and authentication:
//! - registration and login, both answering with a signed token
//! - resolving a token back to a user for the auth middleware
//! - forgot/reset password with single-use reset tokens
//! - admin management of other accounts (role, tier, status, notes)

use crate::config::{AuthConfig, MAX_RESET_TOKEN_TTL_MINUTES};
use crate::db::is_unique_violation;
use crate::db::repositories::UserRepository;
use crate::models::{CustomerStatus, CustomerTier, User};
use crate::services::email::Mailer;
use crate::services::password::{hash_password, verify_password};
use crate::services::token::{generate_reset_token, TokenService};
use anyhow::{anyhow, Context};
use chrono::{Duration, Utc};
use std::str::FromStr;
use std::sync::Arc;

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Credentials or token rejected
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Reset token unknown, expired or already used
    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Email already registered
    #[error("User already exists: {0}")]
    UserExists(String),

    /// No user with the requested id
    #[error("User not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// A user together with a freshly issued token
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// What a forgot-password request produced.
///
/// `reset_link` is only filled when links are configured to be exposed.
#[derive(Debug, Clone, Default)]
pub struct ForgotPasswordOutcome {
    pub reset_link: Option<String>,
}

/// Settings for password reset links
#[derive(Clone)]
pub struct PasswordResetOptions {
    pub ttl: Duration,
    pub url_base: String,
    pub expose_link: bool,
    pub mailer: Mailer,
}

impl PasswordResetOptions {
    pub fn from_config(config: &AuthConfig, mailer: Mailer) -> Self {
        let ttl = if (1..=MAX_RESET_TOKEN_TTL_MINUTES).contains(&config.reset_token_ttl_minutes) {
            Duration::minutes(config.reset_token_ttl_minutes)
        } else {
            tracing::warn!(
                "auth.reset_token_ttl_minutes = {} is out of range; using 60 minutes",
                config.reset_token_ttl_minutes
            );
            Duration::minutes(60)
        };
        Self {
            ttl,
            url_base: config.reset_url_base.clone(),
            expose_link: config.expose_reset_link,
            mailer,
        }
    }
}

impl Default for PasswordResetOptions {
    fn default() -> Self {
        Self::from_config(&AuthConfig::default(), Mailer::disabled())
    }
}

/// User service for managing users and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    tokens: TokenService,
    reset: PasswordResetOptions,
}

impl UserService {
    /// Create a new user service with default reset options
    pub fn new(user_repo: Arc<dyn UserRepository>, tokens: TokenService) -> Self {
        Self::with_reset_options(user_repo, tokens, PasswordResetOptions::default())
    }

    pub fn with_reset_options(
        user_repo: Arc<dyn UserRepository>,
        tokens: TokenService,
        reset: PasswordResetOptions,
    ) -> Self {
        Self {
            user_repo,
            tokens,
            reset,
        }
    }

    /// Token lifetime, used for the cookie `Max-Age`
    pub fn token_ttl(&self) -> Duration {
        self.tokens.ttl()
    }

    /// Register a new, non-admin account and issue its token.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if the email does not look like an address or the
    ///   password is too short
    /// - `UserExists` if the email is already registered, including when a
    ///   concurrent registration wins the insert
    pub async fn register(&self, input: RegisterInput) -> Result<AuthSession, UserServiceError> {
        let email = normalize_email(&input.email);
        validate_email(&email)?;
        validate_password(&input.password)?;

        if self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(
                "Email already registered".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password)?;
        let user = User::new(
            email,
            password_hash,
            clean_optional(input.first_name),
            clean_optional(input.last_name),
        );

        let created = self.user_repo.create(&user).await.map_err(|e| {
            if is_unique_violation(&e) {
                UserServiceError::UserExists("Email already registered".to_string())
            } else {
                UserServiceError::InternalError(e)
            }
        })?;

        tracing::info!("User registered: {} (id {})", created.email, created.id);

        let token = self.tokens.issue(created.id)?;
        Ok(AuthSession {
            user: created,
            token,
        })
    }

    /// Check credentials, record the login time and issue a token.
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, UserServiceError> {
        let invalid = || UserServiceError::AuthenticationError("Invalid email or password".to_string());

        let email = normalize_email(&input.email);
        let mut user = self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to get user by email")?
            .ok_or_else(invalid)?;

        if !verify_password(&input.password, &user.password_hash)? {
            tracing::debug!("Failed login for user {}", user.id);
            return Err(invalid());
        }

        let now = Utc::now();
        self.user_repo
            .touch_last_login(user.id, now)
            .await
            .context("Failed to record login")?;
        user.last_login = Some(now);

        let token = self.tokens.issue(user.id)?;
        Ok(AuthSession { user, token })
    }

    /// Resolve a bearer token to its user.
    ///
    /// Returns `None` for invalid or expired tokens and for tokens whose user
    /// no longer exists.
    pub async fn authenticate(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let Some(user_id) = self.tokens.verify(token) else {
            return Ok(None);
        };

        let user = self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to load token subject")?;
        Ok(user)
    }

    /// Start a password reset.
    ///
    /// The outcome is identical whether or not the email is registered, apart
    /// from the optional development link.
    pub async fn forgot_password(
        &self,
        email: &str,
    ) -> Result<ForgotPasswordOutcome, UserServiceError> {
        let email = normalize_email(email);
        let Some(user) = self
            .user_repo
            .get_by_email(&email)
            .await
            .context("Failed to get user by email")?
        else {
            tracing::debug!("Password reset requested for unknown email");
            return Ok(ForgotPasswordOutcome::default());
        };

        let token = generate_reset_token();
        let expires = Utc::now()
            .checked_add_signed(self.reset.ttl)
            .ok_or_else(|| anyhow!("Reset token expiry out of range"))?;
        self.user_repo
            .set_reset_token(user.id, &token, expires)
            .await
            .context("Failed to store reset token")?;

        let link = format!("{}?token={}", self.reset.url_base, token);

        // Delivery runs detached so the response time does not depend on SMTP.
        if self.reset.mailer.is_enabled() {
            let mailer = self.reset.mailer.clone();
            let (user_id, to, link) = (user.id, user.email.clone(), link.clone());
            tokio::spawn(async move {
                if let Err(e) = mailer.send_reset_link(&to, &link).await {
                    tracing::error!("Failed to mail reset link to user {}: {:#}", user_id, e);
                }
            });
        }

        Ok(ForgotPasswordOutcome {
            reset_link: self.reset.expose_link.then_some(link),
        })
    }

    /// Set a new password using a reset token. The token is consumed.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), UserServiceError> {
        validate_password(new_password)?;
        if token.trim().is_empty() {
            return Err(UserServiceError::InvalidResetToken);
        }

        let password_hash = hash_password(new_password)?;
        let consumed = self
            .user_repo
            .consume_reset_token(token.trim(), &password_hash, Utc::now())
            .await?;

        if !consumed {
            return Err(UserServiceError::InvalidResetToken);
        }
        Ok(())
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?;
        Ok(user)
    }

    /// Get user by ID or fail with `NotFound`
    pub async fn get_existing(&self, id: i64) -> Result<User, UserServiceError> {
        self.get_by_id(id).await?.ok_or(UserServiceError::NotFound)
    }

    pub async fn list(&self) -> Result<Vec<User>, UserServiceError> {
        Ok(self.user_repo.list().await?)
    }

    pub async fn count(&self) -> Result<i64, UserServiceError> {
        Ok(self.user_repo.count().await?)
    }

    pub async fn count_admins(&self) -> Result<i64, UserServiceError> {
        Ok(self.user_repo.count_admins().await?)
    }

    // ========================================================================
    // Admin operations
    // ========================================================================

    /// Delete a user. Admins cannot delete themselves.
    pub async fn delete(&self, acting_user_id: i64, id: i64) -> Result<(), UserServiceError> {
        if acting_user_id == id {
            return Err(UserServiceError::ValidationError(
                "You cannot delete your own account".to_string(),
            ));
        }

        if !self.user_repo.delete(id).await? {
            return Err(UserServiceError::NotFound);
        }
        tracing::info!("User {} deleted by admin {}", id, acting_user_id);
        Ok(())
    }

    /// Grant or revoke admin rights. Admins cannot demote themselves.
    pub async fn set_admin(
        &self,
        acting_user_id: i64,
        id: i64,
        is_admin: bool,
    ) -> Result<User, UserServiceError> {
        if acting_user_id == id && !is_admin {
            return Err(UserServiceError::ValidationError(
                "You cannot remove your own admin rights".to_string(),
            ));
        }

        let found = self.user_repo.set_admin_flag(id, is_admin).await?;
        self.reload_if(found, id).await
    }

    /// Change the customer tier (`free` or `paid`)
    pub async fn set_tier(&self, id: i64, tier: &str) -> Result<User, UserServiceError> {
        let tier = CustomerTier::from_str(tier).map_err(|_| {
            UserServiceError::ValidationError("Invalid tier. Must be 'free' or 'paid'".to_string())
        })?;

        let found = self.user_repo.set_tier(id, tier).await?;
        self.reload_if(found, id).await
    }

    /// Change the customer status
    pub async fn set_status(&self, id: i64, status: &str) -> Result<User, UserServiceError> {
        let status = CustomerStatus::from_str(status).map_err(|_| {
            UserServiceError::ValidationError(
                "Invalid status. Must be 'green', 'yellow', 'red' or 'active_customer'"
                    .to_string(),
            )
        })?;

        let found = self.user_repo.set_status(id, status).await?;
        self.reload_if(found, id).await
    }

    /// Replace the admin notes. Blank notes clear the field.
    pub async fn set_notes(
        &self,
        id: i64,
        notes: Option<String>,
    ) -> Result<User, UserServiceError> {
        let notes = clean_optional(notes);
        let found = self.user_repo.set_notes(id, notes.as_deref()).await?;
        self.reload_if(found, id).await
    }

    /// Return the fresh row after a field update, or `NotFound` if the
    /// update matched nothing.
    async fn reload_if(&self, found: bool, id: i64) -> Result<User, UserServiceError> {
        if !found {
            return Err(UserServiceError::NotFound);
        }
        self.get_existing(id).await
    }
}

/// Trim and lowercase an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Loose address check: one `@`, non-empty local part, dotted domain, no
/// whitespace.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn validate_email(email: &str) -> Result<(), UserServiceError> {
    if !is_valid_email(email) {
        return Err(UserServiceError::ValidationError(
            "Invalid email format".to_string(),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), UserServiceError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(UserServiceError::ValidationError(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Input for user registration
#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl RegisterInput {
    /// Create a new registration input
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }
}

/// Input for user login
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}
