//! Shared API response types
//!
//! Response structures used across several endpoints so every handler
//! produces the same JSON shapes.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Article, User};

/// `{"success": true, "message": ...}`
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

// ============================================================================
// User Response Types
// ============================================================================

/// Public view of an account, as returned by the auth endpoints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: bool,
    pub created_at: String,
    pub last_login: Option<String>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_admin: user.is_admin,
            created_at: user.created_at.to_rfc3339(),
            last_login: user.last_login.map(|t| t.to_rfc3339()),
        }
    }
}

/// Row of the admin user list
#[derive(Debug, Serialize)]
pub struct AdminUserSummary {
    pub id: i64,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub customer_tier: String,
    pub customer_status: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for AdminUserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            customer_tier: user.customer_tier.to_string(),
            customer_status: user.customer_status.to_string(),
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

/// Admin detail view: the public fields plus customer management fields
#[derive(Debug, Serialize)]
pub struct AdminUserDetail {
    #[serde(flatten)]
    pub user: UserResponse,
    pub customer_tier: String,
    pub customer_status: String,
    pub admin_notes: Option<String>,
}

impl From<&User> for AdminUserDetail {
    fn from(user: &User) -> Self {
        Self {
            user: user.into(),
            customer_tier: user.customer_tier.to_string(),
            customer_status: user.customer_status.to_string(),
            admin_notes: user.admin_notes.clone(),
        }
    }
}

// ============================================================================
// Article Response Types
// ============================================================================

/// Article row for the admin list (no body)
#[derive(Debug, Serialize)]
pub struct ArticleSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub published: bool,
    pub featured_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Article> for ArticleSummary {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id,
            title: article.title.clone(),
            slug: article.slug.clone(),
            excerpt: article.excerpt.clone(),
            published: article.published,
            featured_image: article.featured_image.clone(),
            created_at: article.created_at,
            updated_at: article.updated_at,
        }
    }
}
