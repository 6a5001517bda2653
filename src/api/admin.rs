//! Admin API endpoints
//!
//! Everything here sits behind `require_auth` + `require_admin`:
//! - Dashboard statistics
//! - Account management (role, tier, status, notes, deletion)
//! - Article management including drafts
//! - Mailing list export

use axum::{
    extract::State,
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, ApiJson, ApiPath, AppState, AuthenticatedUser};
use crate::api::responses::{AdminUserDetail, AdminUserSummary, ArticleSummary, MessageResponse};
use crate::models::{Article, CreateArticleInput, Subscriber, UpdateArticleInput};

/// Dashboard counters
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_users: i64,
    pub total_articles: i64,
    pub published_articles: i64,
    pub draft_articles: i64,
    pub total_admins: i64,
    pub total_subscribers: i64,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub success: bool,
    pub users: Vec<AdminUserSummary>,
}

#[derive(Debug, Serialize)]
pub struct UserDetailResponse {
    pub success: bool,
    pub user: AdminUserDetail,
}

#[derive(Debug, Serialize)]
pub struct ArticleListResponse {
    pub success: bool,
    pub articles: Vec<ArticleSummary>,
}

#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    pub success: bool,
    pub message: String,
    pub article: Article,
}

#[derive(Debug, Serialize)]
pub struct SubscriberListResponse {
    pub success: bool,
    pub count: usize,
    pub subscribers: Vec<Subscriber>,
}

#[derive(Debug, Deserialize)]
pub struct TierRequest {
    pub tier: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub published: bool,
}

/// Build the admin router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats", get(get_stats))
        // Users
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user).delete(delete_user))
        .route("/users/{id}/promote", post(promote_user))
        .route("/users/{id}/demote", post(demote_user))
        .route("/users/{id}/tier", put(update_tier))
        .route("/users/{id}/status", put(update_status))
        .route("/users/{id}/notes", put(update_notes))
        // Articles
        .route("/articles", get(list_articles).post(create_article))
        .route(
            "/articles/{id}",
            get(get_article).put(update_article).delete(delete_article),
        )
        .route("/articles/{id}/publish", patch(publish_article))
        // Mailing list
        .route("/subscribers", get(list_subscribers))
}

// ============================================================================
// Dashboard
// ============================================================================

/// GET /api/admin/stats
async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let total_users = state.user_service.count().await?;
    let total_admins = state.user_service.count_admins().await?;
    let total_articles = state.article_service.count().await?;
    let published_articles = state.article_service.count_published().await?;
    let total_subscribers = state.subscriber_service.count_subscribed().await?;

    Ok(Json(StatsResponse {
        total_users,
        total_articles,
        published_articles,
        draft_articles: total_articles - published_articles,
        total_admins,
        total_subscribers,
    }))
}

// ============================================================================
// Users
// ============================================================================

/// GET /api/admin/users
async fn list_users(State(state): State<AppState>) -> Result<Json<UserListResponse>, ApiError> {
    let users = state.user_service.list().await?;
    Ok(Json(UserListResponse {
        success: true,
        users: users.iter().map(AdminUserSummary::from).collect(),
    }))
}

/// GET /api/admin/users/{id}
async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<UserDetailResponse>, ApiError> {
    let user = state.user_service.get_existing(id).await?;
    Ok(Json(UserDetailResponse {
        success: true,
        user: (&user).into(),
    }))
}

/// DELETE /api/admin/users/{id}
async fn delete_user(
    State(state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.user_service.delete(admin.id, id).await?;
    Ok(Json(MessageResponse::ok("User deleted successfully")))
}

/// POST /api/admin/users/{id}/promote
async fn promote_user(
    State(state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.user_service.set_admin(admin.id, id, true).await?;
    Ok(Json(MessageResponse::ok("User promoted to admin")))
}

/// POST /api/admin/users/{id}/demote
async fn demote_user(
    State(state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.user_service.set_admin(admin.id, id, false).await?;
    Ok(Json(MessageResponse::ok("User demoted from admin")))
}

/// PUT /api/admin/users/{id}/tier
async fn update_tier(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<TierRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.user_service.set_tier(id, &body.tier).await?;
    Ok(Json(MessageResponse::ok("User tier updated")))
}

/// PUT /api/admin/users/{id}/status
async fn update_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<StatusRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.user_service.set_status(id, &body.status).await?;
    Ok(Json(MessageResponse::ok("User status updated")))
}

/// PUT /api/admin/users/{id}/notes
async fn update_notes(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<NotesRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.user_service.set_notes(id, body.notes).await?;
    Ok(Json(MessageResponse::ok("Admin notes updated")))
}

// ============================================================================
// Articles
// ============================================================================

/// GET /api/admin/articles
async fn list_articles(
    State(state): State<AppState>,
) -> Result<Json<ArticleListResponse>, ApiError> {
    let articles = state.article_service.list().await?;
    Ok(Json(ArticleListResponse {
        success: true,
        articles: articles.iter().map(ArticleSummary::from).collect(),
    }))
}

fn article_response(article: Article, message: &str) -> Json<ArticleResponse> {
    Json(ArticleResponse {
        success: true,
        message: message.to_string(),
        article,
    })
}

/// POST /api/admin/articles
async fn create_article(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateArticleInput>,
) -> Result<Json<ArticleResponse>, ApiError> {
    let article = state.article_service.create(body).await?;
    Ok(article_response(article, "Article created successfully"))
}

/// GET /api/admin/articles/{id}
async fn get_article(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<ArticleResponse>, ApiError> {
    let article = state.article_service.get_existing(id).await?;
    Ok(article_response(article, "Article retrieved"))
}

/// PUT /api/admin/articles/{id}
async fn update_article(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateArticleInput>,
) -> Result<Json<ArticleResponse>, ApiError> {
    let article = state.article_service.update(id, body).await?;
    Ok(article_response(article, "Article updated successfully"))
}

/// PATCH /api/admin/articles/{id}/publish
async fn publish_article(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<PublishRequest>,
) -> Result<Json<ArticleResponse>, ApiError> {
    let article = state
        .article_service
        .set_published(id, body.published)
        .await?;
    let message = if article.published {
        "Article published"
    } else {
        "Article unpublished"
    };
    Ok(article_response(article, message))
}

/// DELETE /api/admin/articles/{id}
async fn delete_article(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.article_service.delete(id).await?;
    Ok(Json(MessageResponse::ok("Article deleted successfully")))
}

// ============================================================================
// Mailing list
// ============================================================================

/// GET /api/admin/subscribers
async fn list_subscribers(
    State(state): State<AppState>,
) -> Result<Json<SubscriberListResponse>, ApiError> {
    let subscribers = state.subscriber_service.list().await?;
    Ok(Json(SubscriberListResponse {
        success: true,
        count: subscribers.len(),
        subscribers,
    }))
}
