//! Public blog endpoints
//!
//! - GET /api/blog/articles - Published articles, newest first
//! - GET /api/blog/articles/{slug} - One published article

use axum::{extract::State, routing::get, Json, Router};

use crate::api::middleware::{ApiError, ApiPath, AppState};
use crate::models::Article;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/articles", get(list_articles))
        .route("/articles/{slug}", get(get_article))
}

async fn list_articles(State(state): State<AppState>) -> Result<Json<Vec<Article>>, ApiError> {
    Ok(Json(state.article_service.list_published().await?))
}

/// Drafts answer 404 exactly like unknown slugs
async fn get_article(
    State(state): State<AppState>,
    ApiPath(slug): ApiPath<String>,
) -> Result<Json<Article>, ApiError> {
    Ok(Json(state.article_service.get_published_by_slug(&slug).await?))
}
