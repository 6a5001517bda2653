//! API middleware
//!
//! Contains:
//! - Application state shared by all handlers
//! - The uniform JSON error type
//! - Authentication (token from cookie or `Authorization: Bearer`)
//! - Authorization (admin check)

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path, Request, State,
    },
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::cookie::{extract_cookie, TOKEN_COOKIE};
use crate::models::User;
use crate::services::{
    ArticleService, ArticleServiceError, SubscriberService, SubscriberServiceError, UserService,
    UserServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: crate::db::DynDatabasePool,
    pub user_service: Arc<UserService>,
    pub article_service: Arc<ArticleService>,
    pub subscriber_service: Arc<SubscriberService>,
    /// Adds `Secure` to the token cookie
    pub cookie_secure: bool,
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub success: bool,
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            // Duplicates are reported as bad requests, like validation failures
            "VALIDATION_ERROR" | "CONFLICT" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Log the cause and hide it from the client
    fn internal(cause: &anyhow::Error) -> Self {
        tracing::error!("Request failed: {:#}", cause);
        Self::internal_error("Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<UserServiceError> for ApiError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::AuthenticationError(msg) => ApiError::unauthorized(msg),
            UserServiceError::InvalidResetToken => {
                ApiError::unauthorized("Invalid or expired reset token")
            }
            UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            UserServiceError::UserExists(msg) => ApiError::conflict(msg),
            UserServiceError::NotFound => ApiError::not_found("User not found"),
            UserServiceError::InternalError(cause) => ApiError::internal(&cause),
        }
    }
}

impl From<ArticleServiceError> for ApiError {
    fn from(e: ArticleServiceError) -> Self {
        match e {
            ArticleServiceError::NotFound(_) => ApiError::not_found("Article not found"),
            ArticleServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ArticleServiceError::DuplicateSlug(_) => ApiError::conflict("Slug already exists"),
            ArticleServiceError::InternalError(cause) => ApiError::internal(&cause),
        }
    }
}

impl From<SubscriberServiceError> for ApiError {
    fn from(e: SubscriberServiceError) -> Self {
        match e {
            SubscriberServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            SubscriberServiceError::NotFound => ApiError::not_found("Subscriber not found"),
            SubscriberServiceError::InternalError(cause) => ApiError::internal(&cause),
        }
    }
}

/// JSON body extractor whose rejections use the API error format
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::validation_error(rejection.body_text())),
        }
    }
}

/// Path parameter extractor whose rejections use the API error format
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    Path<T>: FromRequestParts<S, Rejection = PathRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(ApiPath(value)),
            Err(rejection) => Err(ApiError::validation_error(rejection.body_text())),
        }
    }
}

/// Extract the auth token: the `token` cookie first, then a bearer header
pub(crate) fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_cookie(headers, TOKEN_COOKIE).filter(|t| !t.is_empty()) {
        return Some(token);
    }

    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Authentication middleware
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Not authenticated"))?;

    let user = state
        .user_service
        .authenticate(&token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Admin authorization middleware. Must run after [`require_auth`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !user.0.is_admin {
        return Err(ApiError::forbidden("Admin access required"));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_extract_token_from_bearer() {
        let map = headers(&[(header::AUTHORIZATION, "Bearer abc.def.ghi")]);
        assert_eq!(extract_token(&map), Some("abc.def.ghi".to_string()));
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let map = headers(&[(header::COOKIE, "theme=dark; token=from-cookie")]);
        assert_eq!(extract_token(&map), Some("from-cookie".to_string()));
    }

    #[test]
    fn test_extract_token_cookie_priority() {
        let map = headers(&[
            (header::AUTHORIZATION, "Bearer from-header"),
            (header::COOKIE, "token=from-cookie"),
        ]);
        assert_eq!(extract_token(&map), Some("from-cookie".to_string()));
    }

    #[test]
    fn test_extract_token_empty_cookie_falls_back_to_header() {
        let map = headers(&[
            (header::AUTHORIZATION, "Bearer from-header"),
            (header::COOKIE, "token="),
        ]);
        assert_eq!(extract_token(&map), Some("from-header".to_string()));
    }

    #[test]
    fn test_extract_token_none() {
        assert!(extract_token(&HeaderMap::new()).is_none());
        let basic = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
        assert!(extract_token(&basic).is_none());
    }

    #[test]
    fn test_api_error_status_mapping() {
        assert_eq!(ApiError::unauthorized("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::validation_error("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::conflict("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::internal_error("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_api_error_body_shape() {
        let body = serde_json::to_value(ApiError::conflict("Email already registered")).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "CONFLICT");
        assert_eq!(body["error"]["message"], "Email already registered");
    }

    #[test]
    fn test_service_errors_map_to_codes() {
        let e: ApiError = UserServiceError::InvalidResetToken.into();
        assert_eq!(e.error.code, "UNAUTHORIZED");

        let e: ApiError = UserServiceError::UserExists("dup".into()).into();
        assert_eq!(e.error.code, "CONFLICT");

        let e: ApiError = ArticleServiceError::NotFound("slug".into()).into();
        assert_eq!(e.error.code, "NOT_FOUND");

        let e: ApiError = SubscriberServiceError::InternalError(anyhow::anyhow!("db down")).into();
        assert_eq!(e.error.code, "INTERNAL_ERROR");
        assert!(!e.error.message.contains("db down"));
    }
}
