//! API layer - HTTP handlers and routing
//!
//! - Auth endpoints (`/api/auth`)
//! - Public blog endpoints (`/api/blog`)
//! - Mailing list endpoints (`/api/email`)
//! - Admin endpoints (`/api/admin`)
//! - Health check

pub mod admin;
pub mod auth;
pub mod blog;
pub mod cookie;
pub mod email;
pub mod health;
pub mod middleware;
pub mod responses;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, ApiJson, ApiPath, AppState, AuthenticatedUser};

/// Build the `/api` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need admin role)
    let admin_routes = Router::new()
        .nest("/admin", admin::router())
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth but not admin)
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .route("/health", get(health::health))
        .nest("/auth", auth::public_router())
        .nest("/blog", blog::router())
        .nest("/email", email::router())
        .merge(admin_routes)
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let origin = cors_origin.parse::<HeaderValue>().unwrap_or_else(|_| {
        tracing::warn!("Invalid CORS origin {:?}, falling back to localhost", cors_origin);
        HeaderValue::from_static("http://localhost:3000")
    });

    // Credentials are allowed so the token cookie reaches the API
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Router::new()
        .route("/", get(health::root))
        .nest("/api", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeedConfig;
    use crate::db::repositories::{
        SqlxArticleRepository, SqlxSubscriberRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations, seed};
    use crate::services::{
        ArticleService, Mailer, PasswordResetOptions, SubscriberService, TokenService,
        UserService,
    };
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    const ADMIN_EMAIL: &str = "admin@adriastyle.com";
    const ADMIN_PASSWORD: &str = "Admin123!";

    async fn test_app() -> Router {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        seed::seed(&pool, &SeedConfig::default()).await.unwrap();

        let tokens = TokenService::new(b"router-test-secret", chrono::Duration::days(30));
        let reset = PasswordResetOptions {
            expose_link: true,
            ..PasswordResetOptions::from_config(&Default::default(), Mailer::disabled())
        };

        let state = AppState {
            pool: pool.clone(),
            user_service: Arc::new(UserService::with_reset_options(
                SqlxUserRepository::boxed(pool.clone()),
                tokens,
                reset,
            )),
            article_service: Arc::new(ArticleService::new(SqlxArticleRepository::boxed(
                pool.clone(),
            ))),
            subscriber_service: Arc::new(SubscriberService::new(
                SqlxSubscriberRepository::boxed(pool),
            )),
            cookie_secure: false,
        };
        build_router(state, "http://localhost:3000")
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn login(app: &Router, email: &str, password: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/api/auth/login",
            Some(json!({"email": email, "password": password})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    async fn register(app: &Router, email: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/api/auth/register",
            Some(json!({"email": email, "password": "secret1"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK, "register failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_register_then_duplicate_is_conflict() {
        let app = test_app().await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"email": "a@x.com", "password": "secret1", "firstName": "Ada"})
                    .to_string(),
            ))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("token="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=2592000"));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "User registered successfully");
        assert_eq!(body["user"]["email"], "a@x.com");
        assert_eq!(body["user"]["firstName"], "Ada");
        assert_eq!(body["user"]["isAdmin"], false);

        // The issued token resolves to the new user
        let token = body["token"].as_str().unwrap();
        let (status, me) = send(&app, "GET", "/api/auth/me", None, Some(token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["user"]["email"], "a@x.com");

        let (status, dup) = send(
            &app,
            "POST",
            "/api/auth/register",
            Some(json!({"email": "a@x.com", "password": "secret1"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(dup["success"], false);
        assert_eq!(dup["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_register_validation_and_malformed_json() {
        let app = test_app().await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/register",
            Some(json!({"email": "a@x.com", "password": "123"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/register",
            Some(json!({"email": "a@x.com"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_login_and_me() {
        let app = test_app().await;
        register(&app, "b@x.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            Some(json!({"email": "b@x.com", "password": "wrong-pass"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/login",
            Some(json!({"email": "B@X.com", "password": "secret1"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Login successful");
        assert!(body["user"]["lastLogin"].is_string());

        let (status, _) = send(&app, "GET", "/api/auth/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "GET", "/api/auth/me", None, Some("garbage")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_accepts_cookie() {
        let app = test_app().await;
        let token = register(&app, "c@x.com").await;

        let request = Request::builder()
            .uri("/api/auth/me")
            .header(header::COOKIE, format!("token={}", token))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let app = test_app().await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/logout")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers().get(header::SET_COOKIE).unwrap();
        assert!(cookie.to_str().unwrap().contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_password_reset_token_used_once() {
        let app = test_app().await;
        register(&app, "r@x.com").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/forgot-password",
            Some(json!({"email": "r@x.com"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let link = body["reset_link"].as_str().unwrap();
        let token = link.split("token=").nth(1).unwrap().to_string();
        assert_eq!(token.len(), 64);

        let reset = json!({"token": token, "newPassword": "brand-new"});
        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/reset-password",
            Some(reset.clone()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Password reset successfully");

        let (status, body) =
            send(&app, "POST", "/api/auth/reset-password", Some(reset), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        login(&app, "r@x.com", "brand-new").await;
    }

    #[tokio::test]
    async fn test_forgot_password_unknown_email_same_message() {
        let app = test_app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/forgot-password",
            Some(json!({"email": "nobody@x.com"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["message"],
            "If an account with that email exists, a password reset link has been sent."
        );
        assert!(body.get("reset_link").is_none());
    }

    #[tokio::test]
    async fn test_admin_guards() {
        let app = test_app().await;

        let (status, body) = send(&app, "GET", "/api/admin/stats", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        let user_token = register(&app, "plain@x.com").await;
        let (status, body) = send(&app, "GET", "/api/admin/stats", None, Some(&user_token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");

        let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let (status, stats) =
            send(&app, "GET", "/api/admin/stats", None, Some(&admin_token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["totalUsers"], 2);
        assert_eq!(stats["totalAdmins"], 1);
        assert_eq!(stats["totalArticles"], 3);
        assert_eq!(stats["publishedArticles"], 3);
        assert_eq!(stats["draftArticles"], 0);
        assert_eq!(stats["totalSubscribers"], 0);
    }

    #[tokio::test]
    async fn test_admin_user_management() {
        let app = test_app().await;
        let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let admin = Some(admin_token.as_str());
        register(&app, "u@x.com").await;

        let (_, list) = send(&app, "GET", "/api/admin/users", None, admin).await;
        let users = list["users"].as_array().unwrap();
        assert_eq!(users.len(), 2);
        let target = users.iter().find(|u| u["email"] == "u@x.com").unwrap();
        let id = target["id"].as_i64().unwrap();
        assert_eq!(target["customer_tier"], "free");

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/admin/users/{}/tier", id),
            Some(json!({"tier": "gold"})),
            admin,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        for (path, body) in [
            ("tier", json!({"tier": "paid"})),
            ("status", json!({"status": "yellow"})),
            ("notes", json!({"notes": "Prefers email"})),
        ] {
            let (status, _) = send(
                &app,
                "PUT",
                &format!("/api/admin/users/{}/{}", id, path),
                Some(body),
                admin,
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/admin/users/{}/promote", id),
            None,
            admin,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, detail) =
            send(&app, "GET", &format!("/api/admin/users/{}", id), None, admin).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["user"]["isAdmin"], true);
        assert_eq!(detail["user"]["customer_tier"], "paid");
        assert_eq!(detail["user"]["customer_status"], "yellow");
        assert_eq!(detail["user"]["admin_notes"], "Prefers email");

        let (status, _) =
            send(&app, "DELETE", &format!("/api/admin/users/{}", id), None, admin).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) =
            send(&app, "GET", &format!("/api/admin/users/{}", id), None, admin).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_admin_cannot_delete_self() {
        let app = test_app().await;
        let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let (_, me) = send(&app, "GET", "/api/auth/me", None, Some(&admin_token)).await;
        let id = me["user"]["id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            "DELETE",
            &format!("/api/admin/users/{}", id),
            None,
            Some(&admin_token),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_json_validation_error() {
        let app = test_app().await;
        let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

        for (method, uri) in [
            ("GET", "/api/admin/users/abc"),
            ("DELETE", "/api/admin/users/abc"),
            ("POST", "/api/admin/users/abc/promote"),
            ("GET", "/api/admin/articles/1.5"),
        ] {
            let (status, body) = send(&app, method, uri, None, Some(&admin_token)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", method, uri);
            assert_eq!(body["success"], false);
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn test_public_blog_hides_drafts() {
        let app = test_app().await;
        let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let admin = Some(admin_token.as_str());

        let (status, created) = send(
            &app,
            "POST",
            "/api/admin/articles",
            Some(json!({"title": "Draft", "slug": "secret-draft", "content": "Soon"})),
            admin,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = created["article"]["id"].as_i64().unwrap();

        let (status, list) = send(&app, "GET", "/api/blog/articles", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let articles = list.as_array().unwrap();
        assert_eq!(articles.len(), 3);
        assert!(articles.iter().all(|a| a["published"] == true));

        let (status, _) = send(&app, "GET", "/api/blog/articles/secret-draft", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "GET", "/api/blog/articles/no-such-slug", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "PATCH",
            &format!("/api/admin/articles/{}/publish", id),
            Some(json!({"published": true})),
            admin,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, article) =
            send(&app, "GET", "/api/blog/articles/secret-draft", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(article["title"], "Draft");
        assert!(article.get("featured_image").is_some());
    }

    #[tokio::test]
    async fn test_admin_article_crud() {
        let app = test_app().await;
        let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let admin = Some(admin_token.as_str());

        let (status, body) = send(
            &app,
            "POST",
            "/api/admin/articles",
            Some(json!({"title": "Dup", "slug": "capsule-wardrobe", "content": "x"})),
            admin,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "CONFLICT");

        let (status, body) = send(
            &app,
            "POST",
            "/api/admin/articles",
            Some(json!({"title": "Bad", "slug": "Bad Slug", "content": "x"})),
            admin,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (_, created) = send(
            &app,
            "POST",
            "/api/admin/articles",
            Some(json!({"title": "New", "slug": "new-post", "content": "Body", "published": true})),
            admin,
        )
        .await;
        let id = created["article"]["id"].as_i64().unwrap();

        let (status, updated) = send(
            &app,
            "PUT",
            &format!("/api/admin/articles/{}", id),
            Some(json!({"title": "", "excerpt": "Short"})),
            admin,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["article"]["title"], "New");
        assert_eq!(updated["article"]["excerpt"], "Short");

        let (_, list) = send(&app, "GET", "/api/admin/articles", None, admin).await;
        assert_eq!(list["articles"].as_array().unwrap().len(), 4);

        let (status, _) = send(
            &app,
            "DELETE",
            &format!("/api/admin/articles/{}", id),
            None,
            admin,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            "GET",
            &format!("/api/admin/articles/{}", id),
            None,
            admin,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_subscribe_twice_single_row() {
        let app = test_app().await;
        let subscribe = json!({"email": "fan@x.com", "name": "Fan"});

        let (status, first) =
            send(&app, "POST", "/api/email/subscribe", Some(subscribe.clone()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["message"], "Subscribed successfully");

        let (status, second) =
            send(&app, "POST", "/api/email/subscribe", Some(subscribe), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["message"], "Already subscribed");

        let admin_token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
        let (_, list) = send(&app, "GET", "/api/admin/subscribers", None, Some(&admin_token)).await;
        assert_eq!(list["count"], 1);
        assert_eq!(list["subscribers"][0]["subscribed"], true);

        let (status, _) = send(
            &app,
            "POST",
            "/api/email/unsubscribe",
            Some(json!({"email": "ghost@x.com"})),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health_and_root() {
        let app = test_app().await;

        let (status, health) = send(&app, "GET", "/api/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["database"], "up");

        let (status, root) = send(&app, "GET", "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(root["message"], "Adria Style Studio API");
    }
}
