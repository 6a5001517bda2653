//! Authentication API endpoints
//!
//! - POST /api/auth/register - Create an account, sets the token cookie
//! - POST /api/auth/login - Log in, sets the token cookie
//! - POST /api/auth/logout - Clear the token cookie
//! - POST /api/auth/forgot-password - Issue a reset token
//! - POST /api/auth/reset-password - Consume a reset token
//! - GET /api/auth/me - Current user

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::cookie::{clear_token_cookie, token_cookie};
use crate::api::middleware::{ApiError, ApiJson, AppState, AuthenticatedUser};
use crate::api::responses::{MessageResponse, UserResponse};
use crate::services::user::{AuthSession, LoginInput, RegisterInput};

/// Request body for registration
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub user: UserResponse,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_link: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub success: bool,
    pub message: String,
    pub user: UserResponse,
}

const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent.";

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}

/// Answer with the session and set the token cookie
fn session_response(state: &AppState, session: AuthSession, message: &str) -> impl IntoResponse {
    let max_age = state.user_service.token_ttl().num_seconds();
    let cookie = token_cookie(&session.token, max_age, state.cookie_secure);

    (
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            success: true,
            message: message.to_string(),
            user: (&session.user).into(),
            token: session.token,
        }),
    )
}

/// POST /api/auth/register
async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = RegisterInput {
        email: body.email,
        password: body.password,
        first_name: body.first_name,
        last_name: body.last_name,
    };

    let session = state.user_service.register(input).await?;
    Ok(session_response(&state, session, "User registered successfully"))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .user_service
        .login(LoginInput::new(body.email, body.password))
        .await?;
    Ok(session_response(&state, session, "Login successful"))
}

/// POST /api/auth/logout
///
/// Tokens are stateless, so logging out only drops the cookie.
async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, clear_token_cookie())],
        Json(MessageResponse::ok("Logged out successfully")),
    )
}

/// POST /api/auth/forgot-password
async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, ApiError> {
    let outcome = state.user_service.forgot_password(&body.email).await?;

    Ok(Json(ForgotPasswordResponse {
        success: true,
        message: FORGOT_PASSWORD_MESSAGE.to_string(),
        reset_link: outcome.reset_link,
    }))
}

/// POST /api/auth/reset-password
async fn reset_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .user_service
        .reset_password(&body.token, &body.new_password)
        .await?;
    Ok(Json(MessageResponse::ok("Password reset successfully")))
}

/// GET /api/auth/me
///
/// Mounted behind the auth middleware.
pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Json<MeResponse> {
    Json(MeResponse {
        success: true,
        message: "User retrieved".to_string(),
        user: (&user).into(),
    })
}
