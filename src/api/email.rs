//! Mailing list endpoints
//!
//! - POST /api/email/subscribe
//! - POST /api/email/unsubscribe

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;

use crate::api::middleware::{ApiError, ApiJson, AppState};
use crate::api::responses::MessageResponse;
use crate::models::SubscribeInput;

#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub email: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/subscribe", post(subscribe))
        .route("/unsubscribe", post(unsubscribe))
}

async fn subscribe(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SubscribeInput>,
) -> Result<Json<MessageResponse>, ApiError> {
    let outcome = state.subscriber_service.subscribe(body).await?;
    Ok(Json(MessageResponse::ok(outcome.message())))
}

async fn unsubscribe(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<UnsubscribeRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.subscriber_service.unsubscribe(&body.email).await?;
    Ok(Json(MessageResponse::ok("Unsubscribed successfully")))
}
