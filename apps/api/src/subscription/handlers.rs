//! Axum route handlers for subscribing and for the single-explanation gate.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::access::policy::{explanation_access, ExplanationAccess};
use crate::access::resolve_tier;
use crate::auth::extract::AuthUser;
use crate::errors::{parse_path_id, AppError};
use crate::models::subscription::SubscriptionWindow;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub message: String,
    pub subscription: SubscriptionWindow,
}

/// POST /api/subscription/subscribe/
///
/// Activates directly; there is no payment step. Unlike the profile
/// endpoint, a missing profile is a 404 here and nothing is created.
pub async fn handle_subscribe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<SubscribeResponse>, AppError> {
    let mut profile = state
        .store
        .find_profile(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User profile not found".to_string()))?;

    profile.activate(Utc::now().date_naive());
    state.store.save_profile(&profile).await?;

    info!(
        "Activated subscription for user {user_id} until {:?}",
        profile.end_date
    );

    Ok(Json(SubscribeResponse {
        message: "Subscription activated successfully".to_string(),
        subscription: profile.window(),
    }))
}

/// GET /api/explanation/:id/access/
/// Explanations of inactive projects are as absent as the project itself.
pub async fn handle_explanation_access(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(raw_id): Path<String>,
) -> Result<Json<ExplanationAccess>, AppError> {
    let id = parse_path_id(&raw_id, "Explanation")?;
    let explanation = state
        .store
        .get_active_explanation(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Explanation {id} not found")))?;
    let tier = resolve_tier(state.store.as_ref(), Some(user_id), Utc::now().date_naive()).await;
    Ok(Json(explanation_access(&explanation, tier)))
}
