//! Axum route handlers for explanation contact requests.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::policy::{explanation_view, ExplanationView, Tier};
use crate::access::resolve_tier;
use crate::auth::extract::AuthUser;
use crate::errors::AppError;
use crate::models::catalog::Explanation;
use crate::models::explanation_request::{
    ExplanationRequest, NewExplanationRequest, RequestStatus,
};
use crate::models::user::UserSummary;
use crate::state::AppState;
use crate::validation::{Validator, REQUIRED};

const MAX_CONTACT_NAME_CHARS: usize = 255;
const MAX_CONTACT_PHONE_CHARS: usize = 20;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateExplanationRequest {
    pub explanation: Option<Uuid>,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub additional_message: String,
}

/// A request with its owner and explanation nested. The explanation is
/// projected for the caller's tier like anywhere else.
#[derive(Debug, Serialize)]
pub struct ExplanationRequestView {
    pub id: Uuid,
    pub user: UserSummary,
    pub explanation: ExplanationView,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub additional_message: String,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
}

fn request_view(
    request: ExplanationRequest,
    user: &UserSummary,
    explanation: &Explanation,
    tier: Tier,
) -> ExplanationRequestView {
    ExplanationRequestView {
        id: request.id,
        user: user.clone(),
        explanation: explanation_view(explanation, tier),
        contact_name: request.contact_name,
        contact_email: request.contact_email,
        contact_phone: request.contact_phone,
        additional_message: request.additional_message,
        status: request.status,
        requested_at: request.requested_at,
    }
}

impl CreateExplanationRequest {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        v.check(self.explanation.is_some(), "explanation", REQUIRED);
        if v.required("contact_name", &self.contact_name) {
            v.max_chars("contact_name", &self.contact_name, MAX_CONTACT_NAME_CHARS);
        }
        if v.required("contact_email", &self.contact_email) {
            v.email("contact_email", &self.contact_email);
        }
        v.max_chars("contact_phone", &self.contact_phone, MAX_CONTACT_PHONE_CHARS);
        v.finish()
    }
}

async fn caller_summary(state: &AppState, user_id: Uuid) -> Result<UserSummary, AppError> {
    state
        .store
        .find_user(user_id)
        .await?
        .map(|u| UserSummary::from(&u))
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
}

/// POST /api/explanation-request/
pub async fn handle_create_request(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<CreateExplanationRequest>,
) -> Result<(StatusCode, Json<ExplanationRequestView>), AppError> {
    req.validate()?;
    let explanation_id = req
        .explanation
        .ok_or_else(|| AppError::field("explanation", REQUIRED))?;

    let explanation = state
        .store
        .get_active_explanation(explanation_id)
        .await?
        .ok_or_else(|| {
            AppError::field(
                "explanation",
                format!("Explanation {explanation_id} does not exist."),
            )
        })?;
    let user = caller_summary(&state, user_id).await?;

    let created = state
        .store
        .create_explanation_request(NewExplanationRequest {
            user_id,
            explanation_id,
            contact_name: req.contact_name.trim().to_string(),
            contact_email: req.contact_email.trim().to_string(),
            contact_phone: req.contact_phone.trim().to_string(),
            additional_message: req.additional_message,
        })
        .await?;

    let tier = resolve_tier(state.store.as_ref(), Some(user_id), Utc::now().date_naive()).await;
    Ok((
        StatusCode::CREATED,
        Json(request_view(created, &user, &explanation, tier)),
    ))
}

/// GET /api/my-requests/
/// The caller's own requests, newest first.
pub async fn handle_my_requests(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<ExplanationRequestView>>, AppError> {
    let user = caller_summary(&state, user_id).await?;
    let requests = state.store.explanation_requests_for(user_id).await?;
    let tier = resolve_tier(state.store.as_ref(), Some(user_id), Utc::now().date_naive()).await;

    let mut views = Vec::with_capacity(requests.len());
    for request in requests {
        let explanation = state
            .store
            .get_explanation(request.explanation_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "request {} references missing explanation {}",
                    request.id,
                    request.explanation_id
                ))
            })?;
        views.push(request_view(request, &user, &explanation, tier));
    }
    Ok(Json(views))
}
