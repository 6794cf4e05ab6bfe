//! Axum route handlers for registration, login, token refresh and the
//! caller's own profile.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::extract::AuthUser;
use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::tokens::TokenPair;
use crate::errors::AppError;
use crate::models::subscription::SubscriptionStatus;
use crate::models::user::{NewUser, UserSummary};
use crate::state::AppState;
use crate::validation::{Validator, REQUIRED};

const MIN_PASSWORD_CHARS: usize = 8;
const MAX_USERNAME_CHARS: usize = 150;
const MAX_NAME_CHARS: usize = 150;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserSummary,
    pub tokens: TokenPair,
    pub subscription_status: SubscriptionStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserSummary,
    pub tokens: TokenPair,
    pub subscription_status: SubscriptionStatus,
    pub is_subscribed: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: UserSummary,
    pub subscription_status: SubscriptionStatus,
    pub subscription_start: Option<NaiveDate>,
    pub subscription_end: Option<NaiveDate>,
    pub is_subscribed: bool,
}

/// Usernames are stored and looked up without surrounding whitespace.
fn normalize_username(raw: &str) -> String {
    raw.trim().to_string()
}

impl RegisterRequest {
    fn validate(&self) -> Result<(), AppError> {
        let mut v = Validator::new();
        if v.required("username", &self.username) {
            v.max_chars("username", &self.username, MAX_USERNAME_CHARS);
        }
        if v.required("email", &self.email) {
            v.email("email", &self.email);
        }
        if v.required("password", &self.password) {
            v.min_chars("password", &self.password, MIN_PASSWORD_CHARS);
        }
        if v.required("password_confirm", &self.password_confirm) {
            v.check(
                self.password == self.password_confirm,
                "password_confirm",
                "Passwords do not match",
            );
        }
        v.max_chars("first_name", &self.first_name, MAX_NAME_CHARS);
        v.max_chars("last_name", &self.last_name, MAX_NAME_CHARS);
        v.finish()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/auth/register/
pub async fn handle_register(
    State(state): State<AppState>,
    Json(mut req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    req.username = normalize_username(&req.username);
    req.email = req.email.trim().to_string();
    req.validate()?;

    if state
        .store
        .find_user_by_username(&req.username)
        .await?
        .is_some()
    {
        return Err(AppError::field(
            "username",
            "A user with that username already exists",
        ));
    }

    let password_hash = hash_password_blocking(req.password).await?;
    let (user, profile) = state
        .store
        .create_user_with_profile(
            NewUser {
                username: req.username,
                email: req.email,
                first_name: req.first_name,
                last_name: req.last_name,
                password_hash,
            },
            Utc::now(),
        )
        .await?;

    info!("Registered user {} ({})", user.username, user.id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: UserSummary::from(&user),
            tokens: state.tokens.issue_pair(user.id)?,
            subscription_status: profile.status,
        }),
    ))
}

/// POST /api/auth/login/
/// Every failure is the same generic 401, whichever field was wrong.
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let username = normalize_username(&req.username);
    if username.is_empty() || req.password.is_empty() {
        return Err(AppError::InvalidCredentials);
    }

    let user = state
        .store
        .find_user_by_username(&username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;
    if !verify_password_blocking(req.password, user.password_hash.clone()).await? {
        return Err(AppError::InvalidCredentials);
    }

    let profile = state
        .store
        .get_or_create_profile(user.id, Utc::now())
        .await?;
    let is_subscribed = profile.is_subscribed(Utc::now().date_naive());

    Ok(Json(LoginResponse {
        user: UserSummary::from(&user),
        tokens: state.tokens.issue_pair(user.id)?,
        subscription_status: profile.status,
        is_subscribed,
    }))
}

/// POST /api/auth/refresh/
pub async fn handle_refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, AppError> {
    if req.refresh.trim().is_empty() {
        return Err(AppError::field("refresh", REQUIRED));
    }
    let access = state.tokens.refresh_access(req.refresh.trim())?;
    Ok(Json(RefreshResponse { access }))
}

/// GET /api/auth/profile/
/// Creates a free profile on the fly if the caller has none.
pub async fn handle_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;
    let profile = state
        .store
        .get_or_create_profile(user_id, Utc::now())
        .await?;

    Ok(Json(ProfileResponse {
        user: UserSummary::from(&user),
        subscription_status: profile.status,
        subscription_start: profile.start_date,
        subscription_end: profile.end_date,
        is_subscribed: profile.is_subscribed(Utc::now().date_naive()),
    }))
}
