//! Persistence seam. Handlers talk to an `Arc<dyn Store>` carried in
//! `AppState`; `PgStore` backs production, `MemoryStore` backs the tests.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::catalog::{CatalogStats, Explanation, Project};
use crate::models::explanation_request::{ExplanationRequest, NewExplanationRequest};
use crate::models::subscription::SubscriptionProfile;
use crate::models::telemetry::{NewViewRecord, ViewRecord};
use crate::models::user::{NewUser, User};

pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate value for {0}")]
    Duplicate(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(field) => {
                AppError::field(&field, format!("A user with that {field} already exists"))
            }
            StoreError::Corrupt(msg) => AppError::Internal(anyhow::anyhow!("corrupt row: {msg}")),
            StoreError::Database(e) => AppError::Database(e),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    // Users
    /// Inserts the user and its free profile atomically: either both rows
    /// exist afterwards or neither does.
    async fn create_user_with_profile(
        &self,
        new_user: NewUser,
        now: DateTime<Utc>,
    ) -> StoreResult<(User, SubscriptionProfile)>;
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    // Subscription profiles
    async fn find_profile(&self, user_id: Uuid) -> StoreResult<Option<SubscriptionProfile>>;
    /// Idempotent: returns the existing profile, or inserts a free one.
    async fn get_or_create_profile(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<SubscriptionProfile>;
    async fn save_profile(&self, profile: &SubscriptionProfile) -> StoreResult<()>;

    // Catalog
    /// Active projects, newest first.
    async fn list_active_projects(&self) -> StoreResult<Vec<Project>>;
    async fn get_active_project(&self, id: Uuid) -> StoreResult<Option<Project>>;
    /// Explanations of one project, ordered by explanation key.
    async fn explanations_of(&self, project_id: Uuid) -> StoreResult<Vec<Explanation>>;
    /// Any explanation, whatever the state of its project.
    async fn get_explanation(&self, id: Uuid) -> StoreResult<Option<Explanation>>;
    /// Only explanations whose project is active.
    async fn get_active_explanation(&self, id: Uuid) -> StoreResult<Option<Explanation>>;
    async fn catalog_stats(&self) -> StoreResult<CatalogStats>;

    // Telemetry
    async fn record_view(&self, view: NewViewRecord) -> StoreResult<ViewRecord>;

    // Explanation requests
    async fn create_explanation_request(
        &self,
        request: NewExplanationRequest,
    ) -> StoreResult<ExplanationRequest>;
    /// A user's requests, newest first.
    async fn explanation_requests_for(&self, user_id: Uuid)
        -> StoreResult<Vec<ExplanationRequest>>;
}
