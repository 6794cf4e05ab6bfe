use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Append-only record of one project detail view. Never consulted by access checks.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct ViewRecord {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Option<Uuid>,
    pub ip_address: String,
    pub viewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewViewRecord {
    pub project_id: Uuid,
    pub user_id: Option<Uuid>,
    pub ip_address: String,
}
