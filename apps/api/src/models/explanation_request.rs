use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Operator-managed progress of a contact request. New requests start as `Pending`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Contacted,
    Completed,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Contacted => "contacted",
            RequestStatus::Completed => "completed",
        }
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "contacted" => Ok(RequestStatus::Contacted),
            "completed" => Ok(RequestStatus::Completed),
            other => Err(format!("unknown request status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplanationRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub explanation_id: Uuid,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub additional_message: String,
    pub status: RequestStatus,
    pub requested_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewExplanationRequest {
    pub user_id: Uuid,
    pub explanation_id: Uuid,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub additional_message: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct ExplanationRequestRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub explanation_id: Uuid,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub additional_message: String,
    pub status: String,
    pub requested_at: DateTime<Utc>,
}

impl TryFrom<ExplanationRequestRow> for ExplanationRequest {
    type Error = String;

    fn try_from(row: ExplanationRequestRow) -> Result<Self, Self::Error> {
        Ok(ExplanationRequest {
            id: row.id,
            user_id: row.user_id,
            explanation_id: row.explanation_id,
            contact_name: row.contact_name,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
            additional_message: row.additional_message,
            status: row.status.parse()?,
            requested_at: row.requested_at,
        })
    }
}
