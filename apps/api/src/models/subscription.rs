//! Subscription state: one profile per user, holding the status and the
//! validity window of the monthly plan.
//!
//! Whether a profile currently grants access is always derived from the
//! window and an explicit `today`, never stored. A lapsed plan stops granting
//! access on the day after `end_date` without any write taking place.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Length of the window opened by a single `activate`.
pub const SUBSCRIPTION_PERIOD_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Free,
    Active,
}

impl SubscriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionStatus::Free => "free",
            SubscriptionStatus::Active => "active",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(SubscriptionStatus::Free),
            "active" => Ok(SubscriptionStatus::Active),
            other => Err(format!("unknown subscription status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionProfile {
    pub user_id: Uuid,
    pub status: SubscriptionStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl SubscriptionProfile {
    /// The default profile: free, with no window.
    pub fn free(user_id: Uuid, created_at: DateTime<Utc>) -> Self {
        SubscriptionProfile {
            user_id,
            status: SubscriptionStatus::Free,
            start_date: None,
            end_date: None,
            created_at,
        }
    }

    /// True iff the status is active and `end_date` is set and not before `today`.
    /// The status alone is never trusted.
    pub fn is_subscribed(&self, today: NaiveDate) -> bool {
        self.status == SubscriptionStatus::Active
            && matches!(self.end_date, Some(end) if end >= today)
    }

    /// Opens a fresh window `[today, today + 30 days]`.
    ///
    /// Any remaining days of a current window are discarded, not carried over.
    pub fn activate(&mut self, today: NaiveDate) {
        self.status = SubscriptionStatus::Active;
        self.start_date = Some(today);
        self.end_date = Some(today + Duration::days(SUBSCRIPTION_PERIOD_DAYS));
    }

    pub fn window(&self) -> SubscriptionWindow {
        SubscriptionWindow {
            subscription_status: self.status,
            subscription_start: self.start_date,
            subscription_end: self.end_date,
        }
    }
}

/// Status plus window, as returned by the subscribe and login endpoints.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubscriptionWindow {
    pub subscription_status: SubscriptionStatus,
    pub subscription_start: Option<NaiveDate>,
    pub subscription_end: Option<NaiveDate>,
}

#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionProfileRow {
    pub user_id: Uuid,
    pub subscription_status: String,
    pub subscription_start: Option<NaiveDate>,
    pub subscription_end: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionProfileRow> for SubscriptionProfile {
    type Error = String;

    fn try_from(row: SubscriptionProfileRow) -> Result<Self, Self::Error> {
        Ok(SubscriptionProfile {
            user_id: row.user_id,
            status: row.subscription_status.parse()?,
            start_date: row.subscription_start,
            end_date: row.subscription_end,
            created_at: row.created_at,
        })
    }
}
