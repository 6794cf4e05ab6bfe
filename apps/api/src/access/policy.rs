//! Access Policy: maps a requester to a visibility tier and shapes catalog
//! records for that tier.
//!
//! The stored Project/Explanation records are identical for everyone; only
//! the projection differs. All three tiers are described by one table,
//! `Tier::visibility`, so the whole gate can be audited in one place.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::catalog::{Explanation, ProcessType, Project};
use crate::models::price::Price;
use crate::models::subscription::SubscriptionProfile;

pub const SUBSCRIPTION_REQUIRED_MESSAGE: &str =
    "A subscription is required to access explanations";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Anonymous,
    AuthenticatedFree,
    AuthenticatedSubscriber,
}

/// Which optional parts of a project a tier may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visibility {
    pub cnc_code: bool,
    pub media_urls: bool,
    pub explanations: bool,
    pub explanation_text: bool,
}

impl Tier {
    pub const fn visibility(self) -> Visibility {
        match self {
            Tier::Anonymous => Visibility {
                cnc_code: false,
                media_urls: false,
                explanations: false,
                explanation_text: false,
            },
            Tier::AuthenticatedFree => Visibility {
                cnc_code: true,
                media_urls: true,
                explanations: true,
                explanation_text: false,
            },
            Tier::AuthenticatedSubscriber => Visibility {
                cnc_code: true,
                media_urls: true,
                explanations: true,
                explanation_text: true,
            },
        }
    }
}

/// Classifies a requester. A missing profile never escalates: an
/// authenticated user without one is `AuthenticatedFree`.
pub fn classify(
    user_id: Option<Uuid>,
    profile: Option<&SubscriptionProfile>,
    today: NaiveDate,
) -> Tier {
    match (user_id, profile) {
        (None, _) => Tier::Anonymous,
        (Some(_), Some(p)) if p.is_subscribed(today) => Tier::AuthenticatedSubscriber,
        (Some(_), _) => Tier::AuthenticatedFree,
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExplanationView {
    pub id: Uuid,
    pub gcode_line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation_text: Option<String>,
    pub explanation_key: String,
    pub display_price: Price,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProjectView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub material: String,
    pub process_type: ProcessType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnc_code: Option<String>,
    pub consultation_price: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_urls: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanations: Option<Vec<ExplanationView>>,
}

pub fn explanation_view(explanation: &Explanation, tier: Tier) -> ExplanationView {
    let rules = tier.visibility();
    ExplanationView {
        id: explanation.id,
        gcode_line: explanation.gcode_line.clone(),
        explanation_text: rules
            .explanation_text
            .then(|| explanation.explanation_text.clone()),
        explanation_key: explanation.explanation_key.clone(),
        display_price: explanation.display_price,
    }
}

/// Shapes one project for `tier`. `explanations` must belong to `project`.
pub fn project_view(project: &Project, explanations: &[Explanation], tier: Tier) -> ProjectView {
    let rules = tier.visibility();
    ProjectView {
        id: project.id,
        title: project.title.clone(),
        description: project.description.clone(),
        material: project.material.clone(),
        process_type: project.process_type,
        cnc_code: rules.cnc_code.then(|| project.cnc_code.clone()),
        consultation_price: project.consultation_price,
        media_urls: rules.media_urls.then(|| project.media_urls.clone()),
        created_at: project.created_at,
        explanations: rules.explanations.then(|| {
            explanations
                .iter()
                .map(|e| explanation_view(e, tier))
                .collect()
        }),
    }
}

/// Result of the single-explanation gate. The text is only ever present
/// when `has_access` is true.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExplanationAccess {
    pub has_access: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_price: Option<Price>,
}

pub fn explanation_access(explanation: &Explanation, tier: Tier) -> ExplanationAccess {
    if tier.visibility().explanation_text {
        ExplanationAccess {
            has_access: true,
            explanation_text: Some(explanation.explanation_text.clone()),
            message: None,
            display_price: None,
        }
    } else {
        ExplanationAccess {
            has_access: false,
            explanation_text: None,
            message: Some(SUBSCRIPTION_REQUIRED_MESSAGE.to_string()),
            display_price: Some(explanation.display_price),
        }
    }
}
