use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::price::Price;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProcessType {
    #[serde(rename = "milling")]
    Milling,
    #[serde(rename = "turning")]
    Turning,
    #[serde(rename = "5axis")]
    FiveAxis,
    #[serde(rename = "multiaxis")]
    MultiAxis,
}

impl ProcessType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProcessType::Milling => "milling",
            ProcessType::Turning => "turning",
            ProcessType::FiveAxis => "5axis",
            ProcessType::MultiAxis => "multiaxis",
        }
    }
}

impl fmt::Display for ProcessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "milling" => Ok(ProcessType::Milling),
            "turning" => Ok(ProcessType::Turning),
            "5axis" => Ok(ProcessType::FiveAxis),
            "multiaxis" => Ok(ProcessType::MultiAxis),
            other => Err(format!("unknown process type '{other}'")),
        }
    }
}

/// A catalog entry. Only active projects are ever served.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub material: String,
    pub process_type: ProcessType,
    pub cnc_code: String,
    pub consultation_price: Price,
    pub media_urls: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// One G-code line of a project with its paid explanation.
/// `(project_id, explanation_key)` is unique.
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    pub id: Uuid,
    pub project_id: Uuid,
    pub gcode_line: String,
    pub explanation_text: String,
    pub explanation_key: String,
    pub display_price: Price,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CatalogStats {
    pub total_projects: i64,
    pub total_views: i64,
    pub process_types: Vec<ProcessType>,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub material: String,
    pub process_type: String,
    pub cnc_code: String,
    pub consultation_price_pence: i64,
    pub media_urls: Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = String;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        Ok(Project {
            id: row.id,
            title: row.title,
            description: row.description,
            material: row.material,
            process_type: row.process_type.parse()?,
            cnc_code: row.cnc_code,
            consultation_price: Price::from_pence(row.consultation_price_pence),
            media_urls: media_urls_from_json(&row.media_urls),
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ExplanationRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub gcode_line: String,
    pub explanation_text: String,
    pub explanation_key: String,
    pub display_price_pence: i64,
    pub created_at: DateTime<Utc>,
}

impl From<ExplanationRow> for Explanation {
    fn from(row: ExplanationRow) -> Self {
        Explanation {
            id: row.id,
            project_id: row.project_id,
            gcode_line: row.gcode_line,
            explanation_text: row.explanation_text,
            explanation_key: row.explanation_key,
            display_price: Price::from_pence(row.display_price_pence),
            created_at: row.created_at,
        }
    }
}

/// Reads the stored media list. Operators sometimes save the list as a
/// JSON-encoded string; anything unreadable yields an empty list.
pub fn media_urls_from_json(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Value::String(encoded) => serde_json::from_str::<Value>(encoded)
            .map(|decoded| match decoded {
                Value::Array(_) => media_urls_from_json(&decoded),
                _ => Vec::new(),
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}
