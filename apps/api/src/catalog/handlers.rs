//! Axum route handlers for the public catalog.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;

use crate::access::policy::{project_view, ProjectView, Tier};
use crate::access::resolve_tier;
use crate::auth::extract::MaybeUser;
use crate::errors::{parse_path_id, AppError};
use crate::models::catalog::CatalogStats;
use crate::state::AppState;
use crate::telemetry::{record_view, ClientIp};

/// GET /api/projects/
/// Active projects, newest first, always in the anonymous shape.
pub async fn handle_list_projects(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectView>>, AppError> {
    let projects = state.store.list_active_projects().await?;
    Ok(Json(
        projects
            .iter()
            .map(|p| project_view(p, &[], Tier::Anonymous))
            .collect(),
    ))
}

/// GET /api/projects/:id/
pub async fn handle_project_detail(
    State(state): State<AppState>,
    MaybeUser(user_id): MaybeUser,
    client_ip: ClientIp,
    Path(raw_id): Path<String>,
) -> Result<Json<ProjectView>, AppError> {
    let id = parse_path_id(&raw_id, "Project")?;
    let store = state.store.as_ref();
    let tier = resolve_tier(store, user_id, Utc::now().date_naive()).await;

    let project = store
        .get_active_project(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {id} not found")))?;

    let explanations = if tier.visibility().explanations {
        store.explanations_of(project.id).await?
    } else {
        Vec::new()
    };
    let view = project_view(&project, &explanations, tier);

    record_view(store, project.id, user_id, client_ip).await;

    Ok(Json(view))
}

/// GET /api/stats/
pub async fn handle_stats(State(state): State<AppState>) -> Result<Json<CatalogStats>, AppError> {
    Ok(Json(state.store.catalog_stats().await?))
}
