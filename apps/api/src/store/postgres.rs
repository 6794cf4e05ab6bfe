use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::catalog::{
    CatalogStats, Explanation, ExplanationRow, ProcessType, Project, ProjectRow,
};
use crate::models::explanation_request::{
    ExplanationRequest, ExplanationRequestRow, NewExplanationRequest, RequestStatus,
};
use crate::models::subscription::{SubscriptionProfile, SubscriptionProfileRow};
use crate::models::telemetry::{NewViewRecord, ViewRecord};
use crate::models::user::{NewUser, User};
use crate::store::{Store, StoreError, StoreResult};

const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn corrupt(msg: String) -> StoreError {
    StoreError::Corrupt(msg)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

#[async_trait]
impl Store for PgStore {
    async fn create_user_with_profile(
        &self,
        new_user: NewUser,
        now: DateTime<Utc>,
    ) -> StoreResult<(User, SubscriptionProfile)> {
        // Dropping the transaction without commit rolls back the user row.
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.password_hash)
        .fetch_one(&mut *tx)
        .await;
        let user = match inserted {
            Ok(user) => user,
            Err(e) if is_unique_violation(&e) => {
                return Err(StoreError::Duplicate("username".into()))
            }
            Err(e) => return Err(e.into()),
        };

        let row: SubscriptionProfileRow = sqlx::query_as(
            r#"
            INSERT INTO subscription_profiles (user_id, subscription_status, created_at)
            VALUES ($1, 'free', $2)
            RETURNING *
            "#,
        )
        .bind(user.id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        info!("Created user {} ({}) with a free profile", user.username, user.id);

        let profile = SubscriptionProfile::try_from(row).map_err(corrupt)?;
        Ok((user, profile))
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_profile(&self, user_id: Uuid) -> StoreResult<Option<SubscriptionProfile>> {
        let row: Option<SubscriptionProfileRow> =
            sqlx::query_as("SELECT * FROM subscription_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(SubscriptionProfile::try_from)
            .transpose()
            .map_err(corrupt)
    }

    async fn get_or_create_profile(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<SubscriptionProfile> {
        sqlx::query(
            r#"
            INSERT INTO subscription_profiles (user_id, subscription_status, created_at)
            VALUES ($1, 'free', $2)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let row: SubscriptionProfileRow =
            sqlx::query_as("SELECT * FROM subscription_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        SubscriptionProfile::try_from(row).map_err(corrupt)
    }

    async fn save_profile(&self, profile: &SubscriptionProfile) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE subscription_profiles
            SET subscription_status = $1, subscription_start = $2, subscription_end = $3
            WHERE user_id = $4
            "#,
        )
        .bind(profile.status.as_str())
        .bind(profile.start_date)
        .bind(profile.end_date)
        .bind(profile.user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_active_projects(&self) -> StoreResult<Vec<Project>> {
        let rows: Vec<ProjectRow> = sqlx::query_as(
            "SELECT * FROM cnc_projects WHERE is_active = TRUE ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|r| Project::try_from(r).map_err(corrupt))
            .collect()
    }

    async fn get_active_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let row: Option<ProjectRow> =
            sqlx::query_as("SELECT * FROM cnc_projects WHERE id = $1 AND is_active = TRUE")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Project::try_from).transpose().map_err(corrupt)
    }

    async fn explanations_of(&self, project_id: Uuid) -> StoreResult<Vec<Explanation>> {
        let rows: Vec<ExplanationRow> = sqlx::query_as(
            "SELECT * FROM gcode_explanations WHERE project_id = $1 ORDER BY explanation_key",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Explanation::from).collect())
    }

    async fn get_explanation(&self, id: Uuid) -> StoreResult<Option<Explanation>> {
        let row: Option<ExplanationRow> =
            sqlx::query_as("SELECT * FROM gcode_explanations WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Explanation::from))
    }

    async fn get_active_explanation(&self, id: Uuid) -> StoreResult<Option<Explanation>> {
        let row: Option<ExplanationRow> = sqlx::query_as(
            r#"
            SELECT e.*
            FROM gcode_explanations e
            JOIN cnc_projects p ON p.id = e.project_id
            WHERE e.id = $1 AND p.is_active = TRUE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Explanation::from))
    }

    async fn catalog_stats(&self) -> StoreResult<CatalogStats> {
        let total_projects: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM cnc_projects WHERE is_active = TRUE")
                .fetch_one(&self.pool)
                .await?;
        let total_views: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM project_views")
            .fetch_one(&self.pool)
            .await?;
        let raw_types: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT process_type FROM cnc_projects WHERE is_active = TRUE ORDER BY process_type",
        )
        .fetch_all(&self.pool)
        .await?;
        let process_types = raw_types
            .iter()
            .map(|t| t.parse::<ProcessType>().map_err(corrupt))
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(CatalogStats {
            total_projects,
            total_views,
            process_types,
        })
    }

    async fn record_view(&self, view: NewViewRecord) -> StoreResult<ViewRecord> {
        // Append-only: one row per view, never deduplicated.
        Ok(sqlx::query_as::<_, ViewRecord>(
            r#"
            INSERT INTO project_views (id, project_id, user_id, ip_address)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(view.project_id)
        .bind(view.user_id)
        .bind(&view.ip_address)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn create_explanation_request(
        &self,
        request: NewExplanationRequest,
    ) -> StoreResult<ExplanationRequest> {
        let row: ExplanationRequestRow = sqlx::query_as(
            r#"
            INSERT INTO explanation_requests
                (id, user_id, explanation_id, contact_name, contact_email,
                 contact_phone, additional_message, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(request.explanation_id)
        .bind(&request.contact_name)
        .bind(&request.contact_email)
        .bind(&request.contact_phone)
        .bind(&request.additional_message)
        .bind(RequestStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Explanation request {} created for explanation {}",
            row.id, row.explanation_id
        );
        ExplanationRequest::try_from(row).map_err(corrupt)
    }

    async fn explanation_requests_for(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<ExplanationRequest>> {
        let rows: Vec<ExplanationRequestRow> = sqlx::query_as(
            "SELECT * FROM explanation_requests WHERE user_id = $1 ORDER BY requested_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|r| ExplanationRequest::try_from(r).map_err(corrupt))
            .collect()
    }
}
