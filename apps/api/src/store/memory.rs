//! In-memory `Store` used by router and handler tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::models::catalog::{CatalogStats, Explanation, ProcessType, Project};
use crate::models::explanation_request::{
    ExplanationRequest, NewExplanationRequest, RequestStatus,
};
use crate::models::subscription::SubscriptionProfile;
use crate::models::telemetry::{NewViewRecord, ViewRecord};
use crate::models::user::{NewUser, User};
use crate::store::{Store, StoreError, StoreResult};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    profiles: HashMap<Uuid, SubscriptionProfile>,
    projects: Vec<Project>,
    explanations: Vec<Explanation>,
    views: Vec<ViewRecord>,
    requests: Vec<ExplanationRequest>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    faults: Mutex<Faults>,
}

#[derive(Default)]
struct Faults {
    profile_reads: bool,
    profile_writes: bool,
    view_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store poisoned")
    }

    pub fn insert_project(&self, project: Project) {
        self.tables().projects.push(project);
    }

    pub fn insert_explanation(&self, explanation: Explanation) {
        self.tables().explanations.push(explanation);
    }

    pub fn put_profile(&self, profile: SubscriptionProfile) {
        self.tables().profiles.insert(profile.user_id, profile);
    }

    pub fn remove_profile(&self, user_id: Uuid) {
        self.tables().profiles.remove(&user_id);
    }

    pub fn profile(&self, user_id: Uuid) -> Option<SubscriptionProfile> {
        self.tables().profiles.get(&user_id).cloned()
    }

    pub fn views(&self) -> Vec<ViewRecord> {
        self.tables().views.clone()
    }

    fn faults(&self) -> MutexGuard<'_, Faults> {
        self.faults.lock().expect("memory store poisoned")
    }

    /// Makes every profile lookup fail with a database error.
    pub fn fail_profile_reads(&self) {
        self.faults().profile_reads = true;
    }

    /// While set, inserting a profile fails with a database error.
    pub fn fail_profile_writes(&self, fail: bool) {
        self.faults().profile_writes = fail;
    }

    /// Makes every view write fail with a database error.
    pub fn fail_view_writes(&self) {
        self.faults().view_writes = true;
    }

    pub fn user_count(&self) -> usize {
        self.tables().users.len()
    }
}

fn injected() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user_with_profile(
        &self,
        new_user: NewUser,
        now: DateTime<Utc>,
    ) -> StoreResult<(User, SubscriptionProfile)> {
        let fail_writes = self.faults().profile_writes;
        let mut tables = self.tables();
        if tables.users.iter().any(|u| u.username == new_user.username) {
            return Err(StoreError::Duplicate("username".into()));
        }
        // Nothing is kept when the profile insert fails.
        if fail_writes {
            return Err(injected());
        }
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            password_hash: new_user.password_hash,
            created_at: now,
        };
        let profile = SubscriptionProfile::free(user.id, now);
        tables.users.push(user.clone());
        tables.profiles.insert(user.id, profile.clone());
        Ok((user, profile))
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_profile(&self, user_id: Uuid) -> StoreResult<Option<SubscriptionProfile>> {
        if self.faults().profile_reads {
            return Err(injected());
        }
        Ok(self.tables().profiles.get(&user_id).cloned())
    }

    async fn get_or_create_profile(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<SubscriptionProfile> {
        let (fail_reads, fail_writes) = {
            let faults = self.faults();
            (faults.profile_reads, faults.profile_writes)
        };
        if fail_reads {
            return Err(injected());
        }
        let mut tables = self.tables();
        if let Some(existing) = tables.profiles.get(&user_id) {
            return Ok(existing.clone());
        }
        if fail_writes {
            return Err(injected());
        }
        let profile = SubscriptionProfile::free(user_id, now);
        tables.profiles.insert(user_id, profile.clone());
        Ok(profile)
    }

    async fn save_profile(&self, profile: &SubscriptionProfile) -> StoreResult<()> {
        let mut tables = self.tables();
        if let Some(existing) = tables.profiles.get_mut(&profile.user_id) {
            *existing = profile.clone();
        }
        Ok(())
    }

    async fn list_active_projects(&self) -> StoreResult<Vec<Project>> {
        let mut projects: Vec<Project> = self
            .tables()
            .projects
            .iter()
            .filter(|p| p.is_active)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    async fn get_active_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(self
            .tables()
            .projects
            .iter()
            .find(|p| p.id == id && p.is_active)
            .cloned())
    }

    async fn explanations_of(&self, project_id: Uuid) -> StoreResult<Vec<Explanation>> {
        let mut explanations: Vec<Explanation> = self
            .tables()
            .explanations
            .iter()
            .filter(|e| e.project_id == project_id)
            .cloned()
            .collect();
        explanations.sort_by(|a, b| a.explanation_key.cmp(&b.explanation_key));
        Ok(explanations)
    }

    async fn get_explanation(&self, id: Uuid) -> StoreResult<Option<Explanation>> {
        Ok(self
            .tables()
            .explanations
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn get_active_explanation(&self, id: Uuid) -> StoreResult<Option<Explanation>> {
        let tables = self.tables();
        Ok(tables
            .explanations
            .iter()
            .find(|e| e.id == id)
            .filter(|e| {
                tables
                    .projects
                    .iter()
                    .any(|p| p.id == e.project_id && p.is_active)
            })
            .cloned())
    }

    async fn catalog_stats(&self) -> StoreResult<CatalogStats> {
        let tables = self.tables();
        let active: Vec<&Project> = tables.projects.iter().filter(|p| p.is_active).collect();
        let names: BTreeSet<&'static str> =
            active.iter().map(|p| p.process_type.as_str()).collect();
        let process_types = names
            .into_iter()
            .map(|n| n.parse::<ProcessType>().map_err(StoreError::Corrupt))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(CatalogStats {
            total_projects: active.len() as i64,
            total_views: tables.views.len() as i64,
            process_types,
        })
    }

    async fn record_view(&self, view: NewViewRecord) -> StoreResult<ViewRecord> {
        if self.faults().view_writes {
            return Err(injected());
        }
        let record = ViewRecord {
            id: Uuid::new_v4(),
            project_id: view.project_id,
            user_id: view.user_id,
            ip_address: view.ip_address,
            viewed_at: Utc::now(),
        };
        self.tables().views.push(record.clone());
        Ok(record)
    }

    async fn create_explanation_request(
        &self,
        request: NewExplanationRequest,
    ) -> StoreResult<ExplanationRequest> {
        let mut tables = self.tables();
        // Strictly increasing timestamps keep newest-first ordering deterministic.
        let requested_at = tables
            .requests
            .iter()
            .map(|r| r.requested_at + Duration::milliseconds(1))
            .max()
            .map_or_else(Utc::now, |next| next.max(Utc::now()));
        let created = ExplanationRequest {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            explanation_id: request.explanation_id,
            contact_name: request.contact_name,
            contact_email: request.contact_email,
            contact_phone: request.contact_phone,
            additional_message: request.additional_message,
            status: RequestStatus::Pending,
            requested_at,
        };
        tables.requests.push(created.clone());
        Ok(created)
    }

    async fn explanation_requests_for(
        &self,
        user_id: Uuid,
    ) -> StoreResult<Vec<ExplanationRequest>> {
        let mut requests: Vec<ExplanationRequest> = self
            .tables()
            .requests
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(requests)
    }
}
