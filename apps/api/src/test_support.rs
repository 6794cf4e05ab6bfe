//! Shared fixtures for router-level tests: an in-memory store behind the
//! real router, plus helpers to seed the catalog and drive requests.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::tokens::{TokenKind, TokenService};
use crate::models::catalog::{Explanation, ProcessType, Project};
use crate::models::price::Price;
use crate::models::subscription::{SubscriptionProfile, SubscriptionStatus};
use crate::models::user::{NewUser, User};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::memory::MemoryStore;
use crate::store::Store;

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub tokens: TokenService,
    pub router: Router,
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let tokens = TokenService::new("router-test-secret", Duration::minutes(5), Duration::days(1));
        let state = AppState {
            store: store.clone(),
            tokens: tokens.clone(),
        };
        TestApp {
            store,
            tokens,
            router: build_router(state),
        }
    }

    pub fn project(&self, title: &str, is_active: bool, created_at: DateTime<Utc>) -> Project {
        let project = Project {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: format!("{title} description"),
            material: "Steel AISI 316L".to_string(),
            process_type: ProcessType::Milling,
            cnc_code: "G90 G54\nG01 Z-2 F300".to_string(),
            consultation_price: Price::from_pence(4000),
            media_urls: vec![format!("https://media.example/{title}.mp4")],
            is_active,
            created_at,
        };
        self.store.insert_project(project.clone());
        project
    }

    pub fn explanation(&self, project: &Project, key: &str, text: &str) -> Explanation {
        let explanation = Explanation {
            id: Uuid::new_v4(),
            project_id: project.id,
            gcode_line: "G01 Z-2 F300".to_string(),
            explanation_text: text.to_string(),
            explanation_key: key.to_string(),
            display_price: Price::from_pence(1500),
            created_at: Utc::now(),
        };
        self.store.insert_explanation(explanation.clone());
        explanation
    }

    /// Creates a user with a free profile and returns it with an access token.
    pub async fn user(&self, username: &str) -> (User, String) {
        let (user, _) = self
            .store
            .create_user_with_profile(
                NewUser {
                    username: username.to_string(),
                    email: format!("{username}@example.com"),
                    first_name: String::new(),
                    last_name: String::new(),
                    password_hash: "unused".to_string(),
                },
                Utc::now(),
            )
            .await
            .unwrap();
        let token = self.tokens.issue(user.id, TokenKind::Access).unwrap();
        (user, token)
    }

    /// Creates a user whose profile is active until `end_date`.
    pub async fn subscriber(&self, username: &str, end_date: NaiveDate) -> (User, String) {
        let (user, token) = self.user(username).await;
        self.store.put_profile(SubscriptionProfile {
            user_id: user.id,
            status: SubscriptionStatus::Active,
            start_date: Some(end_date - Duration::days(30)),
            end_date: Some(end_date),
            created_at: Utc::now(),
        });
        (user, token)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send("GET", uri, token, None, &[]).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, token, Some(body), &[]).await
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}
