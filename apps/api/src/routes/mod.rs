pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::catalog::handlers as catalog;
use crate::requests::handlers as requests;
use crate::state::AppState;
use crate::subscription::handlers as subscription;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // Catalog
        .route("/projects/", get(catalog::handle_list_projects))
        .route("/projects/:id/", get(catalog::handle_project_detail))
        .route("/stats/", get(catalog::handle_stats))
        // Auth
        .route("/auth/register/", post(auth::handle_register))
        .route("/auth/login/", post(auth::handle_login))
        .route("/auth/refresh/", post(auth::handle_refresh))
        .route("/auth/profile/", get(auth::handle_profile))
        // Subscriptions
        .route(
            "/subscription/subscribe/",
            post(subscription::handle_subscribe),
        )
        .route(
            "/explanation/:id/access/",
            get(subscription::handle_explanation_access),
        )
        // Explanation requests
        .route(
            "/explanation-request/",
            post(requests::handle_create_request),
        )
        .route("/my-requests/", get(requests::handle_my_requests));

    Router::new()
        .route("/", get(health::api_root_handler))
        .route("/health", get(health::health_handler))
        .nest("/api", api)
        .with_state(state)
}
