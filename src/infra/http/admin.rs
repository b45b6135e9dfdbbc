//! Operator endpoints served on the admin listener.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::info;

use crate::cache::PageCacheState;
use crate::infra::db::PostgresRepositories;

use super::db_health_response;
use super::middleware::{log_responses, set_request_context};

/// Liveness probe for whatever store backs the repositories.
#[async_trait]
pub trait DatabaseHealth: Send + Sync {
    async fn check(&self) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl DatabaseHealth for PostgresRepositories {
    async fn check(&self) -> Result<(), sqlx::Error> {
        self.health_check().await
    }
}

#[derive(Clone)]
pub struct AdminState {
    pub db: Arc<dyn DatabaseHealth>,
    pub cache: PageCacheState,
}

pub fn build_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/_health/db", get(admin_health))
        .route("/cache/clear", post(clear_cache))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn admin_health(State(state): State<AdminState>) -> Response {
    db_health_response(state.db.check().await)
}

async fn clear_cache(State(state): State<AdminState>) -> Response {
    let dropped = state.cache.cache.len();
    state.cache.cache.clear();
    info!(
        target = "yatube::http::admin",
        dropped, "page cache cleared"
    );
    StatusCode::NO_CONTENT.into_response()
}
